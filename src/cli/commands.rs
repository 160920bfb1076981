//! CLI argument parsing and the scrape command.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tokio::sync::watch;

use pwcscrape::config::{load_config, LoadOptions, ScraperConfig};
use pwcscrape::scraper::CutoffPolicy;
use pwcscrape::ScraperSession;

use super::output::{print_json, print_rows, report_partial};

/// Cutoff used when neither the command line nor the config names one.
const DEFAULT_START_DATE: (i32, u32, u32) = (2025, 1, 4);

#[derive(Parser, Debug)]
#[command(name = "pwcscrape")]
#[command(about = "Rank the latest papers by GitHub stars")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, env = "PWCSCRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Stop scrolling once papers dated on or before this day appear (YYYY-MM-DD)
    #[arg(short, long)]
    start_date: Option<NaiveDate>,

    /// Number of papers to return
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Seconds to wait for new content after each scroll
    #[arg(long)]
    pause_time: Option<f64>,

    /// Maximum number of scrolls
    #[arg(long)]
    max_scrolls: Option<u32>,

    /// Listing page to scrape
    #[arg(long)]
    url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Also drop papers dated on or before the start date
    #[arg(long)]
    exclude_before_cutoff: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

impl Cli {
    /// Command-line flags take precedence over the config file.
    fn apply_to(&self, config: &mut ScraperConfig) {
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(pause_time) = self.pause_time {
            config.pause_time = pause_time;
        }
        if let Some(max_scrolls) = self.max_scrolls {
            config.max_scrolls = max_scrolls;
        }
        if let Some(ref url) = self.url {
            config.url = url.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
        if self.exclude_before_cutoff {
            config.cutoff_policy = CutoffPolicy::Exclude;
        }
    }

    fn start_date(&self, config: &ScraperConfig) -> NaiveDate {
        let (y, m, d) = DEFAULT_START_DATE;
        self.start_date
            .or(config.start_date)
            .or_else(|| NaiveDate::from_ymd_opt(y, m, d))
            .unwrap_or_default()
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&LoadOptions {
        config_path: cli.config.clone(),
        ..Default::default()
    })
    .await
    .context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let start_date = cli.start_date(&config);
    let session = ScraperSession::open(&config)
        .await
        .context("Failed to initialize the browser")?;
    tracing::info!(
        %start_date,
        top_n = session.config().top_n,
        policy = %session.config().cutoff_policy,
        "Scraping {}",
        session.config().url
    );

    // First Ctrl-C stops scrolling and ranks what loaded; a second one exits
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if cancel_on_interrupt(tokio::signal::ctrl_c, cancel_tx).await {
            tracing::warn!("Interrupted again; exiting");
            std::process::exit(130);
        }
    });

    let query = session.query(start_date).with_cancel(cancel_rx);
    let outcome = session.get_latest_links_with(query).await;
    ctrl_c.abort();

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close the browser cleanly: {}", e);
    }

    let result = outcome.context("Scrape failed")?;
    if cli.json {
        print_json(&result)?;
    } else {
        print_rows(&result);
    }
    report_partial(&result);

    Ok(())
}

/// Flip `cancel` on the first interrupt, then wait for another one.
/// Returns true once a second interrupt arrives; false if signals are unavailable.
async fn cancel_on_interrupt<F, Fut>(mut interrupt: F, cancel: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        tracing::debug!("Cannot listen for Ctrl-C: {}", e);
        return false;
    }
    tracing::warn!("Interrupted; finishing with the papers loaded so far (Ctrl-C again to quit)");
    let _ = cancel.send(true);

    interrupt().await.is_ok()
}
