//! Browser session that loads the listing and returns ranked papers.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, info};

use super::extract::{Extraction, RecordExtractor};
use super::rank::{self, CutoffPolicy};
use super::scroll::{ScrollController, ScrollOptions};
use super::types::RankedResult;
use crate::browser::{ChromeDriver, PageDriver};
use crate::config::ScraperConfig;
use crate::error::Result;

/// Parameters for one `get_latest_links` run.
#[derive(Debug, Clone)]
pub struct LinkQuery {
    pub start_date: NaiveDate,
    pub top_n: usize,
    pub pause: Duration,
    pub poll_interval: Duration,
    pub max_scrolls: u32,
    pub cutoff_policy: CutoffPolicy,
    /// Set to `true` to stop scrolling early; loaded items are still ranked.
    pub cancel: Option<watch::Receiver<bool>>,
}

impl LinkQuery {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            top_n: 10,
            pause: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
            max_scrolls: 50,
            cutoff_policy: CutoffPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_max_scrolls(mut self, max_scrolls: u32) -> Self {
        self.max_scrolls = max_scrolls;
        self
    }

    pub fn with_cutoff_policy(mut self, policy: CutoffPolicy) -> Self {
        self.cutoff_policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Owns the browser for its lifetime; `close` releases it.
pub struct ScraperSession<D: PageDriver = ChromeDriver> {
    driver: D,
    config: ScraperConfig,
}

impl ScraperSession<ChromeDriver> {
    /// Launch (or connect to) Chrome. Fails with an initialization error if
    /// the browser cannot be started.
    pub async fn open(config: &ScraperConfig) -> Result<Self> {
        config.validate()?;
        let driver = ChromeDriver::launch(&config.browser).await?;
        Ok(Self::with_driver(driver, config.clone()))
    }
}

impl<D: PageDriver> ScraperSession<D> {
    pub fn with_driver(driver: D, config: ScraperConfig) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Query populated from the session config.
    pub fn query(&self, start_date: NaiveDate) -> LinkQuery {
        LinkQuery {
            poll_interval: self.config.poll_interval(),
            ..LinkQuery::new(start_date)
                .with_top_n(self.config.top_n)
                .with_pause(self.config.pause())
                .with_max_scrolls(self.config.max_scrolls)
                .with_cutoff_policy(self.config.cutoff_policy)
        }
    }

    /// Top `top_n` papers by stars, scrolling until the feed reaches `start_date`.
    pub async fn get_latest_links(
        &self,
        start_date: NaiveDate,
        top_n: usize,
    ) -> Result<RankedResult> {
        self.get_latest_links_with(self.query(start_date).with_top_n(top_n))
            .await
    }

    pub async fn get_latest_links_with(&self, query: LinkQuery) -> Result<RankedResult> {
        let url = self.config.url.as_str();
        info!("Navigating to {}", url);
        self.driver.navigate(url).await?;

        let base_url = self
            .driver
            .current_url()
            .await?
            .unwrap_or_else(|| url.to_string());
        let extractor = RecordExtractor::new(self.config.selectors.clone(), Some(&base_url));

        let mut controller = ScrollController::new(
            &extractor,
            ScrollOptions {
                pause: query.pause,
                poll_interval: query.poll_interval,
                max_scrolls: query.max_scrolls,
                start_date: query.start_date,
            },
        );
        if let Some(cancel) = query.cancel.clone() {
            controller = controller.with_cancel(cancel);
        }
        let report = controller.run(&self.driver).await?;
        info!(
            stop = %report.stop,
            scrolls = report.scrolls,
            "Finished scrolling. Now processing papers"
        );

        let items = self
            .driver
            .find_elements(&self.config.selectors.item)
            .await?;
        info!("Total items collected: {}", items.len());

        let mut papers = Vec::with_capacity(items.len());
        let mut skipped: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            debug!("Processing item {}/{}", idx + 1, items.len());
            match extractor.extract(item).await {
                Extraction::Record(paper) => papers.push(paper),
                Extraction::Skipped(reason) => *skipped.entry(reason.as_str()).or_default() += 1,
            }
        }
        info!(skipped = ?skipped, "Collected {} papers", papers.len());

        let mut result = rank::select(papers, query.start_date, query.top_n, query.cutoff_policy);
        result.stop = Some(report.stop);
        info!("Returning top {} papers", result.len());
        Ok(result)
    }

    /// Release the browser. Consumes the session, so it can only happen once.
    pub async fn close(mut self) -> Result<()> {
        self.driver.shutdown().await
    }
}
