//! Configuration for the scraper, loaded with prefer discovery and serde.

mod loader;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::browser::BrowserEngineConfig;
use crate::error::{Result, ScrapeError};
use crate::scraper::{CutoffPolicy, Selectors};

pub use loader::{load_config, LoadOptions};

/// Listing page scraped by default.
pub const DEFAULT_URL: &str = "https://paperswithcode.com/latest";

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScraperConfig {
    /// Browser launch settings (`ChromeDriverPath`, `headless`, ...).
    #[serde(flatten)]
    pub browser: BrowserEngineConfig,
    /// Listing page to scrape.
    #[serde(default = "default_url")]
    pub url: String,
    /// Settle time after each scroll, in seconds.
    #[serde(default = "default_pause_time", alias = "pauseTime")]
    pub pause_time: f64,
    /// Page height poll interval while settling, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_scrolls", alias = "maxScrolls")]
    pub max_scrolls: u32,
    #[serde(default = "default_top_n", alias = "topN")]
    pub top_n: usize,
    /// Cutoff date (YYYY-MM-DD).
    #[serde(default, alias = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub cutoff_policy: CutoffPolicy,
    #[serde(default)]
    pub selectors: Selectors,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_pause_time() -> f64 {
    2.0
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_max_scrolls() -> u32 {
    50
}

fn default_top_n() -> usize {
    10
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            browser: BrowserEngineConfig::default(),
            url: default_url(),
            pause_time: default_pause_time(),
            poll_interval_ms: default_poll_interval_ms(),
            max_scrolls: default_max_scrolls(),
            top_n: default_top_n(),
            start_date: None,
            cutoff_policy: CutoffPolicy::default(),
            selectors: Selectors::default(),
            source_path: None,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a specific file path.
    /// Format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScrapeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;

        config.source_path = Some(path.to_path_buf());
        if let Some(base_dir) = config.base_dir() {
            config.resolve_paths(&base_dir);
        }
        config.browser = config.browser.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| ScrapeError::Config(format!("failed to parse TOML config: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| ScrapeError::Config(format!("failed to parse YAML config: {}", e))),
            _ => serde_json::from_str(contents)
                .map_err(|e| ScrapeError::Config(format!("failed to parse JSON config: {}", e))),
        }
    }

    /// Defaults plus environment overrides, for when no file is found.
    pub fn default_with_env() -> Self {
        Self {
            browser: BrowserEngineConfig::default().with_env_overrides(),
            ..Self::default()
        }
    }

    /// Directory of the config file, for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Expand `~` and make a relative `chrome_path` relative to `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if let Some(chrome_path) = self.browser.chrome_path.take() {
            let raw = chrome_path.to_string_lossy();
            let expanded = PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref());
            // Bare command names are left for the PATH lookup
            let is_bare = expanded.components().count() == 1;
            self.browser.chrome_path = Some(if expanded.is_absolute() || is_bare {
                expanded
            } else {
                base_dir.join(expanded)
            });
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(e) = Duration::try_from_secs_f64(self.pause_time) {
            return Err(ScrapeError::Config(format!(
                "pause_time must be a non-negative number of seconds, got {}: {}",
                self.pause_time, e
            )));
        }
        if self.url.trim().is_empty() {
            return Err(ScrapeError::Config("url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn pause(&self) -> Duration {
        Duration::try_from_secs_f64(self.pause_time).unwrap_or(Duration::from_secs(2))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
