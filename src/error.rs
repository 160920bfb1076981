//! Scraper error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser could not be launched or connected to.
    #[error("Browser initialization failed: {0}")]
    Initialization(String),
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },
    #[error("Browser driver error: {0}")]
    Driver(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Per-item failures are logged and skipped; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
