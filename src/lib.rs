//! pwcscrape - ranks the latest papers on a lazily loaded listing by stars.

pub mod browser;
pub mod config;
pub mod error;
pub mod scraper;

pub use error::{Result, ScrapeError};
pub use scraper::{LinkQuery, RankedPaper, RankedResult, ScraperSession, StopReason};
