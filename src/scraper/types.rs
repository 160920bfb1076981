//! Records produced by the scraper.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One paper extracted from the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub stars: u64,
    pub title: String,
    /// `None` when the date text could not be parsed; such papers are never ranked.
    pub published: Option<NaiveDate>,
    pub link: String,
}

/// Output row: the projection of a [`Paper`] without its date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPaper {
    pub stars: u64,
    pub title: String,
    pub link: String,
}

impl From<Paper> for RankedPaper {
    fn from(paper: Paper) -> Self {
        Self {
            stars: paper.stars,
            title: paper.title,
            link: paper.link,
        }
    }
}

/// Why the scroll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Page height did not grow within the settle window.
    NoChange,
    /// A loaded item is dated on or before the cutoff.
    DateReached,
    /// The scroll cap was hit.
    MaxScrolls,
    /// The caller asked the loop to stop.
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::NoChange => "no_change",
            StopReason::DateReached => "date_reached",
            StopReason::MaxScrolls => "max_scrolls",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked papers plus enough context to tell a short result from a full one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedResult {
    pub papers: Vec<RankedPaper>,
    /// The `top_n` that was asked for.
    pub requested: usize,
    /// Papers that were eligible for ranking.
    pub candidates: usize,
    /// How scrolling ended; `None` when ranking was run standalone.
    pub stop: Option<StopReason>,
}

impl RankedResult {
    /// Fewer rows than requested.
    pub fn is_partial(&self) -> bool {
        self.papers.len() < self.requested
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}
