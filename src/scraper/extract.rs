//! Per-item field extraction.
//!
//! Every lookup is tolerant: a missing title, link, stars badge or date
//! element skips the item, unparsable star text counts as zero, and an
//! unparsable date leaves the paper undated. Nothing here aborts a batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::dates::parse_listing_date;
use super::types::Paper;
use crate::browser::ElementHandle;
use crate::error::Result;

/// CSS selectors describing the listing markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// One loaded paper card.
    pub item: String,
    /// Date element within an item.
    pub date: String,
    /// Anchor carrying the title text and link.
    pub title_link: String,
    /// Star count badge.
    pub stars: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            item: ".infinite-item".to_string(),
            date: ".stars-accumulated.text-center".to_string(),
            title_link: "div.col-lg-9.item-content h1 a".to_string(),
            stars: "div.entity-stars span.badge.badge-secondary".to_string(),
        }
    }
}

/// Why an item produced no paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    MissingTitle,
    MissingLink,
    MissingStars,
    MissingDate,
    Driver(String),
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingTitle => "missing_title",
            SkipReason::MissingLink => "missing_link",
            SkipReason::MissingStars => "missing_stars",
            SkipReason::MissingDate => "missing_date",
            SkipReason::Driver(_) => "driver_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Record(Paper),
    Skipped(SkipReason),
}

/// Parse a star badge such as "★ 1,234": last whitespace-separated token,
/// thousands separators removed. Anything else counts as zero.
pub fn parse_stars(text: &str) -> u64 {
    let token = match text.split_whitespace().last() {
        Some(token) => token.replace(',', ""),
        None => {
            warn!("Empty stars text; defaulting to 0");
            return 0;
        }
    };

    match token.parse::<u64>() {
        Ok(stars) => stars,
        Err(e) => {
            warn!("Error converting stars '{}' to int: {}", text.trim(), e);
            0
        }
    }
}

/// Pulls [`Paper`]s out of item elements.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    selectors: Selectors,
    base_url: Option<Url>,
}

impl RecordExtractor {
    /// `base_url` is used to absolutize relative links.
    pub fn new(selectors: Selectors, base_url: Option<&str>) -> Self {
        let base_url = base_url.and_then(|u| Url::parse(u).ok());
        Self {
            selectors,
            base_url,
        }
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Read only the date of an item. Used while scrolling, when the rest of
    /// the card may not have rendered yet.
    pub async fn peek_date<E: ElementHandle>(&self, item: &E) -> Option<NaiveDate> {
        match self.date_text(item).await {
            Ok(Some(text)) => parse_listing_date(&text),
            Ok(None) => {
                debug!("Date element not found for one item; skipping date check for it");
                None
            }
            Err(e) => {
                warn!("Error extracting date from an item: {}", e);
                None
            }
        }
    }

    /// Build a full paper from an item.
    pub async fn extract<E: ElementHandle>(&self, item: &E) -> Extraction {
        match self.try_extract(item).await {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!("Error processing item: {}", e);
                Extraction::Skipped(SkipReason::Driver(e.to_string()))
            }
        }
    }

    async fn try_extract<E: ElementHandle>(&self, item: &E) -> Result<Extraction> {
        let anchor = match first(item, &self.selectors.title_link).await? {
            Some(anchor) => anchor,
            None => {
                warn!(selector = %self.selectors.title_link, "Title anchor not found; skipping item");
                return Ok(Extraction::Skipped(SkipReason::MissingTitle));
            }
        };
        let title = anchor.text().await?.trim().to_string();
        let link = match anchor.attribute("href").await? {
            Some(href) => self.resolve_link(href.trim()),
            None => {
                warn!(title = %title, "Title anchor has no href; skipping item");
                return Ok(Extraction::Skipped(SkipReason::MissingLink));
            }
        };

        let stars = match first(item, &self.selectors.stars).await? {
            Some(badge) => parse_stars(&badge.text().await?),
            None => {
                warn!(title = %title, "Stars badge not found; skipping item");
                return Ok(Extraction::Skipped(SkipReason::MissingStars));
            }
        };

        let published = match self.date_text(item).await? {
            Some(text) => parse_listing_date(&text),
            None => {
                warn!(title = %title, "Date element not found; skipping item");
                return Ok(Extraction::Skipped(SkipReason::MissingDate));
            }
        };

        Ok(Extraction::Record(Paper {
            stars,
            title,
            published,
            link,
        }))
    }

    async fn date_text<E: ElementHandle>(&self, item: &E) -> Result<Option<String>> {
        match first(item, &self.selectors.date).await? {
            Some(el) => Ok(Some(el.text().await?)),
            None => Ok(None),
        }
    }

    fn resolve_link(&self, href: &str) -> String {
        if Url::parse(href).is_ok() {
            return href.to_string();
        }
        match self.base_url.as_ref().map(|base| base.join(href)) {
            Some(Ok(url)) => url.to_string(),
            _ => href.to_string(),
        }
    }
}

/// First match of `selector` within `item`, if any.
async fn first<E: ElementHandle>(item: &E, selector: &str) -> Result<Option<E>> {
    match item.find_element(selector).await {
        Ok(el) => Ok(Some(el)),
        Err(e) if e.is_recoverable() => Ok(None),
        Err(e) => Err(e),
    }
}
