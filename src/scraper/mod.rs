//! Incremental-load scraping and ranking pipeline.
//!
//! [`ScraperSession`] navigates to the listing, lets [`ScrollController`]
//! drive lazy loading until a stop signal, extracts a [`Paper`] from every
//! loaded item with [`RecordExtractor`], and ranks them with [`rank::select`].

mod dates;
mod extract;
pub mod rank;
mod scroll;
mod session;
mod types;

pub use dates::{parse_listing_date, LISTING_DATE_FORMAT};
pub use extract::{parse_stars, Extraction, RecordExtractor, Selectors, SkipReason};
pub use rank::CutoffPolicy;
pub use scroll::{ScrollController, ScrollOptions, ScrollReport};
pub use session::{LinkQuery, ScraperSession};
pub use types::{Paper, RankedPaper, RankedResult, StopReason};
