//! Scroll-until-stop loop for lazily loaded listings.
//!
//! Each iteration scrolls to the bottom, waits for the page to grow, and then
//! peeks at the dates of everything loaded so far. The loop ends when the page
//! stops growing, when an item dated on or before the cutoff shows up (the
//! feed is newest-first), when the scroll cap is hit, or when cancelled.

use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use super::extract::RecordExtractor;
use super::types::StopReason;
use crate::browser::{ElementHandle, PageDriver};
use crate::error::Result;

/// Knobs for one scroll run.
#[derive(Debug, Clone)]
pub struct ScrollOptions {
    /// Longest time to wait for new content after each scroll.
    pub pause: Duration,
    /// How often the page height is re-read while waiting.
    /// Zero means a single read once `pause` has elapsed.
    pub poll_interval: Duration,
    pub max_scrolls: u32,
    pub start_date: NaiveDate,
}

/// Outcome of a scroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    pub stop: StopReason,
    pub scrolls: u32,
    pub final_height: i64,
}

#[derive(Debug)]
struct ScrollState {
    last_height: i64,
    scroll_count: u32,
}

pub struct ScrollController<'a> {
    extractor: &'a RecordExtractor,
    options: ScrollOptions,
    cancel: Option<watch::Receiver<bool>>,
}

impl<'a> ScrollController<'a> {
    pub fn new(extractor: &'a RecordExtractor, options: ScrollOptions) -> Self {
        Self {
            extractor,
            options,
            cancel: None,
        }
    }

    /// Stop between iterations (or mid-wait) once `cancel` reads `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run<P: PageDriver>(&mut self, page: &P) -> Result<ScrollReport> {
        let mut state = ScrollState {
            last_height: page.page_height().await?,
            scroll_count: 0,
        };
        info!("Initial scroll height: {}", state.last_height);

        let stop = loop {
            if self.is_cancelled() {
                break StopReason::Cancelled;
            }
            if state.scroll_count >= self.options.max_scrolls {
                info!("Reached max scrolls ({})", self.options.max_scrolls);
                break StopReason::MaxScrolls;
            }

            debug!("Scroll attempt {}", state.scroll_count + 1);
            page.scroll_to_bottom().await?;

            let new_height = match self.wait_for_growth(page, state.last_height).await? {
                Some(height) => height,
                None => break StopReason::Cancelled,
            };
            debug!(
                "New scroll height after attempt {}: {}",
                state.scroll_count + 1,
                new_height
            );

            if new_height == state.last_height {
                info!("No change in scroll height; stopping scroll");
                break StopReason::NoChange;
            }

            state.last_height = new_height;
            state.scroll_count += 1;

            let items = page
                .find_elements(&self.extractor.selectors().item)
                .await?;
            debug!(
                "After scroll {}, found {} items",
                state.scroll_count,
                items.len()
            );

            match self.oldest_date(&items).await {
                Some(oldest) if oldest <= self.options.start_date => {
                    info!(
                        "Found an item dated {} (cutoff {}); stopping scroll",
                        oldest, self.options.start_date
                    );
                    break StopReason::DateReached;
                }
                Some(oldest) => debug!("Oldest item date found: {}", oldest),
                None => debug!("No item dates found in this batch"),
            }
        };

        Ok(ScrollReport {
            stop,
            scrolls: state.scroll_count,
            final_height: state.last_height,
        })
    }

    async fn oldest_date<E: ElementHandle>(&self, items: &[E]) -> Option<NaiveDate> {
        let mut oldest: Option<NaiveDate> = None;
        for item in items {
            if let Some(date) = self.extractor.peek_date(item).await {
                oldest = Some(oldest.map_or(date, |o| o.min(date)));
            }
        }
        oldest
    }

    /// Wait up to `pause` for the page height to differ from `last_height`.
    /// Returns the last height read, or `None` if cancelled while waiting.
    async fn wait_for_growth<P: PageDriver>(
        &mut self,
        page: &P,
        last_height: i64,
    ) -> Result<Option<i64>> {
        let pause = self.options.pause;
        let poll = if self.options.poll_interval.is_zero() {
            pause
        } else {
            self.options.poll_interval
        };
        let deadline = Instant::now() + pause;

        loop {
            let step = poll.min(deadline.saturating_duration_since(Instant::now()));
            if self.sleep_or_cancel(step).await {
                return Ok(None);
            }

            let height = page.page_height().await?;
            if height != last_height || Instant::now() >= deadline {
                return Ok(Some(height));
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleep for `duration`; returns true if cancellation fired first.
    async fn sleep_or_cancel(&mut self, duration: Duration) -> bool {
        let Some(rx) = self.cancel.as_mut() else {
            tokio::time::sleep(duration).await;
            return false;
        };
        if *rx.borrow() {
            return true;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = rx.changed() => match changed {
                    Ok(()) if *rx.borrow() => return true,
                    Ok(()) => continue,
                    // Sender gone: nobody can cancel any more.
                    Err(_) => {
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }
}
