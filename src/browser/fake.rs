//! In-memory page driver for tests.
//!
//! Items are grouped into batches; each scroll-to-bottom reveals the next
//! batch and grows the page height. Elements answer `find_elements` only for
//! the exact selector strings they were registered under.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ElementHandle, PageDriver, SCROLL_HEIGHT_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT};
use crate::error::{Result, ScrapeError};
use crate::scraper::Selectors;

const BATCH_HEIGHT: i64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<(String, FakeElement)>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children.push((selector.to_string(), child));
        self
    }
}

/// A complete paper item using the default selectors.
pub fn paper(title: &str, stars: &str, date: &str) -> FakeElement {
    paper_without_date(title, stars).with_child(
        &Selectors::default().date,
        FakeElement::new().with_text(date),
    )
}

/// A paper item whose date element has not rendered.
pub fn paper_without_date(title: &str, stars: &str) -> FakeElement {
    let selectors = Selectors::default();
    let slug = title.to_lowercase().replace(' ', "-");
    FakeElement::new()
        .with_child(
            &selectors.title_link,
            FakeElement::new()
                .with_text(title)
                .with_attr("href", &format!("/paper/{}", slug)),
        )
        .with_child(&selectors.stars, FakeElement::new().with_text(stars))
}

/// An item that only has its date rendered so far.
pub fn date_only(date: &str) -> FakeElement {
    FakeElement::new().with_child(
        &Selectors::default().date,
        FakeElement::new().with_text(date),
    )
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self>> {
        Ok(self
            .children
            .iter()
            .filter(|(sel, _)| sel == selector)
            .map(|(_, child)| child.clone())
            .collect())
    }

    async fn text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }
}

#[derive(Debug, Default)]
struct FakeState {
    url: Option<String>,
    revealed: usize,
    scrolls: usize,
}

/// Scripted page: batch 0 is present after navigation, later batches appear
/// one per scroll.
pub struct FakePage {
    item_selector: String,
    batches: Vec<Vec<FakeElement>>,
    /// Keep appending the last batch forever.
    endless: bool,
    state: Mutex<FakeState>,
    shutdowns: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(batches: Vec<Vec<FakeElement>>) -> Self {
        Self {
            item_selector: Selectors::default().item,
            batches,
            endless: false,
            state: Mutex::new(FakeState {
                revealed: 1,
                ..Default::default()
            }),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    pub fn with_url(self, url: &str) -> Self {
        self.state.lock().unwrap().url = Some(url.to_string());
        self
    }

    /// Counter incremented on every `shutdown`, shared with the test.
    pub fn shutdown_counter(&self) -> Arc<AtomicUsize> {
        self.shutdowns.clone()
    }

    /// Number of scroll commands received.
    pub fn scrolls(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }

    fn loaded(&self, state: &FakeState) -> Vec<FakeElement> {
        let mut items: Vec<FakeElement> = self
            .batches
            .iter()
            .take(state.revealed)
            .flatten()
            .cloned()
            .collect();
        if self.endless && state.revealed > self.batches.len() {
            if let Some(last) = self.batches.last() {
                for _ in self.batches.len()..state.revealed {
                    items.extend(last.iter().cloned());
                }
            }
        }
        items
    }
}

#[async_trait]
impl PageDriver for FakePage {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.url.is_none() {
            state.url = Some(url.to_string());
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let mut state = self.state.lock().unwrap();
        match script {
            SCROLL_HEIGHT_SCRIPT => Ok(serde_json::json!(state.revealed as i64 * BATCH_HEIGHT)),
            SCROLL_TO_BOTTOM_SCRIPT => {
                state.scrolls += 1;
                if self.endless || state.revealed < self.batches.len() {
                    state.revealed += 1;
                }
                Ok(serde_json::Value::Null)
            }
            other => Err(ScrapeError::Script(format!("unsupported script: {}", other))),
        }
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<FakeElement>> {
        if selector != self.item_selector {
            return Ok(Vec::new());
        }
        let state = self.state.lock().unwrap();
        Ok(self.loaded(&state))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
