//! Browser capability used by the scraper.
//!
//! The scraper only needs a handful of operations from a browser: load a URL,
//! evaluate a script, and query elements by CSS selector. These are expressed
//! as traits so the scroll loop and extractor can run against chromiumoxide
//! in production and an in-memory page in tests.

mod binary;
mod chrome;
mod config;
#[cfg(test)]
pub(crate) mod fake;

pub use chrome::ChromeDriver;
pub use config::BrowserEngineConfig;

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};

/// Expression returning the current document height.
pub const SCROLL_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";

/// Expression scrolling the window to the current bottom of the document.
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// A handle to one element on the page.
#[async_trait]
pub trait ElementHandle: Send + Sync + Sized {
    /// All descendants matching `selector`, possibly empty.
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self>>;

    /// Visible text of the element.
    async fn text(&self) -> Result<String>;

    /// Value of the named attribute, if present.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// First descendant matching `selector`.
    async fn find_element(&self, selector: &str) -> Result<Self> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}

/// A single browser tab the scraper drives.
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: ElementHandle;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression and return its JSON value
    /// (`Null` for `undefined`).
    async fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

    async fn find_elements(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// URL of the loaded document, after redirects.
    async fn current_url(&self) -> Result<Option<String>>;

    /// Release the browser. Called once by the owning session.
    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    async fn page_height(&self) -> Result<i64> {
        let value = self.execute_script(SCROLL_HEIGHT_SCRIPT).await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h as i64))
            .ok_or_else(|| ScrapeError::Script(format!("unexpected page height: {}", value)))
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute_script(SCROLL_TO_BOTTOM_SCRIPT).await?;
        Ok(())
    }
}
