//! chromiumoxide-backed page driver.

#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use super::{BrowserEngineConfig, ElementHandle, PageDriver};
use crate::error::{Result, ScrapeError};

#[cfg(feature = "browser")]
use super::binary::find_chrome;

/// Launch arguments that keep Chrome quiet on stderr and workable in containers.
#[cfg(feature = "browser")]
const QUIET_CHROME_ARGS: &[&str] = &[
    "--log-level=3",
    "--disable-logging",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-background-networking",
    "--disable-sync",
    "--disable-translate",
    "--no-sandbox",
    "--disable-gpu",
    "--disable-software-rasterizer",
];

#[cfg(feature = "browser")]
fn driver_err(e: chromiumoxide::error::CdpError) -> ScrapeError {
    ScrapeError::Driver(e.to_string())
}

/// One Chrome tab plus the browser it belongs to.
#[cfg(feature = "browser")]
pub struct ChromeDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    /// Whether this process launched the browser (and so must close it).
    launched: bool,
    timeout: Duration,
}

#[cfg(feature = "browser")]
impl ChromeDriver {
    /// Launch a local browser, or connect to `remote_url` when configured.
    pub async fn launch(config: &BrowserEngineConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout);

        let (browser, mut handler, launched) = match config.remote_url.as_deref() {
            Some(remote_url) => {
                let (browser, handler) = connect_remote(remote_url, timeout).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = launch_local(config, timeout).await?;
                (browser, handler, true)
            }
        };

        // Spawn handler task
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Initialization(format!("failed to open a tab: {}", e)))?;

        info!("Initialized Chrome browser (launched locally: {})", launched);

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler,
            launched,
            timeout,
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Driver("browser already shut down".to_string()))
    }
}

#[cfg(feature = "browser")]
async fn launch_local(
    config: &BrowserEngineConfig,
    timeout: Duration,
) -> Result<(Browser, chromiumoxide::handler::Handler)> {
    info!("Launching browser (headless={})", config.headless);

    let chrome_path = find_chrome(config.chrome_path.as_deref())?;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .request_timeout(timeout);

    // with_head means NOT headless
    if !config.headless {
        builder = builder.with_head();
    }

    for arg in QUIET_CHROME_ARGS {
        builder = builder.arg(*arg);
    }
    for arg in &config.chrome_args {
        builder = builder.arg(arg.as_str());
    }

    let browser_config = builder.build().map_err(|e| {
        ScrapeError::Initialization(format!("failed to build browser config: {}", e))
    })?;

    Browser::launch(browser_config)
        .await
        .map_err(|e| ScrapeError::Initialization(format!("failed to launch browser: {}", e)))
}

/// Connect to a remote Chrome instance through its `/json/version` endpoint.
#[cfg(feature = "browser")]
async fn connect_remote(
    url: &str,
    timeout: Duration,
) -> Result<(Browser, chromiumoxide::handler::Handler)> {
    info!(
        "Connecting to remote browser at {} (timeout: {}s)",
        url,
        timeout.as_secs()
    );

    let version_url = devtools_version_url(url);
    let init_err = |e: reqwest::Error| {
        ScrapeError::Initialization(format!("failed to query {}: {}", version_url, e))
    };

    let resp: serde_json::Value = reqwest::Client::new()
        .get(&version_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(init_err)?
        .json()
        .await
        .map_err(init_err)?;

    let ws_url = resp
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ScrapeError::Initialization("no webSocketDebuggerUrl in response".to_string())
        })?;

    debug!("Connecting to WebSocket: {}", ws_url);

    let handler_config = chromiumoxide::handler::HandlerConfig {
        request_timeout: timeout,
        ..Default::default()
    };

    Browser::connect_with_config(ws_url, handler_config)
        .await
        .map_err(|e| ScrapeError::Initialization(format!("failed to connect to {}: {}", ws_url, e)))
}

/// Map a DevTools URL (ws:// or http://) to its version endpoint.
pub(crate) fn devtools_version_url(url: &str) -> String {
    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    format!("{}/json/version", http_url.trim_end_matches('/'))
}

#[cfg(feature = "browser")]
#[async_trait]
impl ElementHandle for Element {
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self>> {
        Element::find_elements(self, selector)
            .await
            .map_err(driver_err)
    }

    async fn text(&self) -> Result<String> {
        Ok(self.inner_text().await.map_err(driver_err)?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Element::attribute(self, name).await.map_err(driver_err)
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for ChromeDriver {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        let page = self.page()?;
        tokio::time::timeout(self.timeout, page.goto(url))
            .await
            .map_err(|_| ScrapeError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page()?
            .evaluate(script.to_string())
            .await
            .map_err(|e| ScrapeError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.page()?
            .find_elements(selector)
            .await
            .map_err(driver_err)
    }

    async fn current_url(&self) -> Result<Option<String>> {
        self.page()?.url().await.map_err(driver_err)
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Closing the browser");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close failed: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if self.launched {
                if let Err(e) = browser.close().await {
                    warn!("Browser close failed: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    warn!("Waiting for browser exit failed: {}", e);
                }
            }
        }

        self.handler.abort();
        Ok(())
    }
}

#[cfg(feature = "browser")]
impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromeDriver {
    _private: (),
}

/// Element type of the stub driver; never constructed.
#[cfg(not(feature = "browser"))]
pub enum NoElement {}

#[cfg(not(feature = "browser"))]
impl ChromeDriver {
    pub async fn launch(_config: &BrowserEngineConfig) -> Result<Self> {
        Err(ScrapeError::Initialization(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl ElementHandle for NoElement {
    async fn find_elements(&self, _selector: &str) -> Result<Vec<Self>> {
        match *self {}
    }

    async fn text(&self) -> Result<String> {
        match *self {}
    }

    async fn attribute(&self, _name: &str) -> Result<Option<String>> {
        match *self {}
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageDriver for ChromeDriver {
    type Element = NoElement;

    async fn navigate(&self, _url: &str) -> Result<()> {
        Err(ScrapeError::Driver("browser support not compiled".to_string()))
    }

    async fn execute_script(&self, _script: &str) -> Result<serde_json::Value> {
        Err(ScrapeError::Driver("browser support not compiled".to_string()))
    }

    async fn find_elements(&self, _selector: &str) -> Result<Vec<NoElement>> {
        Err(ScrapeError::Driver("browser support not compiled".to_string()))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
