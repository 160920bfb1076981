//! Browser engine configuration types.
//!
//! These live outside the `browser` feature gate so that config parsing and
//! serialization work without chromiumoxide compiled in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Path to the Chrome/Chromium executable.
    /// Falls back to common install locations and `PATH` when unset.
    #[serde(default, alias = "ChromeDriverPath", alias = "chrome_driver_path")]
    pub chrome_path: Option<PathBuf>,

    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: default_headless(),
            remote_url: None,
            timeout: default_timeout(),
            chrome_args: Vec::new(),
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `CHROME_PATH` - Chrome/Chromium executable
    /// - `PWCSCRAPE_HEADLESS` - `0`/`false` to show the browser window
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(val) = env_non_empty("BROWSER_URL") {
            self.remote_url = Some(val);
        }

        if let Some(val) = env_non_empty("CHROME_PATH") {
            self.chrome_path = Some(PathBuf::from(val));
        }

        if let Some(val) = env_non_empty("PWCSCRAPE_HEADLESS") {
            if let Some(headless) = parse_bool(&val) {
                self.headless = headless;
            }
        }

        self
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}
