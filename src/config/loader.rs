//! Configuration discovery.

use std::path::{Path, PathBuf};

use super::ScraperConfig;
use crate::error::{Result, ScrapeError};

/// Config file read when nothing else is found, relative to the working directory.
const FALLBACK_CONFIG_FILE: &str = "config.yaml";

/// Options for loading configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Directory searched for the fallback `config.yaml` (default: CWD).
    pub working_dir: Option<PathBuf>,
}

/// Load configuration.
///
/// Priority: explicit path (must exist), prefer discovery of `pwcscrape.*`,
/// `config.yaml` in the working directory, then defaults. Environment
/// overrides apply in every case.
pub async fn load_config(options: &LoadOptions) -> Result<ScraperConfig> {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        if !config_path.exists() {
            return Err(ScrapeError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        return ScraperConfig::load_from_path(config_path).await;
    }

    // Priority 2: Auto-discover via prefer
    if let Ok(pref_config) = prefer::load("pwcscrape").await {
        if let Some(path) = pref_config.source_path() {
            tracing::debug!("Discovered config file: {}", path.display());
            return ScraperConfig::load_from_path(path).await;
        }
    }

    // Priority 3: config.yaml next to where we were started
    let working_dir = options
        .working_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    if let Some(path) = fallback_config(&working_dir) {
        tracing::debug!("Using config file: {}", path.display());
        return ScraperConfig::load_from_path(&path).await;
    }

    tracing::debug!("No config file found; using defaults");
    Ok(ScraperConfig::default_with_env())
}

fn fallback_config(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(FALLBACK_CONFIG_FILE);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_missing_config_is_an_error() {
        let options = LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/pwcscrape.toml")),
            ..Default::default()
        };
        let err = load_config(&options).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[tokio::test]
    async fn test_explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        tokio::fs::write(&path, "max_scrolls = 12\n").await.unwrap();

        let options = LoadOptions {
            config_path: Some(path.clone()),
            ..Default::default()
        };
        let config = load_config(&options).await.unwrap();

        assert_eq!(config.max_scrolls, 12);
        assert_eq!(config.source_path, Some(path));
    }

    #[test]
    fn test_fallback_config_lookup() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(fallback_config(dir.path()), None);

        std::fs::write(dir.path().join("config.yaml"), "top_n: 5\n").unwrap();
        assert_eq!(
            fallback_config(dir.path()),
            Some(dir.path().join("config.yaml"))
        );
    }
}
