//! Locating a Chrome/Chromium executable.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, ScrapeError};

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Resolve the browser executable.
///
/// An explicitly configured path must exist; otherwise well-known install
/// locations are tried before searching `PATH`.
pub fn find_chrome(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        // A bare name like "chromium" is looked up in PATH
        if path.components().count() == 1 {
            if let Ok(found) = which::which(path) {
                return Ok(found);
            }
        }
        return Err(ScrapeError::Initialization(format!(
            "configured browser executable does not exist: {}",
            path.display()
        )));
    }

    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(ScrapeError::Initialization(
        "Chrome/Chromium not found. Install it or set chrome_path in the config:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_must_exist() {
        let err = find_chrome(Some(Path::new("/nonexistent/chrome-binary"))).unwrap_err();
        assert!(matches!(err, ScrapeError::Initialization(_)));
        assert!(err.to_string().contains("/nonexistent/chrome-binary"));
    }

    #[test]
    fn test_configured_path_is_used_verbatim() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let found = find_chrome(Some(file.path())).unwrap();
        assert_eq!(found, file.path());
    }
}
