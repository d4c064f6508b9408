//! Error types for discovery and fetching.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias used across the library.
pub type AcquireResult<T> = Result<T, AcquireError>;

/// Errors raised while discovering or fetching documents.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// A navigation or content-settle wait exceeded its bound.
    #[error("Timed out after {timeout:?} waiting for {what}")]
    NavigationTimeout { what: String, timeout: Duration },

    /// A required element was not present on the page.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Non-success response while downloading a document.
    #[error("Fetch of {url} failed with HTTP {status}")]
    Fetch { url: String, status: u16 },

    /// Rendering a page to a document failed.
    #[error("Render of {url} failed: {reason}")]
    Render { url: String, reason: String },

    /// Directory or file creation failed.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The browser session itself failed (CDP error, closed page, bad script result).
    #[error("Browser error: {0}")]
    Browser(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid run date: {0}")]
    InvalidDate(String),
}

impl AcquireError {
    /// Wrap an I/O error with the path it occurred at.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AcquireError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        AcquireError::NavigationTimeout {
            what: what.into(),
            timeout,
        }
    }
}
