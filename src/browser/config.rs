//! Browser session configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How to obtain the browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSessionConfig {
    /// Run in headless mode (default: true).
    /// Set to false to watch the run.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit Chrome/Chromium executable (skips auto-detection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// User agent override for every page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Timeout in seconds for launching or connecting.
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout: u64,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            executable: None,
            proxy: None,
            chrome_args: Vec::new(),
            remote_url: None,
            user_agent: None,
            launch_timeout: default_launch_timeout(),
        }
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_launch_timeout() -> u64 {
    30
}
