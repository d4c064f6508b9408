//! Shared helper functions for CLI commands.

use tracing::warn;

use crate::browser::{BrowserSession, BrowserSessionConfig};
use crate::config::Config;
use crate::models::ProductLine;

/// Launch the browser session used for a whole run.
#[cfg(feature = "browser")]
pub async fn launch_session(config: &BrowserSessionConfig) -> anyhow::Result<Box<dyn BrowserSession>> {
    let session = crate::browser::ChromiumSession::launch(config).await?;
    Ok(Box::new(session))
}

#[cfg(not(feature = "browser"))]
pub async fn launch_session(_config: &BrowserSessionConfig) -> anyhow::Result<Box<dyn BrowserSession>> {
    Err(anyhow::anyhow!(
        "Browser support not compiled. Rebuild with: cargo build --features browser"
    ))
}

/// Close the session, logging instead of failing: the run result matters more.
pub async fn close_session(session: &mut dyn BrowserSession) {
    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }
}

/// Resolve `--line` filters against the configured lines.
///
/// An empty filter selects every line. Unknown names are an error.
pub fn select_lines(config: &Config, names: &[String]) -> anyhow::Result<Vec<ProductLine>> {
    if names.is_empty() {
        return Ok(config.product_lines.clone());
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let line = config
            .product_lines
            .iter()
            .find(|l| l.matches_name(name))
            .ok_or_else(|| {
                let known: Vec<&str> = config.product_lines.iter().map(|l| l.name.as_str()).collect();
                anyhow::anyhow!("Unknown product line '{}'. Known: {}", name, known.join(", "))
            })?;
        if !selected.contains(line) {
            selected.push(line.clone());
        }
    }
    Ok(selected)
}
