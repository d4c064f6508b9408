//! Browser automation session.
//!
//! Every discovery step drives one session through [`BrowserSession`]. The
//! trait takes `&mut self` throughout, so the session can only ever be driven
//! by one step at a time. Element access is by selector and index into the
//! live page: handles are never kept across navigations.

mod config;
#[cfg(feature = "browser")]
mod chromium;
#[cfg(test)]
pub(crate) mod fake;

pub use config::{default_headless, BrowserSessionConfig};
#[cfg(feature = "browser")]
pub use chromium::ChromiumSession;

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AcquireError, AcquireResult};

/// Interval between polls in bounded waits.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A4 in inches.
pub const A4_WIDTH_IN: f64 = 8.27;
pub const A4_HEIGHT_IN: f64 = 11.69;

/// Page setup for rendered snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    /// Uniform margin in inches.
    pub margin: f64,
    pub print_background: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            paper_width: A4_WIDTH_IN,
            paper_height: A4_HEIGHT_IN,
            margin: 0.4,
            print_background: true,
        }
    }
}

/// Operations the discovery and fetch code needs from a live browser page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait until the page has loaded and the network is idle.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> AcquireResult<()>;

    /// Wait for `selector` to match. `Ok(false)` on timeout.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> AcquireResult<bool>;

    /// Number of elements currently matching `selector`.
    async fn count(&mut self, selector: &str) -> AcquireResult<usize>;

    /// Inner text of the `index`-th match, `None` if there is no such element.
    async fn text_at(&mut self, selector: &str, index: usize) -> AcquireResult<Option<String>>;

    /// Click the `index`-th match. `Ok(false)` if there is no such element.
    async fn click_at(&mut self, selector: &str, index: usize) -> AcquireResult<bool>;

    /// Call a JavaScript function in the page with JSON arguments.
    async fn evaluate(&mut self, function: &str, args: Vec<Value>) -> AcquireResult<Value>;

    async fn press_key(&mut self, key: &str) -> AcquireResult<()>;

    async fn current_url(&mut self) -> AcquireResult<String>;

    /// Wait for a pending navigation to settle. `Ok(false)` on timeout.
    async fn wait_for_navigation(&mut self, timeout: Duration) -> AcquireResult<bool>;

    async fn go_back(&mut self, timeout: Duration) -> AcquireResult<()>;

    /// Render the current page to a PDF at `path`.
    async fn render_pdf(&mut self, path: &Path, options: &PdfOptions) -> AcquireResult<()>;

    async fn close(&mut self) -> AcquireResult<()>;
}

/// Re-run `check` every [`POLL_INTERVAL`] until it reports `true` or
/// `timeout` passes. Expiry is `Ok(false)`; check errors end the wait.
pub async fn poll_until<F, Fut>(timeout: Duration, mut check: F) -> AcquireResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AcquireResult<bool>>,
{
    let started = Instant::now();
    loop {
        if check().await? {
            return Ok(true);
        }
        if started.elapsed() >= timeout {
            return Ok(false);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Block until the first match of `selector` shows text different from
/// `previous`, the witness captured before an action.
///
/// Expiry is an error: the caller asked for new content and did not get it.
pub async fn wait_for_text_change<B: BrowserSession + ?Sized>(
    session: &mut B,
    selector: &str,
    previous: Option<&str>,
    timeout: Duration,
) -> AcquireResult<()> {
    let started = Instant::now();
    loop {
        let current = session.text_at(selector, 0).await?;
        if current.as_deref() != previous {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(AcquireError::timeout(
                format!("content of {} to change", selector),
                timeout,
            ));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
