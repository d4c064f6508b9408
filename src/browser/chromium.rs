//! Chromium session over the DevTools protocol (chromiumoxide).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::handler::{Handler, HandlerConfig};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{poll_until, BrowserSession, BrowserSessionConfig, PdfOptions};
use crate::error::{AcquireError, AcquireResult};
use crate::http_client::BROWSER_USER_AGENT;

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

/// Resolves once the document is interactive.
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
        }
    })
"#;

/// Resolves once no new resource entries appeared for 500ms.
const WAIT_FOR_NETWORK_IDLE_SCRIPT: &str = r#"
    new Promise((resolve) => {
        let last = performance.getEntriesByType('resource').length;
        const timer = setInterval(() => {
            const now = performance.getEntriesByType('resource').length;
            if (now === last && document.readyState === 'complete') {
                clearInterval(timer);
                resolve(now);
            }
            last = now;
        }, 500);
    })
"#;

fn browser_err(e: impl std::fmt::Display) -> AcquireError {
    AcquireError::Browser(e.to_string())
}

/// A single browser page driven for the whole run.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch a local browser, or connect to `remote_url` if configured.
    pub async fn launch(config: &BrowserSessionConfig) -> anyhow::Result<Self> {
        let (browser, mut handler) = if let Some(ref remote_url) = config.remote_url {
            connect_remote(remote_url, Duration::from_secs(config.launch_timeout)).await?
        } else {
            info!("Launching browser (headless={})", config.headless);
            let chrome_path = match config.executable {
                Some(ref path) => path.clone(),
                None => find_chrome()?,
            };

            let mut builder = BrowserConfig::builder()
                .chrome_executable(chrome_path)
                .launch_timeout(Duration::from_secs(config.launch_timeout));

            // Set headless mode (with_head means NOT headless, confusingly)
            if !config.headless {
                builder = builder.with_head();
            }

            if let Some(ref proxy) = config.proxy {
                builder = builder.arg(format!("--proxy-server={}", proxy));
            }

            builder = builder
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--disable-sync")
                .arg("--disable-translate")
                .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
                .arg("--disable-gpu");

            for arg in &config.chrome_args {
                builder = builder.arg(arg);
            }

            let browser_config = builder
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

            Browser::launch(browser_config)
                .await
                .context("Failed to launch browser")?
        };

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
            .context("Failed to open browser page")?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| BROWSER_USER_AGENT.to_string());
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .context("Failed to set user agent")?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Wait for ready state, then for the network to go quiet, within `timeout`.
    async fn wait_for_settled(&self, timeout: Duration) -> AcquireResult<()> {
        let started = Instant::now();
        let ready = self.page.evaluate(WAIT_FOR_READY_SCRIPT.to_string());
        match tokio::time::timeout(timeout, ready).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => return Err(AcquireError::timeout("document ready state", timeout)),
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        let idle = self.page.evaluate(WAIT_FOR_NETWORK_IDLE_SCRIPT.to_string());
        match tokio::time::timeout(remaining, idle).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                debug!("Could not check network idle: {}", e);
                Ok(())
            }
            Err(_) => Err(AcquireError::timeout("network idle", timeout)),
        }
    }
}

/// Find Chrome executable.
fn find_chrome() -> anyhow::Result<PathBuf> {
    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    info!("Found Chrome in PATH: {}", path);
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or set browser.executable in the config"
    ))
}

/// Connect to a remote Chrome instance. `timeout` bounds the version lookup
/// and every CDP request on the connection.
async fn connect_remote(url: &str, timeout: Duration) -> anyhow::Result<(Browser, Handler)> {
    info!("Connecting to remote browser at {}", url);

    // Get WebSocket URL from the /json/version endpoint
    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let resp: Value = reqwest::Client::new()
        .get(&version_url)
        .timeout(timeout)
        .send()
        .await
        .context("Failed to connect to remote browser")?
        .json()
        .await
        .context("Failed to parse browser version info")?;

    let ws_url = resp
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

    info!("Connecting to WebSocket: {}", ws_url);

    let handler_config = HandlerConfig {
        request_timeout: timeout,
        ..Default::default()
    };

    Browser::connect_with_config(ws_url, handler_config)
        .await
        .context("Failed to connect to remote browser")
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> AcquireResult<()> {
        debug!(url = %url, "Navigating");
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(browser_err(e)),
            Err(_) => return Err(AcquireError::timeout(format!("navigation to {}", url), timeout)),
        }
        self.wait_for_settled(timeout.saturating_sub(started.elapsed()))
            .await
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> AcquireResult<bool> {
        // querySelectorAll yields an empty list for a missing node, so any
        // error here is the session itself failing.
        let page = &self.page;
        poll_until(timeout, || async move {
            let found = page.find_elements(selector).await.map_err(browser_err)?;
            Ok(!found.is_empty())
        })
        .await
    }

    async fn count(&mut self, selector: &str) -> AcquireResult<usize> {
        let elements = self.page.find_elements(selector).await.map_err(browser_err)?;
        Ok(elements.len())
    }

    async fn text_at(&mut self, selector: &str, index: usize) -> AcquireResult<Option<String>> {
        let elements = self.page.find_elements(selector).await.map_err(browser_err)?;
        match elements.get(index) {
            Some(element) => Ok(Some(
                element
                    .inner_text()
                    .await
                    .map_err(browser_err)?
                    .unwrap_or_default(),
            )),
            None => Ok(None),
        }
    }

    async fn click_at(&mut self, selector: &str, index: usize) -> AcquireResult<bool> {
        let elements = self.page.find_elements(selector).await.map_err(browser_err)?;
        match elements.get(index) {
            Some(element) => {
                element.click().await.map_err(browser_err)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn evaluate(&mut self, function: &str, args: Vec<Value>) -> AcquireResult<Value> {
        let args = serde_json::to_string(&args).map_err(browser_err)?;
        let expression = format!("({})(...{})", function.trim(), args);
        let result = self.page.evaluate(expression).await.map_err(browser_err)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn press_key(&mut self, key: &str) -> AcquireResult<()> {
        for event_type in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let params = DispatchKeyEventParams::builder()
                .r#type(event_type)
                .key(key)
                .code(key)
                .build()
                .map_err(browser_err)?;
            self.page.execute(params).await.map_err(browser_err)?;
        }
        Ok(())
    }

    async fn current_url(&mut self) -> AcquireResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(browser_err)?
            .unwrap_or_default())
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> AcquireResult<bool> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(browser_err(e)),
            Err(_) => Ok(false),
        }
    }

    async fn go_back(&mut self, timeout: Duration) -> AcquireResult<()> {
        self.page
            .evaluate("window.history.back()".to_string())
            .await
            .map_err(browser_err)?;
        if !self.wait_for_navigation(timeout).await? {
            return Err(AcquireError::timeout("history back navigation", timeout));
        }
        self.wait_for_settled(timeout).await
    }

    async fn render_pdf(&mut self, path: &Path, options: &PdfOptions) -> AcquireResult<()> {
        let params = PrintToPdfParams::builder()
            .paper_width(options.paper_width)
            .paper_height(options.paper_height)
            .margin_top(options.margin)
            .margin_bottom(options.margin)
            .margin_left(options.margin)
            .margin_right(options.margin)
            .print_background(options.print_background)
            .build();

        let url = self.current_url().await?;
        let data = self
            .page
            .pdf(params)
            .await
            .map_err(|e| AcquireError::Render {
                url,
                reason: e.to_string(),
            })?;

        tokio::fs::write(path, &data)
            .await
            .map_err(|e| AcquireError::filesystem(path, e))
    }

    async fn close(&mut self) -> AcquireResult<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}
