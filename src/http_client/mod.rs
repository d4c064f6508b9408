//! Direct byte-stream downloads.

mod user_agent;

pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENT, USER_AGENT};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::error::{AcquireError, AcquireResult};

/// Fetches a document from a known URL into a file.
#[async_trait]
pub trait DocumentDownloader: Send + Sync {
    /// Download `url` to `destination`, returning the number of bytes written.
    ///
    /// On failure no file is left at `destination`.
    async fn download(&self, url: &str, destination: &Path) -> AcquireResult<u64>;
}

/// Streams response bodies straight to disk.
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(config: &HttpConfig) -> AcquireResult<Self> {
        let user_agent = resolve_user_agent(config.user_agent.as_deref());
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentDownloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> AcquireResult<u64> {
        debug!(url = %url, path = %destination.display(), "Downloading");

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| AcquireError::filesystem(destination, e))?;

        match stream_body(&mut response, &mut file, destination).await {
            Ok(written) => Ok(written),
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                    warn!(
                        "Failed to remove partial file {}: {}",
                        destination.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }
}

async fn stream_body(response: &mut Response, file: &mut File, path: &Path) -> AcquireResult<u64> {
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| AcquireError::filesystem(path, e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| AcquireError::filesystem(path, e))?;
    Ok(written)
}
