//! Async artifact download with bounded retry and progress reporting.
//!
//! The body is streamed straight to disk; integrity checking is a separate
//! stage (see [`crate::io::verify`]).

use std::path::{Path, PathBuf};

use fetchbin_schema::{PackageName, PlatformEntry, Version};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;
use crate::config::FetchConfig;
use crate::io::retry::{ErrorKind, RetryDecision, RetryPolicy, classify_reqwest, classify_status};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Retry classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { source, .. } => classify_reqwest(source),
            Self::Status { status, .. } => classify_status(*status),
            Self::Client(_) | Self::Io(_) | Self::RetriesExhausted { .. } => ErrorKind::Other,
        }
    }
}

/// Request for a download operation
#[derive(Debug)]
pub struct FetchRequest<'a> {
    pub name: &'a PackageName,
    pub version: &'a Version,
    pub entry: &'a PlatformEntry,
    /// Directory the artifact is written into, named after the URL's last segment.
    pub dest_dir: &'a Path,
}

/// HTTP client plus the retry policy applied to each download.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the TLS backend cannot be initialised.
    pub fn new(config: &FetchConfig, policy: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, policy })
    }

    /// Download `entry.url` into `dest_dir`, retrying transient failures.
    ///
    /// Non-transient failures (4xx other than 429, local IO) are returned as-is
    /// on the first occurrence. Transient ones are retried until the policy
    /// gives up, then wrapped in [`FetchError::RetriesExhausted`].
    pub async fn fetch<R: Reporter>(
        &self,
        req: FetchRequest<'_>,
        reporter: &R,
    ) -> Result<PathBuf, FetchError> {
        let dest = req.dest_dir.join(req.entry.file_name());
        let url = req.entry.url.as_str();
        let mut attempt = 1u32;

        loop {
            match self.fetch_once(&req, &dest, reporter).await {
                Ok(size) => {
                    tracing::debug!("fetched {url} ({size} bytes) -> {}", dest.display());
                    return Ok(dest);
                }
                Err(e) => {
                    let kind = e.kind();
                    if !kind.is_transient() {
                        return Err(e);
                    }
                    match self.policy.decide(attempt, kind) {
                        RetryDecision::NoRetry => {
                            return Err(FetchError::RetriesExhausted {
                                url: url.to_string(),
                                attempts: attempt,
                                last: Box::new(e),
                            });
                        }
                        RetryDecision::RetryAfter(delay) => {
                            tracing::warn!(
                                "attempt {attempt} for {url} failed ({e}); retrying in {delay:?}"
                            );
                            reporter.retrying(req.name, req.version, attempt, delay, &e.to_string());
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                    }
                }
            }
        }
    }

    async fn fetch_once<R: Reporter>(
        &self,
        req: &FetchRequest<'_>,
        dest: &Path,
        reporter: &R,
    ) -> Result<u64, FetchError> {
        let url = req.entry.url.as_str();
        let http = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let total = response.content_length();
        reporter.downloading(req.name, req.version, 0, total);

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http)?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            reporter.downloading(req.name, req.version, downloaded, total);
        }

        file.flush().await?;
        Ok(downloaded)
    }
}
