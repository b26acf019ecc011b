//! Archive downloads.
//!
//! Archives are streamed chunk by chunk into a `.tmp` file next to the
//! destination and renamed into place once the body is complete, so a
//! partially downloaded archive never sits at the final path.
//!
//! [`ArchiveFetcher`] is the seam the cache uses; [`HttpFetcher`] is the real
//! implementation and tests substitute counting fakes.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::Config;
use crate::errors::{Result, TfgetError};

/// User-Agent header for HTTP requests.
const USER_AGENT: &str = concat!("tfget/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client used for every request, with the configured
/// deadline applied to the whole request (connect, headers and body).
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| TfgetError::network_with_source("failed to create HTTP client", e))
}

/// Something that can place the bytes behind a URL at a local path.
pub trait ArchiveFetcher {
    /// Downloads `url` to `dest`, returning the number of bytes written.
    ///
    /// On error nothing is left at `dest`.
    fn fetch(&self, url: &str, dest: &Path) -> impl Future<Output = Result<u64>>;
}

/// Fetches archives over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
        })
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TfgetError::network_with_source(format!("failed to connect to {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TfgetError::network(format!("HTTP error {status}: {url}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| TfgetError::io(format!("failed to create file {}", dest.display()), e))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                TfgetError::network_with_source(format!("failed to read chunk from {url}"), e)
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TfgetError::io(format!("failed to write to {}", dest.display()), e))?;
            downloaded += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| TfgetError::io(format!("failed to flush {}", dest.display()), e))?;

        Ok(downloaded)
    }
}

impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let temp_path = temp_path_for(dest);

        match self.download_to(url, &temp_path).await {
            Ok(bytes) => {
                tokio::fs::rename(&temp_path, dest).await.map_err(|e| {
                    TfgetError::io(
                        format!(
                            "failed to rename {} to {}",
                            temp_path.display(),
                            dest.display()
                        ),
                        e,
                    )
                })?;
                debug!(url, bytes, "Download complete");
                Ok(bytes)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }
}

/// `terraform_1.0.5.zip` gives `terraform_1.0.5.zip.tmp`.
fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Formats bytes into a human-readable string (KB, MB, GB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
