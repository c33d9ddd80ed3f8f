//! Boot artifact downloads.
//!
//! Streams a remote object to disk in fixed 1 MiB chunks and reports
//! proportional progress inside the caller's [`ProgressWindow`]. Partial files
//! are left in place on failure.

use crate::error::FetchError;
use crate::progress::{ProgressReporter, ProgressWindow};
use reqwest::Client;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Size of each write to the destination file
pub const CHUNK_SIZE: usize = 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// One artifact fetch
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub url: String,
    pub destination: PathBuf,
    pub window: ProgressWindow,
}

/// Downloads artifacts over HTTP
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
}

impl ArtifactFetcher {
    /// Create a fetcher with a connect timeout but no overall timeout,
    /// since artifacts run to hundreds of megabytes.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download `target.url` into `target.destination`.
    ///
    /// When the response advertises a length, a progress update is sent after
    /// every chunk written; otherwise nothing is reported. Returns the number
    /// of bytes written.
    pub async fn fetch(
        &self,
        target: &DownloadTarget,
        progress: &ProgressReporter,
    ) -> Result<u64, FetchError> {
        debug!("GET {}", target.url);

        let mut response = self.client
            .get(&target.url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: target.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let total = response.content_length().filter(|len| *len > 0);

        let mut file = File::create(&target.destination)
            .await
            .map_err(|source| FetchError::CreateFile {
                path: target.destination.clone(),
                source,
            })?;

        let mut sink = ChunkSink {
            file: &mut file,
            target,
            progress,
            total,
            written: 0,
        };

        let mut buffer: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);
        while let Some(bytes) = response.chunk().await.map_err(FetchError::Body)? {
            buffer.extend_from_slice(&bytes);
            while buffer.len() >= CHUNK_SIZE {
                sink.write(&buffer[..CHUNK_SIZE]).await?;
                buffer.drain(..CHUNK_SIZE);
            }
        }
        if !buffer.is_empty() {
            sink.write(&buffer).await?;
        }

        let written = sink.written;
        file.flush().await.map_err(|source| FetchError::Write {
            path: target.destination.clone(),
            source,
        })?;

        debug!("Wrote {} bytes to {}", written, target.destination.display());
        Ok(written)
    }
}

struct ChunkSink<'a> {
    file: &'a mut File,
    target: &'a DownloadTarget,
    progress: &'a ProgressReporter,
    total: Option<u64>,
    written: u64,
}

impl ChunkSink<'_> {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), FetchError> {
        self.file.write_all(chunk).await.map_err(|source| FetchError::Write {
            path: self.target.destination.clone(),
            source,
        })?;
        self.written += chunk.len() as u64;

        if let Some(total) = self.total {
            let percentage = self.target.window.percentage(self.written, total);
            self.progress
                .update(
                    format!("Downloading... {} MB / {} MB", self.written / MIB, total / MIB),
                    percentage,
                )
                .await;
        }
        Ok(())
    }
}

/// Mark a downloaded artifact executable (0755)
pub async fn mark_executable(path: &Path) -> Result<(), FetchError> {
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| FetchError::Permissions {
            path: path.to_path_buf(),
            source,
        })
}

/// Create `path` and its parents; an existing directory is fine
pub async fn ensure_dir(path: &Path) -> Result<(), FetchError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| FetchError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}
