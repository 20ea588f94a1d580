//! Downloads documents into the scratch directory.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::client::SharePointClient;
use crate::error::Result;
use crate::http::api_error;
use crate::record::DocumentRecord;

/// Downloads are written in pieces of this many bytes.
pub const CHUNK_SIZE: usize = 1024;

/// Outcome of a download attempt that reached the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// The document is on disk at this path.
    Saved(PathBuf),
    /// The API answered with a non-200 status; nothing was written.
    Failed { status: u16 },
}

/// Fetches document content to local storage.
#[derive(Clone)]
pub struct DocumentFetcher {
    client: SharePointClient,
    scratch_dir: PathBuf,
}

impl DocumentFetcher {
    pub fn new(client: SharePointClient, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Create the scratch directory if needed.
    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.scratch_dir).await?;
        Ok(())
    }

    /// Local path a record is downloaded to.
    pub fn local_path(&self, record: &DocumentRecord) -> PathBuf {
        let file_name = Path::new(&record.name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&record.id);
        self.scratch_dir.join(file_name)
    }

    /// Download a record's content.
    ///
    /// A non-200 answer is not an error: it yields [`Download::Failed`]. Errors
    /// are transport, authentication and local I/O failures; a partially
    /// written file is removed before an I/O error is returned.
    pub async fn fetch(&self, record: &DocumentRecord) -> Result<Download> {
        info!(file = %record.name, "downloading file");
        let response = self.client.download(&record.drive_id, &record.id).await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let error = api_error(response).await;
            warn!(file = %record.name, %error, "unable to download file");
            return Ok(Download::Failed { status });
        }

        let path = self.local_path(record);
        if let Err(e) = write_body(&path, response).await {
            if let Err(cleanup) = fs::remove_file(&path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %cleanup, "failed to remove partial download");
                }
            }
            return Err(e);
        }

        Ok(Download::Saved(path))
    }
}

async fn write_body(path: &Path, response: reqwest::Response) -> Result<()> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        for piece in chunk.chunks(CHUNK_SIZE) {
            file.write_all(piece).await?;
        }
    }

    file.flush().await?;
    Ok(())
}
