//! Text extraction: the extraction-service client and the download-extract-delete step.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Body, Client};
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::endpoints::BaseUrl;
use crate::error::{CrawlerError, Result};
use crate::fetcher::{DocumentFetcher, Download};
use crate::record::{DocumentRecord, ExtractionOutcome};

/// A service that turns a local document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Client for an Apache Tika server.
#[derive(Debug, Clone)]
pub struct TikaExtractor {
    base: BaseUrl,
    http: Client,
}

impl TikaExtractor {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base: BaseUrl::parse(base_url)?,
            http: Client::new(),
        })
    }
}

#[async_trait]
impl TextExtractor for TikaExtractor {
    /// `PUT /tika` with the file as body, asking for plain text back.
    async fn extract(&self, path: &Path) -> Result<String> {
        let file = File::open(path).await?;
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();

        let response = self
            .http
            .put(self.base.join_segments(&["tika"]))
            .header(ACCEPT, "text/plain")
            .header(CONTENT_TYPE, mime_type.as_ref())
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CrawlerError::ExtractionError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

/// Downloads a document, extracts its text and deletes the local copy.
pub struct ContentExtractor {
    fetcher: DocumentFetcher,
    extractor: Box<dyn TextExtractor>,
}

impl ContentExtractor {
    pub fn new(fetcher: DocumentFetcher, extractor: Box<dyn TextExtractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Create the scratch directory downloads land in.
    pub async fn prepare(&self) -> Result<()> {
        self.fetcher.prepare().await
    }

    /// Extract the text of one document.
    ///
    /// Only [`CrawlerError::InteractionRequired`] is returned as an error; every
    /// other failure becomes [`ExtractionOutcome::Failed`]. The downloaded file
    /// is gone from disk when this returns, whatever the outcome.
    pub async fn extract(&self, record: &DocumentRecord) -> Result<ExtractionOutcome> {
        let path = match self.fetcher.fetch(record).await {
            Ok(Download::Saved(path)) => path,
            Ok(Download::Failed { status }) => {
                return Ok(ExtractionOutcome::Failed(format!(
                    "download failed with status {}",
                    status
                )))
            }
            Err(e) if e.requires_interaction() => return Err(e),
            Err(e) => {
                warn!(file = %record.name, error = %e, "download failed");
                return Ok(ExtractionOutcome::Failed(format!("download failed: {}", e)));
            }
        };

        info!(path = %path.display(), "extracting file");
        let result = self.extractor.extract(&path).await;
        remove_local(&path).await;

        match result {
            Ok(text) => Ok(ExtractionOutcome::Extracted(text.trim().to_string())),
            Err(e) => {
                warn!(file = %record.name, error = %e, "extraction failed");
                Ok(ExtractionOutcome::Failed(e.to_string()))
            }
        }
    }
}

async fn remove_local(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove downloaded file");
        }
    }
}
