//! sharepoint_crawler - Crawl SharePoint document libraries into a JSON snapshot.
//!
//! This library provides functionality to:
//! - Sign in against the Microsoft identity platform and keep a token cache
//! - Walk every site, its direct subsites and their document libraries
//! - Download PDF and Word documents and extract their text with Apache Tika
//! - Write the collected document records as one JSON file
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sharepoint_crawler::{
//!     AuthorizedClient, Authenticator, ContentExtractor, CrawlerConfig, DocumentFetcher,
//!     FileCredentialStore, GraphEndpoints, SharePointClient, SiteWalker, TikaExtractor,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CrawlerConfig::builder()
//!         .client_id("client-id")
//!         .client_secret("client-secret")
//!         .build();
//!
//!     let auth = Authenticator::new((&config).into())?;
//!     let store = Arc::new(FileCredentialStore::new(&config.token_cache_path));
//!     let http = AuthorizedClient::connect(auth, store).await?;
//!
//!     let client = SharePointClient::new(http, GraphEndpoints::new(&config.graph_endpoint)?);
//!     let fetcher = DocumentFetcher::new(client.clone(), &config.scratch_dir);
//!     let extractor = TikaExtractor::new(&config.extraction_url)?;
//!     let walker = SiteWalker::new(client, ContentExtractor::new(fetcher, Box::new(extractor)));
//!
//!     let records = walker.crawl().await?;
//!     sharepoint_crawler::snapshot::write_snapshot(&config.output_path, &records).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod extraction;
pub mod fetcher;
pub mod http;
pub mod models;
pub mod record;
pub mod redirect;
pub mod snapshot;
pub mod token_cache;
pub mod walker;

// Re-exports for convenience
pub use auth::{Authenticator, OAuthSettings};
pub use client::SharePointClient;
pub use config::CrawlerConfig;
pub use endpoints::{GraphEndpoints, GraphRequest};
pub use error::{CrawlerError, Result};
pub use extraction::{ContentExtractor, TextExtractor, TikaExtractor};
pub use fetcher::{DocumentFetcher, Download};
pub use http::AuthorizedClient;
pub use record::{DocumentRecord, ExtractionOutcome};
pub use redirect::extract_auth_code;
pub use token_cache::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenCache};
pub use walker::SiteWalker;
