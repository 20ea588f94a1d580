//! # Crawler Configuration
//!
//! Everything the crawler needs to know about its external collaborators: the
//! app registration at the identity provider, the document API, the
//! text-extraction service, and the local paths it reads and writes.
//!
//! `CrawlerConfig::default()` carries the stock endpoints; the builder overrides
//! individual fields.

use std::path::PathBuf;

use crate::error::{CrawlerError, Result};

/// Microsoft Graph v1.0 base URL.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Multi-tenant authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";

/// Requests every Graph permission already consented for the app.
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Redirect URI registered for the app; the path is `/getAToken`.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5000/getAToken";

/// Local Tika server.
pub const DEFAULT_EXTRACTION_URL: &str = "http://localhost:5007";

pub const DEFAULT_SCRATCH_DIR: &str = "SharePoint_files";
pub const DEFAULT_OUTPUT_PATH: &str = "sharepoint_content.json";
pub const DEFAULT_TOKEN_CACHE_PATH: &str = "token_cache.json";

/// Configuration for authentication and crawling.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Application (client) ID of the app registration
    pub client_id: String,

    /// Client secret of the app registration
    pub client_secret: String,

    /// Tenant authority URL, e.g. `https://login.microsoftonline.com/<tenant>`
    pub authority: String,

    /// Absolute redirect URI registered for the app
    pub redirect_uri: String,

    /// Scopes requested when acquiring tokens
    pub scopes: Vec<String>,

    /// Base URL of the document API
    pub graph_endpoint: String,

    /// Base URL of the text-extraction service
    pub extraction_url: String,

    /// Directory downloads are written to before extraction
    pub scratch_dir: PathBuf,

    /// Where the JSON snapshot is written
    pub output_path: PathBuf,

    /// Where the token cache is persisted between runs
    pub token_cache_path: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authority: DEFAULT_AUTHORITY.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            graph_endpoint: DEFAULT_GRAPH_ENDPOINT.to_string(),
            extraction_url: DEFAULT_EXTRACTION_URL.to_string(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            token_cache_path: PathBuf::from(DEFAULT_TOKEN_CACHE_PATH),
        }
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Check that the app registration is filled in.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(CrawlerError::MissingConfig("client_id"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(CrawlerError::MissingConfig("client_secret"));
        }
        if self.scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(CrawlerError::MissingConfig("scopes"));
        }
        Ok(())
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.config.client_secret = client_secret.into();
        self
    }

    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.config.authority = authority.into();
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.config.redirect_uri = redirect_uri.into();
        self
    }

    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.config.scopes = scopes;
        self
    }

    pub fn graph_endpoint(mut self, graph_endpoint: impl Into<String>) -> Self {
        self.config.graph_endpoint = graph_endpoint.into();
        self
    }

    pub fn extraction_url(mut self, extraction_url: impl Into<String>) -> Self {
        self.config.extraction_url = extraction_url.into();
        self
    }

    pub fn scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = scratch_dir.into();
        self
    }

    pub fn output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.config.output_path = output_path.into();
        self
    }

    pub fn token_cache_path(mut self, token_cache_path: impl Into<PathBuf>) -> Self {
        self.config.token_cache_path = token_cache_path.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}
