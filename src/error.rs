//! Error types for the sharepoint_crawler crate.

use thiserror::Error;

/// Errors that can occur while authenticating, crawling or extracting.
#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Interactive sign-in required: no usable cached account, run `login` first")]
    InteractionRequired,

    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("URL cannot be used as a base: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid authorization response: {0}")]
    InvalidRedirect(String),

    #[error("Extraction service error ({status}): {message}")]
    ExtractionError { status: u16, message: String },

    #[error("ID token decode error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),
}

impl CrawlerError {
    /// Whether the error can only be resolved by signing in again.
    ///
    /// This is the one condition the traversal does not degrade to "log and skip".
    pub fn requires_interaction(&self) -> bool {
        matches!(self, CrawlerError::InteractionRequired)
    }
}

/// Result type alias for CrawlerError.
pub type Result<T> = std::result::Result<T, CrawlerError>;
