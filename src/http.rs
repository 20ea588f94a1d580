//! Bearer-authenticated GET with a single re-authentication on 401/403.

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use tokio::sync::RwLock;
use tracing::warn;
use url::Url;

use crate::auth::Authenticator;
use crate::error::{CrawlerError, Result};
use crate::token_cache::CredentialStore;

/// HTTP client that carries the current access token.
///
/// Clones share the token, so a refresh done through one clone is seen by all.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: Client,
    auth: Authenticator,
    store: Arc<dyn CredentialStore>,
    bearer: Arc<RwLock<String>>,
}

impl AuthorizedClient {
    /// Acquire an access token silently and build a client around it.
    ///
    /// Fails with [`CrawlerError::InteractionRequired`] when no token can be
    /// obtained without the user.
    pub async fn connect(auth: Authenticator, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let token = auth
            .acquire_token_silent(store.as_ref(), false)
            .await?
            .ok_or(CrawlerError::InteractionRequired)?;
        Ok(Self::with_token(auth, store, token))
    }

    /// Build a client around an already acquired access token.
    pub fn with_token(auth: Authenticator, store: Arc<dyn CredentialStore>, token: String) -> Self {
        Self {
            http: Client::new(),
            auth,
            store,
            bearer: Arc::new(RwLock::new(token)),
        }
    }

    /// GET `url` with the bearer token.
    ///
    /// On 401 or 403 the token is refreshed once and the request re-issued
    /// once; whatever the second attempt returns is handed back. Other statuses
    /// are the caller's to inspect. The body is never buffered here, on either
    /// attempt.
    pub async fn get(&self, url: Url) -> Result<Response> {
        let response = self.send(url.clone()).await?;
        if !matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(response);
        }

        warn!(status = %response.status(), %url, "access token rejected, refreshing");
        let token = self
            .auth
            .acquire_token_silent(self.store.as_ref(), true)
            .await?
            .ok_or(CrawlerError::InteractionRequired)?;
        *self.bearer.write().await = token;

        self.send(url).await
    }

    async fn send(&self, url: Url) -> Result<Response> {
        let token = self.bearer.read().await.clone();
        Ok(self.http.get(url).bearer_auth(token).send().await?)
    }
}

/// Turn a non-success response into an [`CrawlerError::ApiError`].
///
/// Graph error bodies contribute their code and message.
pub async fn api_error(response: Response) -> CrawlerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<crate::models::ApiErrorResponse>(&body) {
        Ok(api_error) => CrawlerError::ApiError {
            status,
            message: format!("{}: {}", api_error.error.code, api_error.error.message),
        },
        Err(_) => CrawlerError::ApiError {
            status,
            message: body,
        },
    }
}
