//! OAuth2 authorization-code authentication against the Microsoft identity platform.

use std::sync::Arc;

use jsonwebtoken::{decode, DecodingKey, Validation};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::CrawlerConfig;
use crate::endpoints::BaseUrl;
use crate::error::{CrawlerError, Result};
use crate::models::{IdTokenClaims, TokenErrorResponse, TokenResponse};
use crate::token_cache::{Account, CredentialStore, TokenCache};

/// Scopes the identity platform always needs for a refreshable, identified session.
const RESERVED_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

/// App registration details used for every token request.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authority: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl From<&CrawlerConfig> for OAuthSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authority: config.authority.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
        }
    }
}

/// Confidential client for the identity provider.
#[derive(Clone)]
pub struct Authenticator {
    settings: Arc<OAuthSettings>,
    authority: BaseUrl,
    client: Client,
}

impl Authenticator {
    /// Create a new authenticator; fails if the authority is not a usable URL.
    pub fn new(settings: OAuthSettings) -> Result<Self> {
        let authority = BaseUrl::parse(&settings.authority)?;
        Ok(Self {
            settings: Arc::new(settings),
            authority,
            client: Client::new(),
        })
    }

    fn endpoint(&self, name: &str) -> Url {
        self.authority.join_segments(&["oauth2", "v2.0", name])
    }

    fn scope_param(&self) -> String {
        self.settings
            .scopes
            .iter()
            .map(String::as_str)
            .chain(RESERVED_SCOPES)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// URL the user opens to sign in interactively.
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.endpoint("authorize");
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("response_mode", "query")
            .append_pair("scope", &self.scope_param())
            .append_pair("state", state);
        url
    }

    /// URL that signs the user out of the identity provider's web session.
    pub fn logout_url(&self, post_logout_redirect_uri: &str) -> Url {
        let mut url = self.endpoint("logout");
        url.query_pairs_mut()
            .append_pair("post_logout_redirect_uri", post_logout_redirect_uri);
        url
    }

    /// Redeem an authorization code and store the resulting tokens.
    pub async fn acquire_token_by_auth_code(
        &self,
        code: &str,
        store: &dyn CredentialStore,
    ) -> Result<TokenCache> {
        let mut cache = store.load()?;
        let scope = self.scope_param();
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("scope", scope.as_str()),
        ];

        let token = self
            .request_token(&params)
            .await?
            .map_err(|e| {
                CrawlerError::AuthenticationError(format!(
                    "{}: {}",
                    e.error,
                    e.error_description.unwrap_or_default()
                ))
            })?;

        self.apply(&mut cache, token)?;
        self.save_cache(store, &cache)?;
        info!(
            username = cache.account().and_then(|a| a.username.as_deref()).unwrap_or("-"),
            "signed in"
        );
        Ok(cache)
    }

    /// Get an access token without user interaction.
    ///
    /// Returns `Ok(None)` when there is no cached account or the identity
    /// provider refuses the refresh; the caller must then send the user through
    /// interactive sign-in. With `force_refresh`, a cached access token is
    /// ignored and the refresh token is redeemed.
    pub async fn acquire_token_silent(
        &self,
        store: &dyn CredentialStore,
        force_refresh: bool,
    ) -> Result<Option<String>> {
        let mut cache = store.load()?;
        if !cache.has_account() {
            debug!("no cached account");
            return Ok(None);
        }

        if !force_refresh {
            if let Some(token) = cache.valid_access_token() {
                return Ok(Some(token.to_string()));
            }
        }

        let Some(refresh_token) = cache.refresh_token().map(str::to_string) else {
            debug!("cached account has no refresh token");
            return Ok(None);
        };

        let scope = self.scope_param();
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("scope", scope.as_str()),
        ];

        let token = match self.request_token(&params).await? {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    error = %e.error,
                    description = e.error_description.as_deref().unwrap_or(""),
                    "silent token refresh refused"
                );
                return Ok(None);
            }
        };

        let access_token = token.access_token.clone();
        self.apply(&mut cache, token)?;
        self.save_cache(store, &cache)?;
        debug!("access token refreshed");
        Ok(Some(access_token))
    }

    /// Save the cache if an acquisition changed it.
    pub fn save_cache(&self, store: &dyn CredentialStore, cache: &TokenCache) -> Result<()> {
        if cache.has_state_changed() {
            store.save(cache)?;
        }
        Ok(())
    }

    fn apply(&self, cache: &mut TokenCache, token: TokenResponse) -> Result<()> {
        let account = token.id_token.as_deref().map(account_from_id_token).transpose()?;
        cache.store_tokens(token.access_token, token.expires_in, token.refresh_token, account);
        Ok(())
    }

    /// POST to the token endpoint; the inner error is an OAuth2 error response.
    async fn request_token(
        &self,
        params: &[(&str, &str)],
    ) -> Result<std::result::Result<TokenResponse, TokenErrorResponse>> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(Ok(response.json().await?));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(error) => Ok(Err(error)),
            Err(_) => Err(CrawlerError::TokenRefreshError(format!(
                "Status {}: {}",
                status, body
            ))),
        }
    }
}

/// A fresh, unguessable `state` value for one authorization request.
pub fn new_state() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Read the account from an ID token.
///
/// The token was just received from the token endpoint over TLS, so only the
/// claims are decoded; the signature is not checked.
pub fn account_from_id_token(id_token: &str) -> Result<Account> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = decode::<IdTokenClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)?
        .claims;

    Ok(Account {
        home_account_id: format!("{}.{}", claims.oid, claims.tid),
        username: claims.preferred_username,
        name: claims.name,
    })
}
