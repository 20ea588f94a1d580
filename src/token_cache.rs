//! Token cache and the credential stores it is persisted in.
//!
//! A cache is loaded from its store before any token acquisition and saved back
//! afterwards, but only if the acquisition changed it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tokens expiring within this window are treated as expired.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// The signed-in account, taken from the ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// `<object id>.<tenant id>`
    pub home_account_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// Serializable OAuth token state for one signed-in session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenCache {
    #[serde(default)]
    account: Option<Account>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    expires_at: u64,
    #[serde(skip)]
    state_changed: bool,
}

impl TokenCache {
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Whether there is anything to acquire a token silently from.
    pub fn has_account(&self) -> bool {
        self.account.is_some() || self.refresh_token.is_some()
    }

    /// The cached access token, if it is still valid for at least a minute.
    ///
    /// An expiry that does not fit in a `SystemTime` counts as expired.
    pub fn valid_access_token(&self) -> Option<&str> {
        let expires_at = UNIX_EPOCH.checked_add(Duration::from_secs(self.expires_at))?;
        match self.access_token.as_deref() {
            Some(token) if expires_at > SystemTime::now() + EXPIRY_BUFFER => Some(token),
            _ => None,
        }
    }

    /// Record a newly issued token set.
    ///
    /// `refresh_token` and `account` keep their previous values when the
    /// response omits them.
    pub fn store_tokens(
        &mut self,
        access_token: String,
        expires_in: u64,
        refresh_token: Option<String>,
        account: Option<Account>,
    ) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.access_token = Some(access_token);
        self.expires_at = now.saturating_add(expires_in);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        if account.is_some() {
            self.account = account;
        }
        self.state_changed = true;
    }

    /// Whether the cache differs from what was loaded.
    pub fn has_state_changed(&self) -> bool {
        self.state_changed
    }
}

/// Where a token cache lives between acquisitions.
pub trait CredentialStore: Send + Sync {
    /// Load the cache; an absent cache loads as empty.
    fn load(&self) -> Result<TokenCache>;

    /// Persist the cache.
    fn save(&self, cache: &TokenCache) -> Result<()>;

    /// Forget everything, e.g. on logout.
    fn clear(&self) -> Result<()>;
}

/// Token cache persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<TokenCache> {
        if !self.path.exists() {
            return Ok(TokenCache::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, cache: &TokenCache) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(cache)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Token cache kept in memory for the lifetime of one run.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    cache: Mutex<TokenCache>,
}

impl MemoryCredentialStore {
    pub fn new(cache: TokenCache) -> Self {
        Self {
            cache: Mutex::new(cache),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TokenCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<TokenCache> {
        let mut cache = self.lock().clone();
        cache.state_changed = false;
        Ok(cache)
    }

    fn save(&self, cache: &TokenCache) -> Result<()> {
        *self.lock() = cache.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = TokenCache::default();
        Ok(())
    }
}
