//! Durable token persistence.
//!
//! The token pair survives process restarts in the OS keychain. The store
//! is deliberately dumb: two string entries under fixed keys, written only
//! by the session manager. `load` never fails - any storage error degrades
//! to an empty record so a broken keychain means "logged out", not a crash.

use async_trait::async_trait;
use keyring::Entry;
use tracing::warn;

use crate::error::{Error, Result};

/// Keychain service name under which token entries are stored
const SERVICE_NAME: &str = "dinebook";

/// Logical key for the short-lived access token
const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Logical key for the long-lived refresh token
const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// The persisted token record. Either field may be absent on a fresh
/// install or after a partial failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Storage seam for the session manager.
///
/// The session manager is the only writer; screens and API clients never
/// touch the store directly.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist both tokens, overwriting any prior record.
    async fn save(&self, access_token: &str, refresh_token: &str) -> Result<()>;

    /// Overwrite only the access token, leaving the refresh token untouched.
    /// Used by the refresh transition.
    async fn save_access(&self, access_token: &str) -> Result<()>;

    /// Read the persisted record. Never fails: storage errors degrade to
    /// an empty record.
    async fn load(&self) -> StoredTokens;

    /// Remove both entries.
    async fn clear(&self) -> Result<()>;
}

/// Token store backed by the OS keychain.
///
/// Keyring calls are blocking, so they run on the blocking thread pool.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn write_entry(key: &str, value: &str) -> Result<()> {
        Entry::new(SERVICE_NAME, key)?.set_password(value)?;
        Ok(())
    }

    fn read_entry(key: &'static str) -> Option<String> {
        let entry = match Entry::new(SERVICE_NAME, key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Failed to open keychain entry");
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    /// Delete one entry, treating "not present" as already deleted.
    fn delete_entry(key: &str) -> Result<()> {
        match Entry::new(SERVICE_NAME, key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn run_blocking<F, T>(task: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(task)
            .await
            .map_err(|e| Error::Storage(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl TokenStore for KeyringTokenStore {
    async fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        let access = access_token.to_string();
        let refresh = refresh_token.to_string();
        Self::run_blocking(move || {
            Self::write_entry(ACCESS_TOKEN_KEY, &access)?;
            Self::write_entry(REFRESH_TOKEN_KEY, &refresh)
        })
        .await
    }

    async fn save_access(&self, access_token: &str) -> Result<()> {
        let access = access_token.to_string();
        Self::run_blocking(move || Self::write_entry(ACCESS_TOKEN_KEY, &access)).await
    }

    async fn load(&self) -> StoredTokens {
        let result = Self::run_blocking(|| {
            Ok(StoredTokens {
                access_token: Self::read_entry(ACCESS_TOKEN_KEY),
                refresh_token: Self::read_entry(REFRESH_TOKEN_KEY),
            })
        })
        .await;
        match result {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Failed to load tokens from keychain");
                StoredTokens::default()
            }
        }
    }

    async fn clear(&self) -> Result<()> {
        Self::run_blocking(|| {
            // Attempt both removals even if the first one fails, so a
            // partial record never lingers behind an early return
            let access = Self::delete_entry(ACCESS_TOKEN_KEY);
            let refresh = Self::delete_entry(REFRESH_TOKEN_KEY);
            access.and(refresh)
        })
        .await
    }
}

/// In-memory token store for tests and ephemeral sessions.
///
/// Clones share the same record, so a test can keep a handle for
/// inspection after handing the store to a session manager.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: std::sync::Arc<std::sync::Mutex<StoredTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a token pair, as after a previous login.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        let store = Self::new();
        *store.tokens.lock().unwrap() = StoredTokens {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
        };
        store
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        *self.tokens.lock().unwrap() = StoredTokens {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
        };
        Ok(())
    }

    async fn save_access(&self, access_token: &str) -> Result<()> {
        self.tokens.lock().unwrap().access_token = Some(access_token.to_string());
        Ok(())
    }

    async fn load(&self) -> StoredTokens {
        self.tokens.lock().unwrap().clone()
    }

    async fn clear(&self) -> Result<()> {
        *self.tokens.lock().unwrap() = StoredTokens::default();
        Ok(())
    }
}
