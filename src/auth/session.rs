//! Session lifecycle management.
//!
//! The `SessionManager` owns the in-memory token pair and the derived
//! authorization status, orchestrating the token store and auth transport.
//! It is the only writer to the durable token record.
//!
//! State machine: `Initializing` resolves to `Authenticated` or
//! `Unauthenticated` once `hydrate` completes (or times out), and the
//! session moves between the latter two on login/logout/refresh. All
//! mutating operations take `&mut self`, so the borrow checker serializes
//! them - a second login or refresh cannot start while one is in flight,
//! and a stale refresh result can never be applied over a newer state.

use std::time::Duration;

use tracing::{debug, warn};

use crate::auth::store::{KeyringTokenStore, StoredTokens, TokenStore};
use crate::auth::transport::{AuthTransport, HttpAuthTransport, TokenPair};
use crate::error::Result;

/// Ceiling on startup hydration.
/// If the store has not answered within this window the session resolves
/// unauthenticated rather than leaving the app stuck on a startup screen.
const HYDRATION_TIMEOUT_SECS: u64 = 5;

/// Derived authorization state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Startup hydration has not resolved yet. Dependent components must
    /// not attempt authenticated calls in this state.
    Initializing,
    /// An access token is present.
    Authenticated,
    /// No access token.
    Unauthenticated,
}

/// The session manager, generic over its storage and transport seams.
///
/// Screens and API clients hold a reference to this via the application
/// root; there is no ambient singleton.
pub struct SessionManager<S, T> {
    store: S,
    transport: T,
    access_token: Option<String>,
    refresh_token: Option<String>,
    status: SessionStatus,
}

/// Session wired to the OS keychain and the HTTP auth endpoints.
pub type Session = SessionManager<KeyringTokenStore, HttpAuthTransport>;

impl Session {
    /// Open a session against the given API base URL.
    pub fn open(base_url: impl Into<String>) -> Result<Self> {
        Ok(SessionManager::new(
            KeyringTokenStore,
            HttpAuthTransport::new(base_url)?,
        ))
    }
}

impl<S: TokenStore, T: AuthTransport> SessionManager<S, T> {
    pub fn new(store: S, transport: T) -> Self {
        Self {
            store,
            transport,
            access_token: None,
            refresh_token: None,
            status: SessionStatus::Initializing,
        }
    }

    /// Seed the in-memory session from the token store.
    ///
    /// Runs at most once per process: calling it again after the status
    /// has resolved is a no-op. Hydration is bounded by a fallback
    /// timeout; on timeout the session resolves unauthenticated.
    pub async fn hydrate(&mut self) {
        if self.status != SessionStatus::Initializing {
            return;
        }
        let timeout = Duration::from_secs(HYDRATION_TIMEOUT_SECS);
        let tokens = match tokio::time::timeout(timeout, self.store.load()).await {
            Ok(tokens) => tokens,
            Err(_) => {
                warn!("Token store hydration timed out, starting unauthenticated");
                StoredTokens::default()
            }
        };
        self.access_token = tokens.access_token;
        self.refresh_token = tokens.refresh_token;
        self.resolve_status();
        debug!(authenticated = self.is_authenticated(), "Session hydrated");
    }

    /// Exchange credentials for a token pair, persist it, and move to
    /// `Authenticated`.
    ///
    /// Tokens are persisted before memory is updated: if the save fails
    /// the error propagates and the session stays unauthenticated, so no
    /// rollback is needed. Transport failures propagate unchanged for
    /// user-facing display.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let TokenPair {
            access_token,
            refresh_token,
        } = self.transport.login(email, password).await?;
        self.store.save(&access_token, &refresh_token).await?;
        self.access_token = Some(access_token);
        self.refresh_token = Some(refresh_token);
        self.resolve_status();
        debug!("Login succeeded");
        Ok(())
    }

    /// End the session.
    ///
    /// The server-side logout is best-effort: an expired or invalid token
    /// must not block local cleanup, so transport failures are logged and
    /// suppressed. The store and in-memory tokens are cleared
    /// unconditionally; only a store failure propagates.
    pub async fn logout(&mut self) -> Result<()> {
        if let Some(token) = self.access_token.take() {
            if let Err(e) = self.transport.logout(&token).await {
                warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }
        let cleared = self.store.clear().await;
        self.access_token = None;
        self.refresh_token = None;
        self.resolve_status();
        debug!("Session cleared");
        cleared
    }

    /// Swap the access token for a fresh one using the refresh token.
    ///
    /// On success only the access token changes, in memory and in the
    /// store. Any transport failure is fatal to the session: an
    /// unrefreshable session cannot proceed, so it cascades into a full
    /// logout. With no refresh token present this is a no-op.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(refresh_token) = self.refresh_token.clone() else {
            return Ok(());
        };
        match self.transport.refresh(&refresh_token).await {
            Ok(access_token) => {
                self.store.save_access(&access_token).await?;
                self.access_token = Some(access_token);
                self.resolve_status();
                debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.logout().await
            }
        }
    }

    fn resolve_status(&mut self) {
        self.status = if self.access_token.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        };
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// True only while startup hydration is unresolved.
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Initializing
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Current bearer credential for authenticated API calls.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::store::MemoryTokenStore;
    use crate::error::Error;

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    /// Scripted transport: `None` results mean the server rejected the
    /// credential.
    #[derive(Default)]
    struct FakeTransport {
        login_result: Option<TokenPair>,
        refresh_result: Option<String>,
        fail_logout: bool,
        calls: CallLog,
    }

    impl FakeTransport {
        fn logs_in(access: &str, refresh: &str) -> Self {
            Self {
                login_result: Some(TokenPair {
                    access_token: access.to_string(),
                    refresh_token: refresh.to_string(),
                }),
                ..Default::default()
            }
        }

        fn refreshes_to(access: &str) -> Self {
            Self {
                refresh_result: Some(access.to_string()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl AuthTransport for FakeTransport {
        async fn login(&self, _email: &str, _password: &str) -> Result<TokenPair> {
            self.calls.lock().unwrap().push("login");
            self.login_result
                .clone()
                .ok_or_else(|| Error::Auth("Invalid email or password".to_string()))
        }

        async fn logout(&self, _access_token: &str) -> Result<()> {
            self.calls.lock().unwrap().push("logout");
            if self.fail_logout {
                Err(Error::Auth("Token expired".to_string()))
            } else {
                Ok(())
            }
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<String> {
            self.calls.lock().unwrap().push("refresh");
            self.refresh_result
                .clone()
                .ok_or_else(|| Error::Auth("Refresh token expired".to_string()))
        }
    }

    /// Store whose load never answers, for exercising the hydration
    /// ceiling.
    struct StalledStore;

    #[async_trait]
    impl TokenStore for StalledStore {
        async fn save(&self, _access: &str, _refresh: &str) -> Result<()> {
            Ok(())
        }
        async fn save_access(&self, _access: &str) -> Result<()> {
            Ok(())
        }
        async fn load(&self) -> StoredTokens {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            StoredTokens::default()
        }
        async fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fresh_install_resolves_unauthenticated() {
        let mut session = SessionManager::new(MemoryTokenStore::new(), FakeTransport::default());
        assert!(session.is_loading());
        session.hydrate().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
    }

    #[tokio::test]
    async fn test_stored_tokens_resolve_authenticated() {
        let store = MemoryTokenStore::with_tokens("tok1", "ref1");
        let mut session = SessionManager::new(store, FakeTransport::default());
        session.hydrate().await;
        assert!(session.is_authenticated());
        assert_eq!(session.access_token(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_hydrate_runs_at_most_once() {
        let transport = FakeTransport::logs_in("tok2", "ref2");
        let mut session = SessionManager::new(MemoryTokenStore::new(), transport);
        session.hydrate().await;
        session.login("u@x.com", "pw").await.unwrap();
        // A second hydrate must not re-seed the in-memory state
        session.hydrate().await;
        assert!(session.is_authenticated());
        assert_eq!(session.access_token(), Some("tok2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydration_timeout_forces_resolution() {
        let mut session = SessionManager::new(StalledStore, FakeTransport::default());
        session.hydrate().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_persists_both_tokens() {
        let store = MemoryTokenStore::new();
        let transport = FakeTransport::logs_in("tok2", "ref2");
        let mut session = SessionManager::new(store.clone(), transport);
        session.hydrate().await;
        session.login("u@x.com", "pw").await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.access_token(), Some("tok2"));
        let stored = store.load().await;
        assert_eq!(stored.access_token.as_deref(), Some("tok2"));
        assert_eq!(stored.refresh_token.as_deref(), Some("ref2"));
    }

    #[tokio::test]
    async fn test_login_failure_propagates_and_leaves_state() {
        let store = MemoryTokenStore::new();
        let mut session = SessionManager::new(store.clone(), FakeTransport::default());
        session.hydrate().await;
        let err = session.login("u@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(!session.is_authenticated());
        assert_eq!(store.load().await, StoredTokens::default());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_transport_fails() {
        let store = MemoryTokenStore::with_tokens("tok1", "ref1");
        let transport = FakeTransport {
            fail_logout: true,
            ..Default::default()
        };
        let mut session = SessionManager::new(store.clone(), transport);
        session.hydrate().await;
        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
        assert_eq!(store.load().await, StoredTokens::default());
    }

    #[tokio::test]
    async fn test_logout_without_token_skips_transport() {
        let transport = FakeTransport::default();
        let calls = transport.calls.clone();
        let mut session = SessionManager::new(MemoryTokenStore::new(), transport);
        session.hydrate().await;
        session.logout().await.unwrap();
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_swaps_access_token_only() {
        let store = MemoryTokenStore::with_tokens("tok2", "ref2");
        let transport = FakeTransport::refreshes_to("tok3");
        let mut session = SessionManager::new(store.clone(), transport);
        session.hydrate().await;
        session.refresh().await.unwrap();

        assert_eq!(session.access_token(), Some("tok3"));
        let stored = store.load().await;
        assert_eq!(stored.access_token.as_deref(), Some("tok3"));
        assert_eq!(stored.refresh_token.as_deref(), Some("ref2"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_failure_forces_logout() {
        let store = MemoryTokenStore::with_tokens("tok2", "ref2");
        let mut session = SessionManager::new(store.clone(), FakeTransport::default());
        session.hydrate().await;
        session.refresh().await.unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
        assert_eq!(store.load().await, StoredTokens::default());
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_a_noop() {
        let transport = FakeTransport::default();
        let calls = transport.calls.clone();
        let mut session = SessionManager::new(MemoryTokenStore::new(), transport);
        session.hydrate().await;
        session.refresh().await.unwrap();
        assert!(calls.lock().unwrap().is_empty());
        assert!(!session.is_authenticated());
    }
}
