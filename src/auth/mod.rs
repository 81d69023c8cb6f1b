//! Authentication module for managing the session and token lifecycle.
//!
//! This module provides:
//! - `SessionManager`: the stateful session core (hydrate/login/logout/refresh)
//! - `TokenStore` / `KeyringTokenStore`: durable token persistence in the OS keychain
//! - `AuthTransport` / `HttpAuthTransport`: stateless HTTP auth operations
//!
//! Tokens survive process restarts; the session is seeded from the store
//! once at startup.

pub mod session;
pub mod store;
pub mod transport;

pub use session::{Session, SessionManager, SessionStatus};
pub use store::{KeyringTokenStore, MemoryTokenStore, StoredTokens, TokenStore};
pub use transport::{AuthTransport, HttpAuthTransport, TokenPair};
