//! Client core for the DineBook reservation and book catalog service.
//!
//! This crate provides everything below the screen layer of a DineBook
//! client:
//!
//! - `auth`: session and token lifecycle - login, logout, refresh, and
//!   durable token storage in the OS keychain
//! - `api`: typed REST client for books, restaurants and reservations
//! - `models`: the wire data structures
//! - `config`: API base URL and local preferences
//!
//! The application root owns a [`Session`], hydrates it once at startup,
//! and hands its access token to the [`ApiClient`] for authenticated
//! calls.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;

pub use api::ApiClient;
pub use auth::{Session, SessionManager, SessionStatus};
pub use config::Config;
pub use error::{Error, Result};
