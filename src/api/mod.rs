//! REST API client module for the DineBook service.
//!
//! This module provides the `ApiClient` for the book, restaurant and
//! reservation endpoints. Mutating calls carry the bearer token obtained
//! from the session manager; reads are public.

pub mod client;

pub use client::ApiClient;
