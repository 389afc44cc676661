//! Client side of the ehrlite API: a typed HTTP client, bearer-token storage
//! and per-profile CLI settings.

pub mod auth;
pub mod client;
pub mod config;

pub use auth::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
pub use client::{ClientError, EhrClient};
