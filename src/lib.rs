//! Credential and authentication token lifecycle engine.
//!
//! Register a user, authenticate a user, and rotate refresh tokens into new
//! access tokens, with the invariants that keep credentials and tokens from
//! being misused: salted slow password hashing, uniform login errors,
//! single-active-refresh-token rotation, and store-enforced uniqueness.
//!
//! Transport, request validation, and connection management are the caller's
//! business; the engine is handed a [`store::UserStore`] and an
//! [`AuthConfig`] and exposed behind whatever surface the embedder runs.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sigelo::{store::InMemoryUserStore, AuthConfig, AuthEngine, NewUser};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AuthConfig::from_env()?;
//! let engine = AuthEngine::new(&config, Arc::new(InMemoryUserStore::new()));
//!
//! let pair = engine
//!     .register(NewUser {
//!         username: "alice".to_string(),
//!         email: "a@x.com".to_string(),
//!         password: "pw123".to_string(),
//!         birth_date: "2000-01-01".to_string(),
//!     })
//!     .await?;
//!
//! let pair = engine.refresh(&pair.refresh_token).await?;
//! # let _ = pair;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod store;
pub mod token;
pub mod user;

pub use config::AuthConfig;
pub use engine::AuthEngine;
pub use error::{AuthError, StoreError};
pub use hasher::CredentialHasher;
pub use token::{AccessClaims, TokenIssuer};
pub use user::{NewUser, TokenPair, User};
