//! Engine configuration.

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;

pub(crate) const ENV_SECRET: &str = "SIGELO_SECRET";
pub(crate) const ENV_ACCESS_TOKEN_TTL_MINUTES: &str = "SIGELO_ACCESS_TOKEN_TTL_MINUTES";

const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: u64 = 30;

// Source-compatible key derivation parameters. Weak for modern password
// storage; operators should raise the iteration count via the builder.
const DEFAULT_HASH_ITERATIONS: u32 = 100;
const DEFAULT_HASH_KEY_LEN: usize = 512;

/// Configuration consumed by the engine, the hasher, and the token issuer.
///
/// The signing secret is required and must be non-empty; there is no embedded
/// default, so a misconfigured deployment fails when the config is built, not
/// on the first request.
#[derive(Clone)]
pub struct AuthConfig {
    secret: SecretString,
    access_token_ttl: Duration,
    hash_iterations: u32,
    hash_key_len: usize,
    store_timeout: Option<Duration>,
}

impl AuthConfig {
    /// Build a config with the given signing secret and defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty.
    pub fn new(secret: SecretString) -> Result<Self> {
        if secret.expose_secret().is_empty() {
            return Err(anyhow!("signing secret must not be empty"));
        }
        Ok(Self {
            secret,
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_MINUTES * 60),
            hash_iterations: DEFAULT_HASH_ITERATIONS,
            hash_key_len: DEFAULT_HASH_KEY_LEN,
            store_timeout: None,
        })
    }

    /// Load from the environment: `SIGELO_SECRET` (required) and
    /// `SIGELO_ACCESS_TOKEN_TTL_MINUTES` (optional, default 30).
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is unset/empty or the TTL is not a
    /// positive integer.
    pub fn from_env() -> Result<Self> {
        let secret = env::var(ENV_SECRET)
            .map(SecretString::from)
            .with_context(|| format!("{ENV_SECRET} not defined"))?;

        let mut config = Self::new(secret)?;

        if let Ok(minutes) = env::var(ENV_ACCESS_TOKEN_TTL_MINUTES) {
            let minutes: u64 = minutes
                .parse()
                .with_context(|| format!("invalid {ENV_ACCESS_TOKEN_TTL_MINUTES}: {minutes}"))?;
            if minutes == 0 {
                return Err(anyhow!("{ENV_ACCESS_TOKEN_TTL_MINUTES} must be positive"));
            }
            config = config.with_access_token_ttl(Duration::from_secs(minutes * 60));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_hash_iterations(mut self, iterations: u32) -> Self {
        self.hash_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_hash_key_len(mut self, key_len: usize) -> Self {
        self.hash_key_len = key_len;
        self
    }

    /// Deadline applied to every store call made by the engine. Elapsing is
    /// surfaced as a storage failure, never as a half-updated record.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    #[must_use]
    pub fn hash_iterations(&self) -> u32 {
        self.hash_iterations
    }

    #[must_use]
    pub fn hash_key_len(&self) -> usize {
        self.hash_key_len
    }

    #[must_use]
    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.secret
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_key_len", &self.hash_key_len)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}
