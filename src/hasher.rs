//! Salted password hashing.
//!
//! Credentials are derived with PBKDF2-HMAC-SHA512 and stored hex-encoded.
//! The default parameters (100 iterations, 512-byte key) reproduce the system
//! this engine replaces and are far below current key-derivation guidance;
//! raise them through [`AuthConfig`](crate::AuthConfig) for new deployments.

use anyhow::{Context, Result};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

const SALT_BYTES: usize = 16;

/// Derives and verifies password hashes.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    iterations: u32,
    key_len: usize,
}

impl CredentialHasher {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            iterations: config.hash_iterations(),
            key_len: config.hash_key_len(),
        }
    }

    /// Derive the hex-encoded hash of `password` under `salt`.
    ///
    /// Deterministic: the same inputs always produce the same digest. The
    /// hex salt string itself is the salt input, matching stored credentials
    /// from the predecessor system.
    #[must_use]
    pub fn hash(&self, password: &str, salt: &str) -> String {
        let mut derived = vec![0u8; self.key_len];
        pbkdf2_hmac::<Sha512>(
            password.as_bytes(),
            salt.as_bytes(),
            self.iterations,
            &mut derived,
        );
        hex::encode(derived)
    }

    /// Generate a fresh per-user salt: 16 random bytes, hex-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS entropy source fails.
    pub fn generate_salt(&self) -> Result<String> {
        let mut bytes = [0u8; SALT_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate salt")?;
        Ok(hex::encode(bytes))
    }

    /// Recompute the hash and compare against `expected` in constant time.
    #[must_use]
    pub fn verify(&self, password: &str, salt: &str, expected: &str) -> bool {
        let computed = self.hash(password, salt);
        computed.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}
