//! Access and refresh token issuance.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::user::User;

const REFRESH_TOKEN_BYTES: usize = 64;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: String,
    pub username: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Signs time-bounded access tokens and mints opaque refresh tokens.
///
/// The HS256 keys are derived from the configured secret once, at
/// construction. Configuration problems therefore surface when the issuer is
/// built, not in the middle of a request.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.secret().expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: config.access_token_ttl(),
        }
    }

    /// Sign an access token carrying the user's id and username.
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock is unavailable or signing fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock before Unix epoch")?
            .as_secs();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to sign access token")
    }

    /// Check signature and expiry of an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for any malformed, forged, or
    /// expired token.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Mint a new refresh token: 64 random bytes, hex-encoded.
    ///
    /// Pure capability token — no embedded claims; its only meaning is the
    /// store row it is written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS entropy source fails.
    pub fn issue_refresh_token(&self) -> Result<String> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate refresh token")?;
        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn issuer(secret: &str) -> TokenIssuer {
        let config = AuthConfig::new(SecretString::from(secret)).expect("config");
        TokenIssuer::new(&config)
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            salt: String::new(),
            refresh_token: None,
            birth_date: "2000-01-01".to_string(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let issuer = issuer("test-secret");
        let user = user();
        let token = issuer.issue_access_token(&user).expect("sign");
        let claims = issuer.verify_access_token(&token).expect("verify");
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn verification_rejects_wrong_secret() {
        let token = issuer("test-secret")
            .issue_access_token(&user())
            .expect("sign");
        let err = issuer("other-secret").verify_access_token(&token);
        assert!(matches!(err, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn verification_rejects_garbage() {
        let issuer = issuer("test-secret");
        assert!(matches!(
            issuer.verify_access_token("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_tokens_are_128_hex_chars_and_unique() {
        let issuer = issuer("test-secret");
        let first = issuer.issue_refresh_token().expect("token");
        let second = issuer.issue_refresh_token().expect("token");
        assert_eq!(first.len(), 128);
        assert!(hex::decode(&first).is_ok());
        assert_ne!(first, second);
    }
}
