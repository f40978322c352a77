//! User records and the token pair value object.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted identity record.
///
/// `email` and `username` are unique exact-match keys; case is not normalized,
/// so `Alice@x.com` and `alice@x.com` are distinct users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Assigned at creation, immutable afterwards.
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Hex-encoded PBKDF2 digest; never the plaintext password.
    pub password_hash: String,
    /// Per-user random value, generated once at registration.
    pub salt: String,
    /// Single active session token. Replaced on every successful register,
    /// login, and refresh; the previous value stops matching any user.
    pub refresh_token: Option<String>,
    /// Opaque user-supplied attribute, not used in control logic.
    pub birth_date: String,
}

/// Registration input, before credential derivation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birth_date: String,
}

/// The `{access_token, refresh_token}` bundle returned on every successful
/// auth operation. Built per call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_serializes_both_fields() {
        let pair = TokenPair {
            access_token: "header.claims.sig".to_string(),
            refresh_token: "ab".repeat(64),
        };
        let value = serde_json::to_value(&pair).expect("serialize token pair");
        assert_eq!(
            value.get("access_token").and_then(|v| v.as_str()),
            Some("header.claims.sig")
        );
        assert_eq!(
            value
                .get("refresh_token")
                .and_then(|v| v.as_str())
                .map(str::len),
            Some(128)
        );
    }

    #[test]
    fn user_round_trips_through_json() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "00ff".to_string(),
            salt: "0f".repeat(16),
            refresh_token: None,
            birth_date: "2000-01-01".to_string(),
        };
        let json = serde_json::to_string(&user).expect("serialize user");
        let decoded: User = serde_json::from_str(&json).expect("deserialize user");
        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.refresh_token, None);
    }
}
