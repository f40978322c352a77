//! Register / login / refresh orchestration.

use anyhow::anyhow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, StoreError};
use crate::hasher::CredentialHasher;
use crate::store::UserStore;
use crate::token::TokenIssuer;
use crate::user::{NewUser, TokenPair, User};

/// Orchestrates the credential hasher, the token issuer, and the user store.
///
/// Holds no per-user state; every operation is a short sequence of awaited
/// store and crypto calls, so operations for different users run concurrently
/// without any engine-owned locks. Email and username matching is exact;
/// case is not normalized.
pub struct AuthEngine {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    issuer: TokenIssuer,
    store_timeout: Option<Duration>,
}

impl AuthEngine {
    #[must_use]
    pub fn new(config: &AuthConfig, store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            hasher: CredentialHasher::new(config),
            issuer: TokenIssuer::new(config),
            store_timeout: config.store_timeout(),
        }
    }

    /// The token issuer, for callers that need to verify access tokens.
    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a new user and issue its first token pair.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyExists`] when the email or username is taken —
    /// from the pre-checks or from a store conflict during create, whichever
    /// fires first under concurrency.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register(&self, new_user: NewUser) -> Result<TokenPair, AuthError> {
        if self.lookup(self.store.find_by_email(&new_user.email)).await?.is_some() {
            debug!("email already registered");
            return Err(AuthError::AlreadyExists);
        }

        if self
            .lookup(self.store.find_by_username(&new_user.username))
            .await?
            .is_some()
        {
            debug!("username already registered");
            return Err(AuthError::AlreadyExists);
        }

        let salt = self.hasher.generate_salt().map_err(AuthError::Internal)?;
        let password_hash = self.hasher.hash(&new_user.password, &salt);

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash,
            salt,
            refresh_token: None,
            birth_date: new_user.birth_date,
        };

        // The pre-checks above are racy; the store's unique keys are the
        // actual guarantee. A conflict here means another registration won.
        let user = match self.with_deadline(self.store.create(user)).await {
            Ok(user) => user,
            Err(StoreError::Conflict) => {
                debug!("create lost a registration race");
                return Err(AuthError::AlreadyExists);
            }
            Err(err) => {
                error!("failed to create user: {err:?}");
                return Err(AuthError::Storage(err));
            }
        };

        self.issue_token_pair(user.id).await
    }

    /// Authenticate by email and password.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for unknown email and for a wrong
    /// password alike; the two cases are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.lookup(self.store.find_by_email(email)).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.salt, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token_pair(user.id).await
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// Possession of the token alone authorizes issuance; the stored value is
    /// overwritten, so the submitted token cannot be replayed.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] when no user holds the token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self
            .lookup(self.store.find_by_refresh_token(refresh_token))
            .await?
        else {
            return Err(AuthError::InvalidToken);
        };

        self.issue_token_pair(user.id).await
    }

    /// Shared issuance protocol: mint a refresh token, rotate it into the
    /// store, then sign an access token over the post-update record.
    async fn issue_token_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let refresh_token = self
            .issuer
            .issue_refresh_token()
            .map_err(AuthError::Internal)?;

        let updated = self
            .with_deadline(self.store.update_refresh_token(user_id, &refresh_token))
            .await
            .map_err(|err| {
                error!("failed to rotate refresh token: {err:?}");
                AuthError::Storage(err)
            })?
            .ok_or_else(|| {
                // Lookup succeeded moments ago; the row is gone.
                AuthError::Internal(anyhow!("user {user_id} vanished during token rotation"))
            })?;

        let access_token = self
            .issuer
            .issue_access_token(&updated)
            .map_err(AuthError::Internal)?;

        // The refresh token from the post-update record, not the local value:
        // under a concurrent rotation the last write wins and this call must
        // hand out the token it actually persisted.
        let refresh_token = updated.refresh_token.ok_or_else(|| {
            AuthError::Internal(anyhow!("store returned a record without a refresh token"))
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn lookup<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, AuthError> {
        self.with_deadline(fut).await.map_err(|err| {
            error!("store lookup failed: {err:?}");
            AuthError::Storage(err)
        })
    }

    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match self.store_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout),
            },
            None => fut.await,
        }
    }
}
