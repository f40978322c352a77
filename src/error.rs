//! Classified errors surfaced by the auth engine.

use thiserror::Error;

/// Errors returned by [`UserStore`](crate::store::UserStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key (email, username, refresh token) already exists.
    ///
    /// Adapters map their backend's conflict signal here (SQLSTATE 23505 for
    /// Postgres) so the engine can close the check-then-act window on
    /// registration without a global lock.
    #[error("unique key conflict")]
    Conflict,

    /// The store call exceeded the configured deadline.
    #[error("store operation timed out")]
    Timeout,

    /// Any other backend failure. The cause stays wrapped and is never
    /// formatted into user-visible messages.
    #[error("backend failure")]
    Backend(#[from] anyhow::Error),
}

/// Error taxonomy of the auth engine.
///
/// Display messages are the user-visible strings; anything operational lives
/// in the wrapped sources and in tracing output.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration conflict on email or username.
    #[error("User already exists")]
    AlreadyExists,

    /// Login failed. Deliberately identical for "no such user" and "wrong
    /// password" so callers cannot enumerate accounts.
    #[error("Password or login is incorrect")]
    InvalidCredentials,

    /// Refresh or access token not recognized.
    #[error("Token is incorrect")]
    InvalidToken,

    /// The user store failed; surfaced upward as a 5xx-class error.
    #[error("Storage failure")]
    Storage(#[from] StoreError),

    /// Anything unexpected, caught at the boundary.
    #[error("Unexpected server error")]
    Internal(#[source] anyhow::Error),
}
