//! The user store contract the engine depends on.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::user::User;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Narrow persistence contract for user records.
///
/// The engine only ever talks to this trait; transports own the backing
/// connection and hand an implementation in at construction.
///
/// Required guarantees:
/// - `update_refresh_token` is an atomic read-modify-write per user row and
///   returns the post-update record (last write wins under concurrency).
/// - `create` fails with [`StoreError::Conflict`] when a unique key (email,
///   username) already exists, so concurrent registrations cannot both
///   succeed even though the engine's existence pre-checks are racy.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Persist a new user record. The record's id is assigned by the caller
    /// and must not exist yet.
    async fn create(&self, user: User) -> Result<User, StoreError>;

    /// Replace the stored refresh token for `user_id` and return the updated
    /// record, or `Ok(None)` if the user disappeared.
    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError>;
}
