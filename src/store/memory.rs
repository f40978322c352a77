//! In-process user store.
//!
//! Backs the engine in tests and in embedders that do not need durable
//! storage. Uniqueness and rotation semantics match the Postgres adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::UserStore;
use crate::error::StoreError;
use crate::user::User;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users, for test assertions.
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.refresh_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        // Single lock over check and insert: the unique-index equivalent.
        let conflict = users.values().any(|existing| {
            existing.email == user.email
                || existing.username == user.username
                || existing.id == user.id
        });
        if conflict {
            return Err(StoreError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().await;
        Ok(users.get_mut(&user_id).map(|user| {
            user.refresh_token = Some(token.to_string());
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            salt: "salt".to_string(),
            refresh_token: None,
            birth_date: "2000-01-01".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_lookup_by_each_key() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("alice", "a@x.com")).await.expect("create");
        let updated = store
            .update_refresh_token(created.id, "token-1")
            .await
            .expect("update")
            .expect("user exists");
        assert_eq!(updated.refresh_token.as_deref(), Some("token-1"));

        assert!(store.find_by_email("a@x.com").await.expect("ok").is_some());
        assert!(store.find_by_username("alice").await.expect("ok").is_some());
        assert!(store
            .find_by_refresh_token("token-1")
            .await
            .expect("ok")
            .is_some());
        assert!(store
            .find_by_refresh_token("token-0")
            .await
            .expect("ok")
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.create(user("alice", "a@x.com")).await.expect("create");
        let result = store.create(user("bob", "a@x.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = InMemoryUserStore::new();
        store.create(user("alice", "a@x.com")).await.expect("create");
        let result = store.create(user("alice", "b@x.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn email_matching_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.create(user("alice", "a@x.com")).await.expect("create");
        assert!(store.find_by_email("A@x.com").await.expect("ok").is_none());
        // Distinct by case only: allowed, as documented.
        assert!(store.create(user("alice2", "A@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn rotation_is_last_write_wins() {
        let store = InMemoryUserStore::new();
        let created = store.create(user("alice", "a@x.com")).await.expect("create");
        store
            .update_refresh_token(created.id, "first")
            .await
            .expect("update");
        store
            .update_refresh_token(created.id, "second")
            .await
            .expect("update");
        assert!(store.find_by_refresh_token("first").await.expect("ok").is_none());
        assert!(store
            .find_by_refresh_token("second")
            .await
            .expect("ok")
            .is_some());
    }

    #[tokio::test]
    async fn update_for_unknown_user_is_none() {
        let store = InMemoryUserStore::new();
        let result = store
            .update_refresh_token(Uuid::new_v4(), "token")
            .await
            .expect("update");
        assert!(result.is_none());
    }
}
