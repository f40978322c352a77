//! Postgres user store.
//!
//! Expects a `users` table with unique indexes on `email`, `username`, and
//! `refresh_token`:
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     username      TEXT NOT NULL UNIQUE,
//!     email         TEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     salt          TEXT NOT NULL,
//!     refresh_token TEXT UNIQUE,
//!     birth_date    TEXT NOT NULL
//! );
//! ```
//!
//! The indexes carry the uniqueness invariant; this adapter only translates
//! the conflict signal.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::UserStore;
use crate::error::StoreError;
use crate::user::User;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by(&self, query: &str, value: &str) -> Result<Option<User>, StoreError> {
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;
        Ok(row.map(row_to_user))
    }
}

fn row_to_user(row: PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        salt: row.get("salt"),
        refresh_token: row.get("refresh_token"),
        birth_date: row.get("birth_date"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, salt, refresh_token, birth_date";

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query =
            "SELECT id, username, email, password_hash, salt, refresh_token, birth_date \
             FROM users WHERE email = $1 LIMIT 1";
        self.find_by(query, email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query =
            "SELECT id, username, email, password_hash, salt, refresh_token, birth_date \
             FROM users WHERE username = $1 LIMIT 1";
        self.find_by(query, username).await
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let query =
            "SELECT id, username, email, password_hash, salt, refresh_token, birth_date \
             FROM users WHERE refresh_token = $1 LIMIT 1";
        self.find_by(query, token).await
    }

    async fn create(&self, user: User) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.salt)
            .bind(&user.refresh_token)
            .bind(&user.birth_date)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(row_to_user(row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(StoreError::Backend(
                anyhow::Error::new(err).context("failed to insert user"),
            )),
        }
    }

    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        // Single statement: the read-modify-write is atomic per row.
        let query = format!(
            "UPDATE users SET refresh_token = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update refresh token")?;
        Ok(row.map(row_to_user))
    }
}

#[cfg(test)]
mod tests {
    use super::is_unique_violation;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
