//! Persistence abstraction for user accounts
//!
//! Handlers only see the [`UserStore`] trait, so a real database can replace
//! the in-memory store without touching the auth core.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill::db::{InMemoryUserStore, UserStore};
//!
//! let store = InMemoryUserStore::new();
//! let user = store.create_user("alice", "a@x.com", &hash).await?;
//! assert_eq!(store.find_user_by_id(user.id).await?, Some(user));
//! ```

use crate::auth::claims::Role;
use crate::types::{Result, UserResponse};
use async_trait::async_trait;

/// User record as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: i64,
}

impl User {
    /// Public view, without the password hash.
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.to_string(),
        }
    }
}

/// Abstract trait for user persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get a user by ID
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Create a new user with the default role.
    ///
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User>;
}
