use crate::auth::claims::Role;
use crate::db::traits::{User, UserStore};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local user store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    next_id: i64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user with an explicit role, for seeding authors and admins.
    pub fn insert_with_role(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User> {
        let mut inner = self.inner.write();

        if inner.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: Utc::now().timestamp(),
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        self.insert_with_role(username, email, password_hash, Role::User)
    }
}
