//! User persistence behind the identity endpoints.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::model::User;

#[derive(Debug, thiserror::Error)]
pub enum AuthStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email '{0}' is already registered")]
    EmailTaken(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AuthStoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthStoreError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthStoreError>;
}

/// Process-local user store, used when no database is configured.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AuthStoreError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == email) {
            return Err(AuthStoreError::EmailTaken(email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthStoreError> {
        Ok(self.users.read().values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthStoreError> {
        Ok(self.users.read().get(&id).cloned())
    }
}
