//! User account operations for authentication

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::model::User;
use crate::auth::store::{AuthStoreError, UserStore};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AuthStoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AuthStoreError::EmailTaken(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthStoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_active, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthStoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
