//! Generated-document registry on Postgres

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::generation::registry::{DocumentRegistry, GeneratedDocument, RegistryError};

pub struct PgDocumentRegistry {
    pool: PgPool,
}

impl PgDocumentRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRegistry for PgDocumentRegistry {
    async fn record(
        &self,
        owner_id: Uuid,
        file_name: &str,
        is_public: bool,
    ) -> Result<GeneratedDocument, RegistryError> {
        let result = sqlx::query_as::<_, GeneratedDocument>(
            r#"
            INSERT INTO documents (owner_id, file_name, is_public)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, file_name, created_at, is_public
            "#,
        )
        .bind(owner_id)
        .bind(file_name)
        .bind(is_public)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(document) => Ok(document),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RegistryError::Duplicate(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<GeneratedDocument>, RegistryError> {
        let documents = sqlx::query_as::<_, GeneratedDocument>(
            r#"
            SELECT id, owner_id, file_name, created_at, is_public
            FROM documents
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }
}
