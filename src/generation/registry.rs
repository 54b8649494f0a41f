//! Registry of generated documents. Append-only: records are created once
//! per successful generation and never updated here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct GeneratedDocument {
    #[schema(example = 1)]
    pub id: i64,
    pub owner_id: Uuid,
    #[schema(example = "invoice_0b6b6f2e-3d0a-4b7f-9a55-5d1c7c8f8f11.pdf")]
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("a document named '{0}' is already registered")]
    Duplicate(String),
}

#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    /// Append one record for a fully written artifact.
    async fn record(
        &self,
        owner_id: Uuid,
        file_name: &str,
        is_public: bool,
    ) -> Result<GeneratedDocument, RegistryError>;

    /// Documents owned by `owner_id`, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<GeneratedDocument>, RegistryError>;
}

/// Process-local registry, used when no database is configured.
#[derive(Default)]
pub struct InMemoryDocumentRegistry {
    documents: Mutex<Vec<GeneratedDocument>>,
}

impl InMemoryDocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }

    pub fn all(&self) -> Vec<GeneratedDocument> {
        self.documents.lock().clone()
    }
}

#[async_trait]
impl DocumentRegistry for InMemoryDocumentRegistry {
    async fn record(
        &self,
        owner_id: Uuid,
        file_name: &str,
        is_public: bool,
    ) -> Result<GeneratedDocument, RegistryError> {
        let mut documents = self.documents.lock();
        if documents.iter().any(|d| d.file_name == file_name) {
            return Err(RegistryError::Duplicate(file_name.to_string()));
        }

        let document = GeneratedDocument {
            id: documents.len() as i64 + 1,
            owner_id,
            file_name: file_name.to_string(),
            created_at: Utc::now(),
            is_public,
        };
        documents.push(document.clone());
        Ok(document)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<GeneratedDocument>, RegistryError> {
        let documents = self.documents.lock();
        Ok(documents
            .iter()
            .rev()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
