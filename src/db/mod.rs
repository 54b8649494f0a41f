//! Database module - AppState and the Postgres-backed stores
//!
//! - `documents` - generated-document registry
//! - `users` - user accounts for the identity endpoints

mod documents;
mod users;

pub use documents::PgDocumentRegistry;
pub use users::PgUserStore;

use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::store::{InMemoryUserStore, UserStore};
use crate::config::{Directories, JwtConfig, Settings};
use crate::generation::convert::{build_converter, Converter};
use crate::generation::registry::{DocumentRegistry, InMemoryDocumentRegistry};
use crate::generation::store::{FsTemplateStore, TemplateStore};
use crate::generation::validation::UnknownTypePolicy;
use crate::generation::GenerationPipeline;

const SCHEMA_SQL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id BIGSERIAL PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(id),
        file_name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        is_public BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_owner_id_idx ON documents (owner_id)",
];

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<GenerationPipeline>,
    pub templates: Arc<dyn TemplateStore>,
    pub documents: Arc<dyn DocumentRegistry>,
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtConfig,
}

impl AppState {
    /// Build the application state from settings: prepares directories,
    /// connects to Postgres when `DATABASE_URL` is set and wires the pipeline.
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings
            .directories
            .init()
            .context("failed to prepare template and output directories")?;

        let converter = build_converter(&settings.converter, settings.conversion_timeout);

        let (documents, users): (Arc<dyn DocumentRegistry>, Arc<dyn UserStore>) =
            match &settings.database_url {
                Some(database_url) => {
                    let pool = connect(database_url).await?;
                    ensure_schema(&pool).await?;
                    (
                        Arc::new(PgDocumentRegistry::new(pool.clone())),
                        Arc::new(PgUserStore::new(pool)),
                    )
                }
                None => {
                    log::warn!(
                        "DATABASE_URL not set, users and generated documents are kept in memory only"
                    );
                    (
                        Arc::new(InMemoryDocumentRegistry::new()),
                        Arc::new(InMemoryUserStore::new()),
                    )
                }
            };

        Ok(Self::with_stores(
            &settings.directories,
            converter,
            documents,
            users,
            settings.jwt.clone(),
            settings.unknown_type_policy,
        ))
    }

    pub fn with_stores(
        directories: &Directories,
        converter: Arc<dyn Converter>,
        documents: Arc<dyn DocumentRegistry>,
        users: Arc<dyn UserStore>,
        jwt: JwtConfig,
        unknown_type_policy: UnknownTypePolicy,
    ) -> Self {
        let templates: Arc<dyn TemplateStore> = Arc::new(FsTemplateStore::new(
            directories.schema_dir.clone(),
            directories.template_dir.clone(),
        ));

        let pipeline = GenerationPipeline::new(
            templates.clone(),
            converter,
            documents.clone(),
            directories.output_dir.clone(),
        )
        .with_unknown_type_policy(unknown_type_policy);

        AppState {
            pipeline: Arc::new(pipeline),
            templates,
            documents,
            users,
            jwt,
        }
    }
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(900))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("failed to connect to database")?;
    Ok(pool)
}

/// Create the tables this service owns if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA_SQL {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to create database schema")?;
    }
    log::info!("Database schema ready");
    Ok(())
}
