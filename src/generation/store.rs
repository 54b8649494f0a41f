//! Template store: schema documents keyed by template id and template
//! resources keyed by file name.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Raw YAML schema for `template_id`, `None` when there is none.
    async fn schema_source(&self, template_id: &str) -> io::Result<Option<String>>;

    /// Raw bytes of the template resource `name`, `None` when absent.
    async fn template_resource(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    async fn put_schema(&self, template_id: &str, source: &str) -> io::Result<()>;

    async fn put_template_resource(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Directory-backed store: `<schema_dir>/<template_id>.yaml` and
/// `<template_dir>/<name>`.
pub struct FsTemplateStore {
    schema_dir: PathBuf,
    template_dir: PathBuf,
}

impl FsTemplateStore {
    pub fn new(schema_dir: impl Into<PathBuf>, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            template_dir: template_dir.into(),
        }
    }

    fn schema_path(&self, template_id: &str) -> PathBuf {
        self.schema_dir.join(format!("{template_id}.yaml"))
    }
}

async fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn schema_source(&self, template_id: &str) -> io::Result<Option<String>> {
        match read_optional(&self.schema_path(template_id)).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }

    async fn template_resource(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        read_optional(&self.template_dir.join(name)).await
    }

    async fn put_schema(&self, template_id: &str, source: &str) -> io::Result<()> {
        let path = self.schema_path(template_id);
        tokio::fs::write(&path, source).await?;
        log::info!("Schema '{}' stored at {}", template_id, path.display());
        Ok(())
    }

    async fn put_template_resource(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.template_dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        log::info!("Template resource stored at {}", path.display());
        Ok(())
    }
}
