//! The generation pipeline: schema → validation → dispatch → render
//! (→ PDF) → registry.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::convert::Converter;
use super::dispatch::{dispatch, ArtifactFormat, RenderPlan, TemplateKind};
use super::naming::artifact_name;
use super::registry::{DocumentRegistry, GeneratedDocument};
use super::render::{docx, text, RenderError};
use super::request::GenerationRequest;
use super::schema::{ParameterSpec, SchemaLoader};
use super::store::TemplateStore;
use super::validation::{validate, UnknownTypePolicy};
use super::GenerationError;

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub artifact_path: PathBuf,
    pub file_name: String,
    pub format: ArtifactFormat,
    pub document: GeneratedDocument,
}

pub struct GenerationPipeline {
    loader: SchemaLoader,
    store: Arc<dyn TemplateStore>,
    converter: Arc<dyn Converter>,
    registry: Arc<dyn DocumentRegistry>,
    output_dir: PathBuf,
    unknown_type_policy: UnknownTypePolicy,
}

impl GenerationPipeline {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        converter: Arc<dyn Converter>,
        registry: Arc<dyn DocumentRegistry>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            loader: SchemaLoader::new(store.clone()),
            store,
            converter,
            registry,
            output_dir: output_dir.into(),
            unknown_type_policy: UnknownTypePolicy::default(),
        }
    }

    pub fn with_unknown_type_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_type_policy = policy;
        self
    }

    pub async fn parameters(&self, template_id: &str) -> Result<Vec<ParameterSpec>, GenerationError> {
        self.loader.parameters(template_id).await
    }

    /// Generate one artifact for `owner_id`.
    ///
    /// Nothing is written before the schema, the parameters and the template
    /// resource have all been accepted. The registry row is written last, only
    /// once the artifact exists.
    pub async fn generate(
        &self,
        template_id: &str,
        request: GenerationRequest,
        owner_id: Uuid,
    ) -> Result<GenerationOutcome, GenerationError> {
        let schema = self.loader.load(template_id).await?;
        validate(&request.data, &schema.parameters, self.unknown_type_policy)?;
        let plan = dispatch(&schema.template_resource_name, request.format)?;

        let template = self
            .store
            .template_resource(&schema.template_resource_name)
            .await
            .map_err(GenerationError::Store)?
            .ok_or_else(|| {
                GenerationError::TemplateResourceMissing(schema.template_resource_name.clone())
            })?;

        let format = plan.artifact_format();
        let file_name = artifact_name(template_id, format.extension());
        let artifact_path = self.output_dir.join(&file_name);
        log::info!(
            "Rendering template '{}' ({}) as {}",
            template_id,
            schema.template_resource_name,
            format.as_str()
        );

        match plan.kind {
            TemplateKind::Docx => {
                self.render_docx(template_id, template, request.data, &plan, &artifact_path)
                    .await?
            }
            TemplateKind::Markdown | TemplateKind::Html => {
                self.render_text(template, &request.data, &plan, &artifact_path)
                    .await?
            }
        }

        let document = match self
            .registry
            .record(owner_id, &file_name, request.is_public)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                discard_artifact(&artifact_path).await;
                return Err(e.into());
            }
        };

        log::info!(
            "Generated {} for user {} (document {})",
            file_name,
            owner_id,
            document.id
        );

        Ok(GenerationOutcome {
            artifact_path,
            file_name,
            format,
            document,
        })
    }

    async fn render_docx(
        &self,
        template_id: &str,
        template: Vec<u8>,
        data: Map<String, Value>,
        plan: &RenderPlan,
        artifact_path: &Path,
    ) -> Result<(), GenerationError> {
        let rendered = tokio::task::spawn_blocking(move || docx::render(&template, &data))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;

        if !plan.to_pdf() {
            return write_artifact(artifact_path, &rendered).await;
        }

        // Removed when dropped, whether or not the conversion succeeds.
        let intermediate = tempfile::Builder::new()
            .prefix(&format!("{template_id}_"))
            .suffix(".docx")
            .tempfile_in(&self.output_dir)
            .map_err(GenerationError::WriteArtifact)?;
        tokio::fs::write(intermediate.path(), &rendered)
            .await
            .map_err(GenerationError::WriteArtifact)?;

        if let Err(e) = self
            .converter
            .docx_to_pdf(intermediate.path(), artifact_path)
            .await
        {
            discard_artifact(artifact_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn render_text(
        &self,
        template: Vec<u8>,
        data: &Map<String, Value>,
        plan: &RenderPlan,
        artifact_path: &Path,
    ) -> Result<(), GenerationError> {
        let markdown = plan.kind == TemplateKind::Markdown;
        let html = text::render(template, data, markdown)?;

        if !plan.to_pdf() {
            return write_artifact(artifact_path, html.as_bytes()).await;
        }

        let markup = if markdown {
            text::wrap_html_document(&html)
        } else {
            html
        };
        let pdf = self.converter.html_to_pdf(&markup).await?;
        write_artifact(artifact_path, &pdf).await
    }
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), GenerationError> {
    if let Err(e) = tokio::fs::write(path, bytes).await {
        discard_artifact(path).await;
        return Err(GenerationError::WriteArtifact(e));
    }
    Ok(())
}

async fn discard_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::warn!("Discarded unregistered artifact {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::error!("Failed to discard artifact {}: {}", path.display(), e),
    }
}
