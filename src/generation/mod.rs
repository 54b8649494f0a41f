//! Template-driven document generation.
//!
//! A generation resolves a template schema, validates the caller's data
//! against it, picks a renderer from the template resource's extension and the
//! requested output format, writes a uniquely named artifact and records it in
//! the document registry:
//! - `schema` / `store` - schema loading and the template store behind it
//! - `validation` - parameter checks against the declared schema
//! - `dispatch` - extension + format to render plan
//! - `render` - structured-document (DOCX) and text-template renderers
//! - `convert` - PDF conversion backends
//! - `naming` - collision-free artifact names
//! - `registry` - generated-document records
//! - `pipeline` - the orchestration of all of the above

pub mod convert;
pub mod dates;
pub mod dispatch;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod request;
pub mod schema;
pub mod store;
pub mod validation;

pub use convert::{CommandConverter, ConversionError, Converter, GotenbergConverter};
pub use dispatch::{ArtifactFormat, RenderPlan, TemplateKind};
pub use pipeline::{GenerationOutcome, GenerationPipeline};
pub use registry::{DocumentRegistry, GeneratedDocument, InMemoryDocumentRegistry, RegistryError};
pub use render::RenderError;
pub use request::{GenerationRequest, OutputFormat};
pub use schema::{ParameterSpec, ParameterType, SchemaLoader, TemplateSchema};
pub use store::{FsTemplateStore, TemplateStore};

use actix_web::HttpResponse;
use thiserror::Error;

use crate::ErrorResponse;

/// Errors that can occur while generating a document.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("template '{0}' does not exist")]
    SchemaNotFound(String),
    #[error("schema for template '{template_id}' is invalid: {reason}")]
    InvalidSchema { template_id: String, reason: String },
    #[error("{}", .0.join(" | "))]
    ValidationFailed(Vec<String>),
    #[error("unsupported output format '{0}' (expected 'native' or 'pdf')")]
    UnsupportedOutputFormat(String),
    #[error("template resource '{0}' was not found")]
    TemplateResourceMissing(String),
    #[error("unsupported template format '{0}'")]
    UnsupportedTemplateFormat(String),
    #[error("document rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("PDF conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),
    #[error("template store error: {0}")]
    Store(#[source] std::io::Error),
    #[error("failed to write artifact: {0}")]
    WriteArtifact(#[source] std::io::Error),
    #[error("failed to record generated document: {0}")]
    Registry(#[from] RegistryError),
}

impl From<GenerationError> for HttpResponse {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::SchemaNotFound(_) | GenerationError::TemplateResourceMissing(_) => {
                HttpResponse::NotFound().json(ErrorResponse::not_found(&error.to_string()))
            }
            GenerationError::ValidationFailed(_)
            | GenerationError::UnsupportedOutputFormat(_)
            | GenerationError::UnsupportedTemplateFormat(_) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
            }
            GenerationError::ConversionFailed(_) => {
                log::error!("Document conversion failed: {}", error);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Document conversion failed"))
            }
            _ => {
                log::error!("Document generation failed: {}", error);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Document generation failed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_validation_failed_joins_all_messages() {
        let error = GenerationError::ValidationFailed(vec![
            "missing required parameter 'amount'".to_string(),
            "parameter 'due' must be of type 'date' (received: integer)".to_string(),
        ]);
        assert_eq!(
            error.to_string(),
            "missing required parameter 'amount' | parameter 'due' must be of type 'date' (received: integer)"
        );
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (GenerationError::SchemaNotFound("ghost".into()), StatusCode::NOT_FOUND),
            (
                GenerationError::TemplateResourceMissing("invoice.docx".into()),
                StatusCode::NOT_FOUND,
            ),
            (GenerationError::ValidationFailed(vec![]), StatusCode::BAD_REQUEST),
            (
                GenerationError::UnsupportedTemplateFormat(".odt".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                GenerationError::UnsupportedOutputFormat("rtf".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                GenerationError::ConversionFailed(ConversionError::Exit {
                    program: "soffice".into(),
                    code: 1,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GenerationError::InvalidSchema {
                    template_id: "invoice".into(),
                    reason: "bad yaml".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response: HttpResponse = error.into();
            assert_eq!(response.status(), expected);
        }
    }
}
