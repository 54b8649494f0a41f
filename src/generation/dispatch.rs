//! Renderer selection. Purely extension-driven: the resource's content is
//! never inspected.

use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

use super::request::OutputFormat;
use super::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Docx,
    Markdown,
    Html,
}

/// Format of the artifact handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Docx,
    Html,
    Pdf,
}

impl ArtifactFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFormat::Docx => "docx",
            ArtifactFormat::Html => "html",
            ArtifactFormat::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Docx => ".docx",
            ArtifactFormat::Html => ".html",
            ArtifactFormat::Pdf => ".pdf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    pub kind: TemplateKind,
    pub format: OutputFormat,
}

impl RenderPlan {
    pub fn to_pdf(&self) -> bool {
        self.format == OutputFormat::Pdf
    }

    pub fn artifact_format(&self) -> ArtifactFormat {
        match (self.kind, self.format) {
            (_, OutputFormat::Pdf) => ArtifactFormat::Pdf,
            (TemplateKind::Docx, OutputFormat::Native) => ArtifactFormat::Docx,
            (TemplateKind::Markdown | TemplateKind::Html, OutputFormat::Native) => {
                ArtifactFormat::Html
            }
        }
    }
}

pub fn dispatch(resource_name: &str, format: OutputFormat) -> Result<RenderPlan, GenerationError> {
    let extension = Path::new(resource_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let kind = match extension.as_str() {
        "docx" => TemplateKind::Docx,
        "md" => TemplateKind::Markdown,
        "html" => TemplateKind::Html,
        _ => {
            return Err(GenerationError::UnsupportedTemplateFormat(format!(
                ".{extension}"
            )))
        }
    };

    Ok(RenderPlan { kind, format })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        let plan = dispatch("invoice.docx", OutputFormat::Native).unwrap();
        assert_eq!(plan.kind, TemplateKind::Docx);
        assert_eq!(plan.artifact_format(), ArtifactFormat::Docx);

        let plan = dispatch("invoice.DOCX", OutputFormat::Pdf).unwrap();
        assert_eq!(plan.kind, TemplateKind::Docx);
        assert!(plan.to_pdf());
        assert_eq!(plan.artifact_format(), ArtifactFormat::Pdf);

        let plan = dispatch("letter.md", OutputFormat::Native).unwrap();
        assert_eq!(plan.kind, TemplateKind::Markdown);
        assert_eq!(plan.artifact_format().extension(), ".html");

        let plan = dispatch("page.html", OutputFormat::Pdf).unwrap();
        assert_eq!(plan.kind, TemplateKind::Html);
        assert_eq!(plan.artifact_format().as_str(), "pdf");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = dispatch("sheet.odt", OutputFormat::Native).unwrap_err();
        assert!(matches!(err, GenerationError::UnsupportedTemplateFormat(ext) if ext == ".odt"));

        let err = dispatch("README", OutputFormat::Native).unwrap_err();
        assert!(matches!(err, GenerationError::UnsupportedTemplateFormat(_)));
    }
}
