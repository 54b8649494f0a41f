use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::generation::{ArtifactFormat, GeneratedDocument, GenerationOutcome};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenerateQuery {
    /// Mark the generated document as public.
    pub public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub message: String,
    pub artifact_path: String,
    pub file_name: String,
    pub format: ArtifactFormat,
    pub document: GeneratedDocument,
}

impl From<GenerationOutcome> for GenerateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            message: "Document generated successfully".to_string(),
            artifact_path: outcome.artifact_path.display().to_string(),
            file_name: outcome.file_name,
            format: outcome.format,
            document: outcome.document,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadSchemaResponse {
    pub template_id: String,
    pub template_name: String,
    pub parameter_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResourceResponse {
    pub file_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadSchemaRequest {
    #[allow(unused)]
    pub template_id: String,
    #[allow(unused)]
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadResourceRequest {
    #[allow(unused)]
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
