use serde_json::{Map, Value};

use super::GenerationError;

/// Key in the request body that selects the output format.
pub const FORMAT_KEY: &str = "format";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The template's own output (DOCX for DOCX templates, HTML for text templates).
    #[default]
    Native,
    Pdf,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "native" | "docx" | "html" | "md" => Ok(OutputFormat::Native),
            _ => Err(GenerationError::UnsupportedOutputFormat(raw.to_string())),
        }
    }
}

/// Caller input for one generation. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub data: Map<String, Value>,
    pub format: OutputFormat,
    pub is_public: bool,
}

impl GenerationRequest {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Split a request body into parameter data and the `format` selector.
    pub fn from_body(mut body: Map<String, Value>, is_public: bool) -> Result<Self, GenerationError> {
        let format = match body.remove(FORMAT_KEY) {
            None | Some(Value::Null) => OutputFormat::Native,
            Some(Value::String(raw)) => OutputFormat::parse(&raw)?,
            Some(other) => {
                return Err(GenerationError::UnsupportedOutputFormat(other.to_string()))
            }
        };

        Ok(Self {
            data: body,
            format,
            is_public,
        })
    }
}
