//! Template schemas: the declared parameter contract of each template.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use utoipa::ToSchema;

use super::request::FORMAT_KEY;
use super::store::TemplateStore;
use super::GenerationError;

/// Declared type of a template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
    /// A tag the validator does not know about.
    Unknown(String),
}

impl From<String> for ParameterType {
    fn from(tag: String) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => ParameterType::String,
            "integer" | "int" => ParameterType::Integer,
            "float" => ParameterType::Float,
            "boolean" | "bool" => ParameterType::Boolean,
            "date" => ParameterType::Date,
            _ => ParameterType::Unknown(tag),
        }
    }
}

impl From<ParameterType> for String {
    fn from(param_type: ParameterType) -> Self {
        param_type.to_string()
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::String => f.write_str("string"),
            ParameterType::Integer => f.write_str("integer"),
            ParameterType::Float => f.write_str("float"),
            ParameterType::Boolean => f.write_str("boolean"),
            ParameterType::Date => f.write_str("date"),
            ParameterType::Unknown(tag) => f.write_str(tag),
        }
    }
}

/// One declared parameter of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParameterSpec {
    #[schema(example = "amount")]
    pub name: String,
    #[serde(rename = "type", default)]
    #[schema(value_type = String, example = "float")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// On-disk shape of a schema document.
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    template_name: String,
    #[serde(default)]
    parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSchema {
    pub template_id: String,
    pub template_resource_name: String,
    pub parameters: Vec<ParameterSpec>,
}

impl TemplateSchema {
    /// Parse a YAML schema document for `template_id`.
    pub fn parse(template_id: &str, source: &str) -> Result<Self, GenerationError> {
        let invalid = |reason: String| GenerationError::InvalidSchema {
            template_id: template_id.to_string(),
            reason,
        };

        let document: SchemaDocument =
            serde_yaml::from_str(source).map_err(|e| invalid(e.to_string()))?;

        if !is_bare_file_name(&document.template_name) {
            return Err(invalid(format!(
                "template_name '{}' must be a plain file name",
                document.template_name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for param in &document.parameters {
            if param.name == FORMAT_KEY {
                return Err(invalid(format!(
                    "parameter name '{FORMAT_KEY}' is reserved for output format selection"
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(invalid(format!("parameter '{}' is declared twice", param.name)));
            }
        }

        Ok(Self {
            template_id: template_id.to_string(),
            template_resource_name: document.template_name,
            parameters: document.parameters,
        })
    }
}

/// Template ids are used as file stems, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_valid_template_id(template_id: &str) -> bool {
    !template_id.is_empty()
        && template_id.len() <= 128
        && template_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_bare_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
        && sanitize_filename::sanitize(name) == name
}

/// Resolves template ids to their schemas. Nothing is cached: each call reads
/// the store again.
#[derive(Clone)]
pub struct SchemaLoader {
    store: Arc<dyn TemplateStore>,
}

impl SchemaLoader {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, template_id: &str) -> Result<TemplateSchema, GenerationError> {
        if !is_valid_template_id(template_id) {
            return Err(GenerationError::SchemaNotFound(template_id.to_string()));
        }

        let source = self
            .store
            .schema_source(template_id)
            .await
            .map_err(GenerationError::Store)?
            .ok_or_else(|| GenerationError::SchemaNotFound(template_id.to_string()))?;

        TemplateSchema::parse(template_id, &source)
    }

    /// Parameter manifest of a template, for clients building an input form.
    pub async fn parameters(&self, template_id: &str) -> Result<Vec<ParameterSpec>, GenerationError> {
        Ok(self.load(template_id).await?.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &str = r#"
template_name: invoice.docx
parameters:
  - name: amount
    type: float
    required: true
  - name: customer
  - name: paid
    type: bool
  - name: due
    type: Date
    description: Payment due date
  - name: logo
    type: image
"#;

    #[test]
    fn test_parse_schema() {
        let schema = TemplateSchema::parse("invoice", INVOICE).unwrap();
        assert_eq!(schema.template_id, "invoice");
        assert_eq!(schema.template_resource_name, "invoice.docx");

        let types: Vec<_> = schema.parameters.iter().map(|p| p.param_type.clone()).collect();
        assert_eq!(
            types,
            vec![
                ParameterType::Float,
                ParameterType::String,
                ParameterType::Boolean,
                ParameterType::Date,
                ParameterType::Unknown("image".to_string()),
            ]
        );
        assert!(schema.parameters[0].required);
        assert!(!schema.parameters[1].required);
        assert_eq!(
            schema.parameters[3].description.as_deref(),
            Some("Payment due date")
        );
    }

    #[test]
    fn test_parameter_type_serializes_canonical_tag() {
        let spec = ParameterSpec {
            name: "count".to_string(),
            param_type: ParameterType::from("int".to_string()),
            required: true,
            description: None,
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "integer");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_parse_rejects_path_in_template_name() {
        let source = "template_name: ../secrets/invoice.docx\nparameters: []\n";
        let err = TemplateSchema::parse("invoice", source).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidSchema { .. }));
    }

    #[test]
    fn test_parse_rejects_reserved_format_parameter() {
        let source = "template_name: a.md\nparameters:\n  - name: format\n    required: true\n";
        let err = TemplateSchema::parse("a", source).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidSchema { .. }));
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_parse_rejects_duplicate_parameter() {
        let source = "template_name: a.md\nparameters:\n  - name: x\n  - name: x\n";
        let err = TemplateSchema::parse("a", source).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_parse_rejects_missing_template_name() {
        let err = TemplateSchema::parse("a", "parameters: []\n").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidSchema { .. }));
    }

    #[test]
    fn test_template_id_charset() {
        assert!(is_valid_template_id("invoice_v2-final"));
        assert!(!is_valid_template_id(""));
        assert!(!is_valid_template_id("../etc/passwd"));
        assert!(!is_valid_template_id("a b"));
    }
}
