//! Parameter validation against a template schema.
//!
//! Every violation is collected in one pass so the caller sees the whole list
//! at once instead of fixing one field per request.

use serde_json::{Map, Value};
use std::fmt;

use super::dates::is_date_like;
use super::schema::{ParameterSpec, ParameterType};
use super::GenerationError;

/// How parameters with an undeclared type tag are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTypePolicy {
    /// Any value is accepted.
    #[default]
    Permissive,
    /// The parameter is reported as a violation.
    Strict,
}

/// A single parameter violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The parameter that failed validation
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("missing required parameter '{field}'"))
    }

    pub fn type_mismatch(field: &str, expected: &ParameterType, value: &Value) -> Self {
        Self::new(
            field,
            format!(
                "parameter '{field}' must be of type '{expected}' (received: {})",
                json_kind(value)
            ),
        )
    }

    pub fn unknown_type(field: &str, tag: &str) -> Self {
        Self::new(
            field,
            format!("parameter '{field}' declares unsupported type '{tag}'"),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn into_result(self) -> Result<(), GenerationError> {
        if self.is_empty() {
            return Ok(());
        }
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field.as_str()).collect();
        log::debug!("Rejected parameters: {}", fields.join(", "));
        Err(GenerationError::ValidationFailed(self.messages()))
    }
}

/// Check `data` against the declared parameters.
///
/// Absent optional parameters are skipped; no defaults are filled in. Keys in
/// `data` that the schema does not declare are ignored.
pub fn validate(
    data: &Map<String, Value>,
    parameters: &[ParameterSpec],
    policy: UnknownTypePolicy,
) -> Result<(), GenerationError> {
    let mut errors = ValidationErrors::new();

    for param in parameters {
        let Some(value) = data.get(&param.name) else {
            if param.required {
                errors.add(ValidationError::missing(&param.name));
            }
            continue;
        };

        if let ParameterType::Unknown(tag) = &param.param_type {
            if policy == UnknownTypePolicy::Strict {
                errors.add(ValidationError::unknown_type(&param.name, tag));
            }
            continue;
        }

        if !matches_type(value, &param.param_type) {
            errors.add(ValidationError::type_mismatch(
                &param.name,
                &param.param_type,
                value,
            ));
        }
    }

    errors.into_result()
}

/// Kind check by JSON tag: booleans never satisfy numeric types and integers
/// do not satisfy `float`.
pub fn matches_type(value: &Value, expected: &ParameterType) -> bool {
    match expected {
        ParameterType::String => value.is_string(),
        ParameterType::Integer => value.is_i64() || value.is_u64(),
        ParameterType::Float => value.is_f64(),
        ParameterType::Boolean => value.is_boolean(),
        ParameterType::Date => value.as_str().is_some_and(is_date_like),
        ParameterType::Unknown(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name: &str, param_type: ParameterType, required: bool) -> ParameterSpec {
        ParameterSpec {
            name: name.to_string(),
            param_type,
            required,
            description: None,
        }
    }

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn failures(result: Result<(), GenerationError>) -> Vec<String> {
        match result {
            Err(GenerationError::ValidationFailed(messages)) => messages,
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let params = vec![
            spec("name", ParameterType::String, true),
            spec("count", ParameterType::Integer, true),
            spec("amount", ParameterType::Float, true),
            spec("paid", ParameterType::Boolean, true),
            spec("due", ParameterType::Date, true),
        ];
        let request = data(json!({
            "name": "ACME",
            "count": 3,
            "amount": 42.5,
            "paid": false,
            "due": "2024-06-30",
        }));
        assert!(validate(&request, &params, UnknownTypePolicy::Permissive).is_ok());
    }

    #[test]
    fn test_collects_all_violations() {
        let params = vec![
            spec("amount", ParameterType::Float, true),
            spec("customer", ParameterType::String, true),
            spec("due", ParameterType::Date, false),
        ];
        let request = data(json!({ "amount": "not-a-number", "due": "someday" }));

        let messages = failures(validate(&request, &params, UnknownTypePolicy::Permissive));
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            "parameter 'amount' must be of type 'float' (received: string)"
        );
        assert_eq!(messages[1], "missing required parameter 'customer'");
        assert!(messages[2].contains("'due'"));
    }

    #[test]
    fn test_booleans_are_not_numbers() {
        assert!(!matches_type(&json!(true), &ParameterType::Integer));
        assert!(!matches_type(&json!(false), &ParameterType::Float));
        assert!(matches_type(&json!(true), &ParameterType::Boolean));
        assert!(!matches_type(&json!(1), &ParameterType::Boolean));
    }

    #[test]
    fn test_numeric_kinds_must_match() {
        assert!(matches_type(&json!(7), &ParameterType::Integer));
        assert!(!matches_type(&json!(7.5), &ParameterType::Integer));
        assert!(matches_type(&json!(7.5), &ParameterType::Float));
        assert!(!matches_type(&json!(7), &ParameterType::Float));
        assert!(!matches_type(&json!("7"), &ParameterType::Integer));
    }

    #[test]
    fn test_date_requires_parseable_text() {
        assert!(matches_type(&json!("2024-01-31"), &ParameterType::Date));
        assert!(!matches_type(&json!("31st of never"), &ParameterType::Date));
        assert!(!matches_type(&json!(20240131), &ParameterType::Date));
    }

    #[test]
    fn test_optional_absent_is_skipped() {
        let params = vec![spec("note", ParameterType::String, false)];
        assert!(validate(&Map::new(), &params, UnknownTypePolicy::Permissive).is_ok());
    }

    #[test]
    fn test_null_does_not_satisfy_required_string() {
        let params = vec![spec("note", ParameterType::String, true)];
        let messages = failures(validate(
            &data(json!({ "note": null })),
            &params,
            UnknownTypePolicy::Permissive,
        ));
        assert_eq!(
            messages,
            vec!["parameter 'note' must be of type 'string' (received: null)".to_string()]
        );
    }

    #[test]
    fn test_unknown_type_policy() {
        let params = vec![spec(
            "logo",
            ParameterType::Unknown("image".to_string()),
            true,
        )];
        let request = data(json!({ "logo": 12 }));

        assert!(validate(&request, &params, UnknownTypePolicy::Permissive).is_ok());

        let messages = failures(validate(&request, &params, UnknownTypePolicy::Strict));
        assert_eq!(
            messages,
            vec!["parameter 'logo' declares unsupported type 'image'".to_string()]
        );
    }

    #[test]
    fn test_unknown_type_still_requires_presence() {
        let params = vec![spec(
            "logo",
            ParameterType::Unknown("image".to_string()),
            true,
        )];
        let messages = failures(validate(&Map::new(), &params, UnknownTypePolicy::Permissive));
        assert_eq!(messages, vec!["missing required parameter 'logo'".to_string()]);
    }
}
