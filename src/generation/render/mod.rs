//! Renderers for structured documents and text templates.
//!
//! Both renderers evaluate Jinja-style templates: `{{ expr }}` output with
//! dotted paths and filters, plus `{% if %}` / `{% for %}` blocks. Unknown
//! names render as an empty string.

pub mod docx;
pub mod text;

use minijinja::value::ValueKind;
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template resource is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("template could not be evaluated: {0}")]
    Template(#[from] minijinja::Error),
    #[error("structured document package is invalid: {0}")]
    Package(#[from] zip::result::ZipError),
    #[error("document part '{0}' is not valid UTF-8")]
    PartEncoding(String),
    #[error("structured document I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("render task failed: {0}")]
    Task(String),
}

/// Text form of an output value. `none` and undefined print nothing; lists
/// and maps print as compact JSON.
fn display_value(value: &minijinja::Value) -> String {
    if value.is_undefined() || value.is_none() {
        return String::new();
    }
    match value.kind() {
        ValueKind::Seq | ValueKind::Map => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
        _ => value.to_string(),
    }
}

fn environment(escape: bool) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_formatter(move |out, _state, value| {
        let text = display_value(value);
        let text = if escape && !value.is_safe() {
            escape_markup(&text)
        } else {
            text
        };
        out.write_str(&text)
            .map_err(|_| minijinja::Error::new(ErrorKind::WriteFailure, "could not write rendered value"))
    });
    env
}

/// Evaluate `source` against the request data. Output values are
/// markup-escaped when `escape` is set, unless marked `| safe`.
pub(crate) fn render_template(
    source: &str,
    data: &Map<String, Value>,
    escape: bool,
) -> Result<String, RenderError> {
    Ok(environment(escape).render_str(source, data)?)
}

/// Escape for XML text nodes and HTML bodies alike.
pub(crate) fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
