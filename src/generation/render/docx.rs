//! Structured-document renderer for OOXML (`.docx`) templates.
//!
//! A `.docx` file is a ZIP package. Only the WordprocessingML parts that carry
//! visible text are rewritten; every other entry is copied byte for byte.

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::io::{Cursor, Read, Write};
use std::sync::OnceLock;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{render_template, RenderError};

/// `{{ ... }}` or `{% ... %}` where Word may have inserted run markup between
/// any of the characters, e.g. `{</w:t></w:r><w:r><w:t>{ name }}`. The body
/// never crosses a brace, so a stray `{{` cannot swallow a later tag.
const SPLIT_TAG_PATTERN: &str = concat!(
    r"\{(?:<[^>]*>)*",
    r"(?:\{(?P<expr>(?:[^{}<]|<[^>]*>)*?)\}|%(?P<stmt>(?:[^{}<]|<[^>]*>)*?)%)",
    r"(?:<[^>]*>)*\}"
);
const MARKUP_PATTERN: &str = r"<[^>]*>";
const DELIMITER_PATTERN: &str = r"\{[{%#]";

struct Patterns {
    split_tag: Regex,
    markup: Regex,
    delimiter: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        split_tag: Regex::new(SPLIT_TAG_PATTERN).expect("split tag pattern is valid"),
        markup: Regex::new(MARKUP_PATTERN).expect("markup pattern is valid"),
        delimiter: Regex::new(DELIMITER_PATTERN).expect("delimiter pattern is valid"),
    })
}

/// Parts of the package whose text may contain placeholders.
pub fn is_templated_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    if file.contains('/') || !file.ends_with(".xml") {
        return false;
    }
    file == "document.xml"
        || file == "footnotes.xml"
        || file == "endnotes.xml"
        || file.starts_with("header")
        || file.starts_with("footer")
}

fn crosses_paragraph(body: &str) -> bool {
    body.contains("<w:p>") || body.contains("<w:p ") || body.contains("</w:p>")
}

/// Tag bodies as Word stores them: entity-escaped, sometimes with typographic
/// quotes.
fn unescape_tag_body(body: &str) -> String {
    body.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Turn delimiters that do not open a usable tag into literal output.
fn protect_literal_delimiters(text: &str) -> String {
    patterns()
        .delimiter
        .replace_all(text, |caps: &Captures| format!("{{{{ \"{}\" }}}}", &caps[0]))
        .into_owned()
}

/// Collapse template tags that Word split over several runs into the run that
/// opened them.
///
/// Tags that cross a paragraph boundary, and delimiters without a matching
/// close, are kept as literal text.
pub fn merge_split_tags(xml: &str) -> String {
    let patterns = patterns();
    let mut merged = String::with_capacity(xml.len());
    let mut last = 0;

    for caps in patterns.split_tag.captures_iter(xml) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        merged.push_str(&protect_literal_delimiters(&xml[last..whole.start()]));
        last = whole.end();

        let (open, close, body) = match (caps.name("expr"), caps.name("stmt")) {
            (Some(body), _) => ("{{", "}}", body.as_str()),
            (None, Some(body)) => ("{%", "%}", body.as_str()),
            (None, None) => ("", "", ""),
        };
        if open.is_empty() || crosses_paragraph(body) {
            merged.push_str(&protect_literal_delimiters(whole.as_str()));
            continue;
        }

        let body = patterns.markup.replace_all(body, "");
        merged.push_str(open);
        merged.push_str(&unescape_tag_body(&body));
        merged.push_str(close);
    }

    merged.push_str(&protect_literal_delimiters(&xml[last..]));
    merged
}

/// Evaluate one WordprocessingML part. Output values are XML-escaped.
pub fn render_part(xml: &str, data: &Map<String, Value>) -> Result<String, RenderError> {
    render_template(&merge_split_tags(xml), data, true)
}

/// Render a `.docx` template into a new package.
pub fn render(template: &[u8], data: &Map<String, Value>) -> Result<Vec<u8>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        if !is_templated_part(&name) {
            writer.raw_copy_file(entry)?;
            continue;
        }

        let mut raw = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut raw)?;
        let xml = String::from_utf8(raw).map_err(|_| RenderError::PartEncoding(name.clone()))?;

        writer.start_file(name, options)?;
        writer.write_all(render_part(&xml, data)?.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}
