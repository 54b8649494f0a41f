//! Text-template renderer for Markdown and HTML sources.

use pulldown_cmark::{html, Options, Parser};
use serde_json::{Map, Value};

use super::{render_template, RenderError};

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Wrap an HTML fragment into a standalone UTF-8 document for PDF engines.
pub fn wrap_html_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Render a text template to HTML. Markdown sources are evaluated with
/// verbatim values and then translated; HTML sources get escaped values.
pub fn render(template: Vec<u8>, data: &Map<String, Value>, markdown: bool) -> Result<String, RenderError> {
    let source = String::from_utf8(template)?;
    if markdown {
        Ok(markdown_to_html(&render_template(&source, data, false)?))
    } else {
        render_template(&source, data, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_spacing_and_paths() {
        let values = data(json!({ "name": "Ana", "order": { "id": 17 } }));
        let out = render(
            b"Hi {{name}}, order {{ order.id }} {{  missing  }}.".to_vec(),
            &values,
            false,
        )
        .unwrap();
        assert_eq!(out, "Hi Ana, order 17 .");
    }

    #[test]
    fn test_html_blocks_and_filters() {
        let values = data(json!({
            "paid": false,
            "lines": [{ "item": "Tea & cake", "qty": 2 }, { "item": "Jam", "qty": 1 }],
            "name": "ana"
        }));
        let html = render(
            concat!(
                "<h1>{{ name | title }}</h1>",
                "{% if paid %}<p>Paid</p>{% else %}<p>Due</p>{% endif %}",
                "<ul>{% for line in lines %}<li>{{ line.qty }} x {{ line.item }}</li>{% endfor %}</ul>"
            )
            .as_bytes()
            .to_vec(),
            &values,
            false,
        )
        .unwrap();
        assert_eq!(
            html,
            "<h1>Ana</h1><p>Due</p><ul><li>2 x Tea &amp; cake</li><li>1 x Jam</li></ul>"
        );
    }

    #[test]
    fn test_markdown_loop_renders_list() {
        let values = data(json!({ "items": ["one", "two"] }));
        let html = render(
            b"{% for i in items %}\n- {{ i | upper }}{% endfor %}\n".to_vec(),
            &values,
            true,
        )
        .unwrap();
        assert!(html.contains("<li>ONE</li>"));
        assert!(html.contains("<li>TWO</li>"));
    }

    #[test]
    fn test_malformed_template_is_an_error() {
        let err = render(b"{{ }}".to_vec(), &Map::new(), false).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn test_markdown_renders_to_html() {
        let values = data(json!({ "title": "Invoice", "amount": 42.5 }));
        let html = render(
            b"# {{ title }}\n\n**Total:** {{ amount }}\n\n- one\n- two\n".to_vec(),
            &values,
            true,
        )
        .unwrap();

        assert!(html.contains("<h1>Invoice</h1>"));
        assert!(html.contains("<strong>Total:</strong> 42.5"));
        assert!(html.contains("<li>one</li>"));
        assert!(!html.contains('#'));
        assert!(!html.contains("**"));
    }

    #[test]
    fn test_html_values_are_escaped() {
        let values = data(json!({ "note": "<script>alert(1)</script>" }));
        let html = render(b"<p>{{ note }}</p>".to_vec(), &values, false).unwrap();
        assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = render(vec![0xff, 0xfe], &Map::new(), false).unwrap_err();
        assert!(matches!(err, RenderError::Encoding(_)));
    }

    #[test]
    fn test_wrap_document() {
        let doc = wrap_html_document("<p>x</p>\n");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("charset=\"utf-8\""));
        assert!(doc.contains("<body>\n<p>x</p>\n</body>"));
    }
}
