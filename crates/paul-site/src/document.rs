//! The HTML document shell every page is rendered into.

use minijinja::context;
use paul_components::template_env;

use crate::{PageMeta, SiteError};

const TEMPLATE_NAME: &str = "document.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ meta.lang }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ meta.title }}</title>
  <meta name="description" content="{{ meta.description }}">
{%- for name, content in meta.extra|items %}
  <meta name="{{ name }}" content="{{ content }}">
{%- endfor %}
{%- if css %}
  <style>
{{ css|safe }}
  </style>
{%- endif %}
{%- for fragment in head %}
  {{ fragment|safe }}
{%- endfor %}
</head>
<body>
  <div id="paul-root">{{ body|safe }}</div>
{%- for fragment in body_end %}
  {{ fragment|safe }}
{%- endfor %}
</body>
</html>
"#;

/// Trusted fragments added to a rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentExtras {
    /// Appended to `<head>`.
    pub head: Vec<String>,
    /// Appended to the end of `<body>`.
    pub body: Vec<String>,
}

pub(crate) fn render_document(
    meta: &PageMeta,
    css: &str,
    body: &str,
    extras: &DocumentExtras,
) -> Result<String, SiteError> {
    let mut env = template_env();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;
    let html = env.get_template(TEMPLATE_NAME)?.render(context! {
        meta => meta,
        css => css,
        body => body,
        head => &extras.head,
        body_end => &extras.body,
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_is_escaped() {
        let meta = PageMeta {
            title: "Tom & Jerry <3".to_owned(),
            description: "\"quoted\"".to_owned(),
            ..PageMeta::default()
        };

        let html = render_document(&meta, "", "", &DocumentExtras::default()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Tom &amp; Jerry &lt;3</title>"));
        assert!(html.contains("content=\"&quot;quoted&quot;\""));
        assert!(html.contains("<html lang=\"en\">"));
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn test_body_css_and_extras_are_verbatim() {
        let mut meta = PageMeta::default();
        meta.extra.insert("robots".to_owned(), "noindex".to_owned());
        let extras = DocumentExtras {
            head: vec!["<link rel=\"icon\" href=\"/favicon.ico\">".to_owned()],
            body: vec!["<script src=\"/__paul/live-reload.js\"></script>".to_owned()],
        };

        let html = render_document(&meta, "a > b { color: red; }", "<section>x</section>", &extras)
            .unwrap();

        assert!(html.contains("<meta name=\"robots\" content=\"noindex\">"));
        assert!(html.contains("a > b { color: red; }"));
        assert!(html.contains("<div id=\"paul-root\"><section>x</section></div>"));
        assert!(html.contains("<link rel=\"icon\" href=\"/favicon.ico\">"));
        let script = html.find("live-reload.js").unwrap();
        assert!(script > html.find("paul-root").unwrap());
    }
}
