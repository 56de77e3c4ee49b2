//! Static app generation.
//!
//! Turns a validated task into the ordered file list the publisher commits:
//! `index.html`, `style.css`, `app.js`, `README.md`, then one
//! `assets/<name>` per attachment. Output depends only on the input; nothing
//! here reads the clock or a random source.

use crate::attachment::{self, DecodedAttachment};
use crate::error::Result;
use crate::types::TaskRequest;
use std::fmt::Write as _;

pub const ASSETS_DIR: &str = "assets";

/// Longest inline text attachment rendered as a preview on the index page.
const PREVIEW_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl GeneratedFile {
    fn text(path: impl Into<String>, content: String) -> Self {
        Self {
            path: path.into(),
            content: content.into_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedApp {
    pub files: Vec<GeneratedFile>,
}

impl GeneratedApp {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter()
    }
}

/// Build the static site for `task`.
pub fn generate(task: &TaskRequest) -> Result<GeneratedApp> {
    let assets = attachment::decode_all(&task.attachments)?;

    let mut files = vec![
        GeneratedFile::text("index.html", index_html(task, &assets)),
        GeneratedFile::text("style.css", STYLE_CSS.to_string()),
        GeneratedFile::text("app.js", app_js(&assets)),
        GeneratedFile::text("README.md", readme(task, &assets)),
    ];
    files.extend(assets.into_iter().map(|a| GeneratedFile {
        path: format!("{ASSETS_DIR}/{}", a.name),
        content: a.bytes,
    }));

    Ok(GeneratedApp { files })
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

const STYLE_CSS: &str = r#"body {
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  max-width: 48rem;
  margin: 2rem auto;
  padding: 0 1rem;
  line-height: 1.5;
  color: #1f2328;
}
h1 { font-size: 1.6rem; }
.brief { padding: .75rem 1rem; background: #f6f8fa; border-radius: 6px; }
pre { background: #f6f8fa; padding: .75rem; overflow-x: auto; white-space: pre-wrap; }
#view img { max-width: 400px; display: block; margin-top: .5rem; }
ul.assets li { margin: .25rem 0; }
"#;

fn index_html(task: &TaskRequest, assets: &[DecodedAttachment]) -> String {
    let title = html_escape(&task.task);
    let mut body = String::new();

    if !task.brief.trim().is_empty() {
        let _ = writeln!(
            body,
            "    <p class=\"brief\">{}</p>",
            html_escape(task.brief.trim())
        );
    }

    body.push_str("    <div>URL param: <span id=\"captcha-url\"></span></div>\n");
    body.push_str("    <div>Result: <span id=\"captcha-result\">-</span></div>\n");
    body.push_str("    <div id=\"view\"></div>\n");

    if !assets.is_empty() {
        body.push_str("    <h2>Attachments</h2>\n    <ul class=\"assets\">\n");
        for a in assets {
            let _ = writeln!(
                body,
                "      <li><a href=\"{}\">{}</a> <small>({}, {} bytes)</small></li>",
                html_escape(&asset_href(&a.name)),
                html_escape(&a.name),
                html_escape(&a.mime),
                a.bytes.len()
            );
        }
        body.push_str("    </ul>\n");

        for a in assets.iter().filter(|a| a.mime.starts_with("text/")) {
            if let Ok(text) = std::str::from_utf8(&a.bytes) {
                if text.len() <= PREVIEW_LIMIT {
                    let _ = writeln!(
                        body,
                        "    <h3>{}</h3>\n    <pre>{}</pre>",
                        html_escape(&a.name),
                        html_escape(text)
                    );
                }
            }
        }
    }

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width,initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="style.css">
  </head>
  <body>
    <h1>{title}</h1>
{body}    <script src="app.js"></script>
  </body>
</html>
"#
    )
}

fn app_js(assets: &[DecodedAttachment]) -> String {
    let default_asset = assets
        .first()
        .map(|a| asset_href(&a.name))
        .unwrap_or_default();
    // serde_json string encoding is a valid JS string literal.
    let default_literal =
        serde_json::to_string(&default_asset).unwrap_or_else(|_| "\"\"".to_string());

    format!(
        r#"(function () {{
  const DEFAULT_ASSET = {default_literal};
  const params = new URLSearchParams(location.search);
  const url = params.get('url') || DEFAULT_ASSET;
  document.getElementById('captcha-url').textContent = url;
  const view = document.getElementById('view');
  if (!url) {{
    return;
  }}
  if (/\.(png|jpe?g|gif|svg|webp)$/i.test(url)) {{
    const img = document.createElement('img');
    img.src = url;
    img.alt = 'attachment';
    view.appendChild(img);
    img.addEventListener('load', function () {{
      document.getElementById('captcha-result').textContent = 'loaded';
    }});
  }} else {{
    const a = document.createElement('a');
    a.href = url;
    a.textContent = url;
    a.target = '_blank';
    view.appendChild(a);
  }}
}})();
"#
    )
}

fn readme(task: &TaskRequest, assets: &[DecodedAttachment]) -> String {
    let mut out = format!("# {}\n\n", task.task);
    if !task.brief.trim().is_empty() {
        let _ = write!(out, "**Brief:** {}\n\n", task.brief.trim());
    }
    let _ = write!(out, "Round: {}\n\n", task.round);
    out.push_str("## Usage\n\n");
    out.push_str(
        "Open `index.html`, or visit the GitHub Pages site. Pass `?url=<asset>` to \
         display a different file.\n",
    );
    if !assets.is_empty() {
        out.push_str("\n## Attachments\n\n");
        for a in assets {
            let _ = writeln!(out, "- `{ASSETS_DIR}/{}` ({})", a.name, a.mime);
        }
    }
    out.push_str("\n## License\n\nMIT, see `LICENSE`.\n");
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Relative link to an asset, percent-encoding everything outside the URL
/// unreserved set.
fn asset_href(name: &str) -> String {
    let mut out = format!("{ASSETS_DIR}/");
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
