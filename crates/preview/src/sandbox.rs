//! Sandbox document renderer.
//!
//! Turns an entry file into a self-contained HTML document addressable as a
//! `data:` URI, loadable by any isolated embedding surface. The renderer is
//! stateless: the same inputs always produce the same document. Runtime
//! failures of generated code are caught inside the document itself and
//! rendered as a visible error block, never propagated to the host.

use crate::transform::{escape_for_embed, Preprocessor, TypeStripper};
use base64::Engine;
use shared::markup::{error_fragment_signature, strip_markup};
use tracing::debug;

const REACT_CDN: &str = "https://unpkg.com/react@18.3.1/umd/react.production.min.js";
const REACT_DOM_CDN: &str = "https://unpkg.com/react-dom@18.3.1/umd/react-dom.production.min.js";
const BABEL_CDN: &str = "https://unpkg.com/@babel/standalone@7.24.7/babel.min.js";

/// A finished preview document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxDocument {
    pub html: String,
}

impl SandboxDocument {
    /// Address the document as a `data:` URI for an isolated frame.
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.html.as_bytes());
        format!("data:text/html;base64,{}", encoded)
    }
}

/// Render with the default regex-based preprocessor.
pub fn render(entry_content: &str, framework: &str) -> SandboxDocument {
    render_with(&TypeStripper, entry_content, framework)
}

/// Render with a caller-supplied preprocessor.
pub fn render_with(
    preprocessor: &dyn Preprocessor,
    entry_content: &str,
    framework: &str,
) -> SandboxDocument {
    let trimmed = entry_content.trim();

    // An empty preview source is a classic silent-blank-screen bug; make it
    // a visible, distinct case.
    if trimmed.is_empty() {
        debug!("empty entry content, rendering placeholder");
        return placeholder_document();
    }

    // Never execute an error message as if it were code.
    if error_fragment_signature(trimmed) {
        debug!("error-styled fragment, rendering failure document");
        return failure_document(&strip_markup(trimmed));
    }

    let lower = trimmed.to_lowercase();
    if lower.starts_with("<!doctype") || lower.starts_with("<html") {
        return SandboxDocument {
            html: entry_content.to_string(),
        };
    }

    if trimmed.starts_with('<') || framework == "html" {
        return wrap_fragment(trimmed);
    }

    component_harness(&preprocessor.process(trimmed))
}

/// Minimal shell around a bare markup fragment.
fn wrap_fragment(fragment: &str) -> SandboxDocument {
    SandboxDocument {
        html: format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <style>body{{margin:16px;font-family:system-ui,sans-serif}}</style>\n\
             </head>\n<body>\n{}\n</body>\n</html>\n",
            fragment
        ),
    }
}

/// Executable harness for component-style source: framework runtime plus an
/// in-browser transpiler from pinned CDN references, the source embedded as a
/// string constant, and a guarded mount that renders failures in-sandbox.
fn component_harness(source: &str) -> SandboxDocument {
    let embedded = escape_for_embed(source);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script crossorigin src="{react}"></script>
<script crossorigin src="{react_dom}"></script>
<script src="{babel}"></script>
<style>body{{margin:0;font-family:system-ui,sans-serif}}#sandbox-error{{padding:16px;color:#b91c1c;background:#fef2f2;font-family:monospace;white-space:pre-wrap}}</style>
</head>
<body>
<div id="root"></div>
<script>
var SOURCE = `{embedded}`;
function showError(err) {{
  var block = document.createElement("div");
  block.id = "sandbox-error";
  block.textContent = "Preview failed: " + String(err);
  document.body.appendChild(block);
}}
try {{
  var compiled = Babel.transform(SOURCE, {{ presets: ["react", "env"] }}).code;
  var module = {{ exports: {{}} }};
  new Function("React", "module", "exports", compiled)(React, module, module.exports);
  var Component = module.exports && (module.exports.default || module.exports);
  if (typeof Component !== "function") {{
    throw new Error("no component export found");
  }}
  var root = ReactDOM.createRoot(document.getElementById("root"));
  root.render(React.createElement(Component));
}} catch (err) {{
  showError(err);
}}
</script>
</body>
</html>
"#,
        react = REACT_CDN,
        react_dom = REACT_DOM_CDN,
        babel = BABEL_CDN,
        embedded = embedded,
    );
    SandboxDocument { html }
}

/// Neutral document for empty input.
fn placeholder_document() -> SandboxDocument {
    SandboxDocument {
        html: "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\">\
               <style>body{display:flex;align-items:center;justify-content:center;height:100vh;\
               margin:0;font-family:system-ui,sans-serif;color:#6b7280}</style></head>\n\
               <body><p>Nothing to preview yet.</p></body>\n</html>\n"
            .to_string(),
    }
}

/// Static document shown when the backend emitted an error fragment.
fn failure_document(detail: &str) -> SandboxDocument {
    let safe = detail
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    SandboxDocument {
        html: format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\">\
             <style>body{{margin:24px;font-family:system-ui,sans-serif}}\
             .notice{{padding:16px;border:1px solid #fca5a5;background:#fef2f2;color:#b91c1c;border-radius:8px}}</style></head>\n\
             <body><div class=\"notice\"><strong>Generation failed.</strong><p>{}</p></div></body>\n</html>\n",
            safe
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_a_placeholder() {
        let doc = render("", "html");
        assert!(doc.html.contains("Nothing to preview yet."));
        let doc = render("   \n\t", "react");
        assert!(doc.html.contains("Nothing to preview yet."));
    }

    #[test]
    fn full_documents_pass_through_unchanged() {
        let html = "<!DOCTYPE html><html><body><h1>Hi</h1></body></html>";
        assert_eq!(render(html, "html").html, html);
    }

    #[test]
    fn fragments_get_a_minimal_shell() {
        let doc = render("<h1>Hi</h1>", "html");
        assert!(doc.html.starts_with("<!DOCTYPE html>"));
        assert!(doc.html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn component_source_is_embedded_in_the_harness() {
        let src = "export default function App() { return <h1>Hi</h1>; }";
        let doc = render(src, "react");
        assert!(doc.html.contains(REACT_CDN));
        assert!(doc.html.contains(BABEL_CDN));
        assert!(doc.html.contains("export default function App()"));
        assert!(doc.html.contains("showError"));
    }

    #[test]
    fn embedded_source_cannot_close_the_script_region() {
        let src = "const s = `x${y}`; // </SCRIPT><script>alert(1)</script>";
        let doc = render(src, "react");
        assert!(!doc.html.contains("</SCRIPT"));
        assert!(doc.html.contains("<\\/SCRIPT"));
        assert!(doc.html.contains("<\\/script"));
    }

    #[test]
    fn error_fragments_are_never_executed() {
        let fragment = r#"<div class="error">Generation failed: upstream exploded</div>"#;
        let doc = render(fragment, "html");
        assert!(doc.html.contains("Generation failed."));
        assert!(!doc.html.contains("class=\"error\""));
        assert!(doc.html.contains("upstream exploded"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let src = "export default function App() { return <p>x</p>; }";
        assert_eq!(render(src, "react"), render(src, "react"));
    }

    #[test]
    fn data_uri_addressing() {
        let doc = render("<h1>Hi</h1>", "html");
        let uri = doc.data_uri();
        assert!(uri.starts_with("data:text/html;base64,"));
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(uri.trim_start_matches("data:text/html;base64,"))
            .unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), doc.html);
    }
}
