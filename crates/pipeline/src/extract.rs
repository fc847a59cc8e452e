//! Response normalizer: raw backend output -> prose reply or code artifact.
//!
//! Model output varies wildly; this module is a total function over it.
//! Unparsable input degrades to a text reply carrying the best available
//! human-readable fragment, never an empty reply and never a panic.

use regex::Regex;
use shared::chat::{BackendPayload, CodeArtifact, GenerationMode, GenerationResult, ProjectFile};
use shared::markup::{error_fragment_signature, strip_markup};
use std::sync::LazyLock;
use tracing::debug;

/// Shown when a builder turn produced code but no prose worth keeping. The
/// chat surface must always render something after a builder turn.
pub const SUCCESS_PHRASE: &str = "Done! Check the preview on the right.";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9+_-]*)[ \t]*\n(.*?)```").expect("fenced block regex")
});

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]*)`").expect("inline code regex"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank runs regex"));

static COMPONENT_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(export\s+(default\s+)?)?(function|const|class)\s+[A-Z_$]")
        .expect("component shape regex")
});

static DOC_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype|<html").expect("document start regex"));

static DOC_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</html>").expect("document end regex"));

static BODY_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body").expect("body start regex"));

static BODY_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body>").expect("body end regex"));

static TRIVIAL_ACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(sure|okay|ok|here( you go)?|here('|’)s[^\n]*|got it|certainly|of course|done|baik|tentu|siap)[\s!,.:;]*$",
    )
    .expect("trivial ack regex")
});

/// Normalize one backend payload under the active mode.
pub fn extract(payload: &BackendPayload, mode: GenerationMode) -> GenerationResult {
    match (payload, mode) {
        (BackendPayload::Files { files, entry, framework }, GenerationMode::Builder) => {
            extract_structured(files, entry.clone(), framework.clone())
        }
        (BackendPayload::Files { files, .. }, GenerationMode::Tutor) => {
            let joined = files
                .iter()
                .map(|f| f.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            GenerationResult::TextReply {
                text: tutor_reply(&joined),
            }
        }
        (BackendPayload::Content { content }, GenerationMode::Tutor) => {
            GenerationResult::TextReply {
                text: tutor_reply(content),
            }
        }
        (BackendPayload::Content { content }, GenerationMode::Builder) => builder_reply(content),
    }
}

/// Convenience wrapper for plain-text payloads.
pub fn extract_text(raw: &str, mode: GenerationMode) -> GenerationResult {
    extract(&BackendPayload::text(raw), mode)
}

/// Tutor mode: prose only. Fenced blocks are dropped, inline code spans are
/// unwrapped, blank runs collapsed. Error-styled markup is unwrapped to its
/// plain text instead of being echoed.
fn tutor_reply(raw: &str) -> String {
    if error_fragment_signature(raw) {
        let plain = strip_markup(raw);
        if !plain.trim().is_empty() {
            return plain;
        }
    }

    let without_fences = FENCED_BLOCK.replace_all(raw, "");
    let unwrapped = INLINE_CODE.replace_all(&without_fences, "$1");
    let collapsed = BLANK_RUNS.replace_all(&unwrapped, "\n\n");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        // Stripping ate everything; the original is still the best we have.
        raw.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builder mode over the structured multi-file shape. Any empty or
/// error-styled file poisons the whole artifact: a half-broken project is
/// worse than none.
fn extract_structured(
    files: &[shared::chat::RawFile],
    entry: Option<String>,
    framework: Option<String>,
) -> GenerationResult {
    let poisoned = files.iter().find(|f| {
        f.content.trim().is_empty() || error_fragment_signature(&f.content)
    });
    if files.is_empty() || poisoned.is_some() {
        debug!("structured payload rejected, degrading to text");
        let text = poisoned
            .map(|f| strip_markup(&f.content))
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| {
                "The generated project came back incomplete. Try rephrasing your request."
                    .to_string()
            });
        return GenerationResult::TextReply { text };
    }

    let project_files: Vec<ProjectFile> = files
        .iter()
        .map(|f| ProjectFile::new(f.path.clone(), f.content.clone()))
        .collect();
    match CodeArtifact::multi(project_files, entry, framework) {
        Some(artifact) => GenerationResult::Code {
            artifact,
            reply: SUCCESS_PHRASE.to_string(),
        },
        None => GenerationResult::TextReply {
            text: "The generated project came back empty. Try rephrasing your request."
                .to_string(),
        },
    }
}

/// Builder mode over a single text blob: fenced block, then raw document
/// span, then body-span synthesis, then prose fallback.
fn builder_reply(raw: &str) -> GenerationResult {
    if error_fragment_signature(raw) {
        return GenerationResult::TextReply {
            text: tutor_reply(raw),
        };
    }

    if let Some((code, remainder)) = fenced_code(raw)
        .or_else(|| document_span(raw))
        .or_else(|| body_synthesis(raw))
    {
        let reply = remainder_reply(&remainder);
        return GenerationResult::Code {
            artifact: CodeArtifact::single(code),
            reply,
        };
    }

    GenerationResult::TextReply {
        text: tutor_reply(raw),
    }
}

/// Strategy (a): first fenced block whose tag is HTML-like, React-ish, or
/// absent, and whose body is markup- or component-shaped.
fn fenced_code(raw: &str) -> Option<(String, String)> {
    for cap in FENCED_BLOCK.captures_iter(raw) {
        let tag = cap.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
        let accepted_tag = matches!(
            tag.as_str(),
            "" | "html" | "htm" | "xml" | "jsx" | "tsx" | "js" | "javascript" | "react" | "vue"
        );
        if !accepted_tag {
            continue;
        }
        let body = cap.get(2).map(|m| m.as_str()).unwrap_or("");
        let trimmed = body.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !markup_shaped(trimmed) && !component_shaped(trimmed) {
            continue;
        }
        let whole = cap.get(0).map(|m| m.as_str()).unwrap_or("");
        let remainder = raw.replacen(whole, "", 1);
        return Some((trimmed.to_string(), remainder));
    }
    None
}

/// Strategy (b): a raw `<!DOCTYPE>`/`<html>` span outside any fence. Offsets
/// come from case-insensitive matches over the original string, so slicing
/// stays on char boundaries whatever precedes the markup.
fn document_span(raw: &str) -> Option<(String, String)> {
    let start = DOC_START.find(raw)?.start();
    let end = DOC_END.find(raw).map(|m| m.end()).unwrap_or(raw.len());
    if end <= start {
        return None;
    }
    let code = raw[start..end].trim();
    if code.is_empty() {
        return None;
    }
    let remainder = format!("{}{}", &raw[..start], &raw[end..]);
    Some((code.to_string(), remainder))
}

/// Strategy (c): no document root, but the blob has tags and a `<body>`;
/// wrap the body span in a minimal document.
fn body_synthesis(raw: &str) -> Option<(String, String)> {
    if !markup_shaped(raw) {
        return None;
    }
    let start = BODY_START.find(raw)?.start();
    let end = BODY_END.find(raw).map(|m| m.end()).unwrap_or(raw.len());
    if end <= start {
        return None;
    }
    let span = raw[start..end].trim();
    if span.is_empty() {
        return None;
    }
    let code = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n{}\n</html>",
        span
    );
    let remainder = format!("{}{}", &raw[..start], &raw[end..]);
    Some((code, remainder))
}

fn markup_shaped(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

fn component_shaped(text: &str) -> bool {
    COMPONENT_SHAPE.is_match(text) || text.contains("export default")
}

/// Prose kept alongside an artifact. One-word acknowledgements and leftover
/// whitespace count as empty and yield the canned phrase.
fn remainder_reply(remainder: &str) -> String {
    let cleaned = tutor_reply(remainder);
    if cleaned.is_empty() || TRIVIAL_ACK.is_match(&cleaned) {
        SUCCESS_PHRASE.to_string()
    } else {
        cleaned
    }
}
