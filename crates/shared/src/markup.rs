//! Heuristics over markup-ish model output, shared by the extractor and the
//! sandbox renderer.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
        .expect("script/style block regex")
});

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(p|div|li|h[1-6])\s*>|<br\s*/?>").expect("block break regex")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));

/// Marker substrings that identify an error-styled fragment a backend emitted
/// in place of a real artifact. Such fragments must never be executed or
/// echoed as markup.
pub fn error_fragment_signature(text: &str) -> bool {
    let lower = text.to_lowercase();
    const MARKERS: &[&str] = &[
        "class=\"error",
        "class='error",
        "id=\"error",
        "generation failed",
        "an error occurred",
        "internal server error",
        "terjadi kesalahan",
    ];
    MARKERS.iter().any(|m| lower.contains(m))
}

/// Plain-text extraction from a short HTML-ish fragment. Script and style
/// bodies go first, block-level closers become line breaks, remaining tags
/// are dropped, then the common entities are decoded. Built for unwrapping
/// error fragments, not for general document conversion.
pub fn strip_markup(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_BLOCK.replace_all(html, "");
    let with_breaks = BLOCK_BREAK.replace_all(&without_scripts, "\n");
    let text = ANY_TAG.replace_all(&with_breaks, "");
    // Entities after tag removal, so a decoded `&lt;` cannot read as a tag.
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
