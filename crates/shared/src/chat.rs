//! Conversation and artifact types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling history cap per session. Older turns fall off the front.
pub const HISTORY_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of the conversation. Immutable once created; the session appends
/// these to its rolling history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    /// Generated code attached to an assistant turn, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Image attachments as data-URI strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the budget estimator had to cut this turn's text to fit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            code: None,
            images: Vec::new(),
            created_at: Utc::now(),
            truncated: false,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// The two response modes. Derived per request by the intent classifier and
/// carried on the request; a session can flip between them turn to turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Tutor,
    Builder,
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationMode::Tutor => write!(f, "tutor"),
            GenerationMode::Builder => write!(f, "builder"),
        }
    }
}

/// A single outbound generation call. `history` is a budget-truncated copy,
/// never the session's full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub history: Vec<ConversationTurn>,
    pub mode: GenerationMode,
    /// Provider descriptor id this request is aimed at.
    pub provider: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// What a backend hands back before normalization: either one text blob or
/// the structured multi-file shape some backends emit in builder mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendPayload {
    Files {
        files: Vec<RawFile>,
        #[serde(default)]
        entry: Option<String>,
        #[serde(default)]
        framework: Option<String>,
    },
    Content {
        content: String,
    },
}

impl BackendPayload {
    pub fn text(content: impl Into<String>) -> Self {
        BackendPayload::Content {
            content: content.into(),
        }
    }

    /// True when there is nothing usable in the payload at all.
    pub fn is_empty(&self) -> bool {
        match self {
            BackendPayload::Content { content } => content.trim().is_empty(),
            BackendPayload::Files { files, .. } => files.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFile {
    pub path: String,
    pub content: String,
}

/// Normalized outcome of one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationResult {
    /// Plain prose answer (tutor mode, or builder mode that yielded no code).
    TextReply { text: String },
    /// A code artifact plus the reply text shown alongside it.
    Code { artifact: CodeArtifact, reply: String },
}

impl GenerationResult {
    pub fn reply_text(&self) -> &str {
        match self {
            GenerationResult::TextReply { text } => text,
            GenerationResult::Code { reply, .. } => reply,
        }
    }

    pub fn artifact(&self) -> Option<&CodeArtifact> {
        match self {
            GenerationResult::TextReply { .. } => None,
            GenerationResult::Code { artifact, .. } => Some(artifact),
        }
    }
}

/// Structured result of a builder-mode generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CodeArtifact {
    SingleFile {
        content: String,
    },
    MultiFile {
        files: Vec<ProjectFile>,
        entry_path: String,
        framework: String,
    },
}

impl CodeArtifact {
    pub fn single(content: impl Into<String>) -> Self {
        CodeArtifact::SingleFile {
            content: content.into(),
        }
    }

    /// Build a multi-file artifact, enforcing the entry invariant: if `entry`
    /// is missing or names no file, the first file is promoted to entry.
    /// Returns `None` for an empty file list.
    pub fn multi(
        files: Vec<ProjectFile>,
        entry: Option<String>,
        framework: Option<String>,
    ) -> Option<Self> {
        let first = files.first()?.path.clone();
        let entry_path = match entry {
            Some(e) if files.iter().any(|f| f.path == e) => e,
            _ => first,
        };
        Some(CodeArtifact::MultiFile {
            files,
            entry_path,
            framework: framework.unwrap_or_else(|| "react".to_string()),
        })
    }

    /// Content of the executable root: the single file, or the entry file.
    pub fn entry_content(&self) -> &str {
        match self {
            CodeArtifact::SingleFile { content } => content,
            CodeArtifact::MultiFile {
                files, entry_path, ..
            } => files
                .iter()
                .find(|f| f.path == *entry_path)
                .map(|f| f.content.as_str())
                .unwrap_or(""),
        }
    }

    pub fn framework(&self) -> &str {
        match self {
            CodeArtifact::SingleFile { .. } => "html",
            CodeArtifact::MultiFile { framework, .. } => framework,
        }
    }
}

/// One file of the virtual project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Unique key within the store.
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let kind = FileKind::infer(&path);
        Self {
            path,
            content: content.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Component,
    Page,
    Style,
    Config,
    Other,
}

impl FileKind {
    /// Infer the kind from a path's name and extension.
    pub fn infer(path: &str) -> Self {
        let lower = path.to_lowercase();
        let name = lower.rsplit('/').next().unwrap_or(&lower);

        if name.ends_with(".css") || name.ends_with(".scss") {
            return FileKind::Style;
        }
        if name == "package.json"
            || name == "tsconfig.json"
            || name.contains(".config.")
            || name.ends_with(".toml")
        {
            return FileKind::Config;
        }
        if name.ends_with(".html") || lower.contains("pages/") {
            return FileKind::Page;
        }
        if name.ends_with(".jsx")
            || name.ends_with(".tsx")
            || name.ends_with(".js")
            || name.ends_with(".ts")
            || name.ends_with(".vue")
        {
            return FileKind::Component;
        }
        FileKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multi_promotes_first_file_when_entry_missing() {
        let files = vec![
            ProjectFile::new("src/App.jsx", "export default function App() {}"),
            ProjectFile::new("src/styles.css", "body {}"),
        ];
        let artifact = CodeArtifact::multi(files, None, None).unwrap();
        match &artifact {
            CodeArtifact::MultiFile { entry_path, .. } => {
                assert_eq!(entry_path, "src/App.jsx")
            }
            _ => panic!("expected multi-file artifact"),
        }
    }

    #[test]
    fn multi_promotes_first_file_when_entry_dangles() {
        let files = vec![ProjectFile::new("index.html", "<html></html>")];
        let artifact =
            CodeArtifact::multi(files, Some("missing.html".to_string()), None).unwrap();
        match &artifact {
            CodeArtifact::MultiFile { entry_path, .. } => assert_eq!(entry_path, "index.html"),
            _ => panic!("expected multi-file artifact"),
        }
    }

    #[test]
    fn multi_rejects_empty_file_list() {
        assert!(CodeArtifact::multi(vec![], None, None).is_none());
    }

    #[test]
    fn entry_content_resolves_the_entry_file() {
        let files = vec![
            ProjectFile::new("a.jsx", "AAA"),
            ProjectFile::new("b.jsx", "BBB"),
        ];
        let artifact = CodeArtifact::multi(files, Some("b.jsx".to_string()), None).unwrap();
        assert_eq!(artifact.entry_content(), "BBB");
    }

    #[test]
    fn file_kind_inference() {
        assert_eq!(FileKind::infer("src/App.jsx"), FileKind::Component);
        assert_eq!(FileKind::infer("styles/main.css"), FileKind::Style);
        assert_eq!(FileKind::infer("package.json"), FileKind::Config);
        assert_eq!(FileKind::infer("vite.config.js"), FileKind::Config);
        assert_eq!(FileKind::infer("index.html"), FileKind::Page);
        assert_eq!(FileKind::infer("README.md"), FileKind::Other);
    }

    #[test]
    fn backend_payload_deserializes_both_shapes() {
        let single: BackendPayload = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert!(matches!(single, BackendPayload::Content { .. }));

        let multi: BackendPayload = serde_json::from_str(
            r#"{"files":[{"path":"index.html","content":"<html></html>"}],"entry":"index.html","framework":"html"}"#,
        )
        .unwrap();
        assert!(matches!(multi, BackendPayload::Files { .. }));
    }
}
