//! In-memory multi-file project keyed by path.

use parking_lot::RwLock;
use shared::chat::{CodeArtifact, FileKind, ProjectFile};
use std::sync::Arc;

/// Store handle shared between the pipeline and an editor surface. Mutation
/// stays single-writer: the turn driver while a generation lands, the editor
/// between turns.
pub type SharedProjectStore = Arc<RwLock<VirtualProjectStore>>;

/// Insertion-ordered mapping path -> file, plus one entry pointer.
///
/// Invariant: the entry, once set, always names a file present in the store.
/// Deleting the entry file clears the pointer; reassignment is the caller's
/// job.
#[derive(Debug, Default, Clone)]
pub struct VirtualProjectStore {
    files: Vec<ProjectFile>,
    entry: Option<String>,
}

impl VirtualProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedProjectStore {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.entry = None;
    }

    /// Insert or overwrite. An overwrite keeps the file's original position.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>, kind: FileKind) {
        let path = path.into();
        let content = content.into();
        if let Some(existing) = self.files.iter_mut().find(|f| f.path == path) {
            existing.content = content;
            existing.kind = kind;
        } else {
            self.files.push(ProjectFile {
                path,
                content,
                kind,
            });
        }
    }

    /// Point the entry at an existing file. Fails if the path is absent.
    pub fn set_entry(&mut self, path: &str) -> bool {
        if self.files.iter().any(|f| f.path == path) {
            self.entry = Some(path.to_string());
            true
        } else {
            false
        }
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    pub fn entry_file(&self) -> Option<&ProjectFile> {
        let entry = self.entry.as_deref()?;
        self.files.iter().find(|f| f.path == entry)
    }

    pub fn get_file(&self, path: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn get_all(&self) -> &[ProjectFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove a file. Returns whether anything was removed; removing the
    /// entry file also clears the entry pointer.
    pub fn delete_file(&mut self, path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.path != path);
        let removed = self.files.len() != before;
        if removed && self.entry.as_deref() == Some(path) {
            self.entry = None;
        }
        removed
    }

    /// Rename a file in place. Fails if `old` is absent or `new` is taken.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if old == new || self.files.iter().any(|f| f.path == new) {
            return false;
        }
        let Some(file) = self.files.iter_mut().find(|f| f.path == old) else {
            return false;
        };
        file.path = new.to_string();
        file.kind = FileKind::infer(new);
        if self.entry.as_deref() == Some(old) {
            self.entry = Some(new.to_string());
        }
        true
    }

    /// Clear-then-repopulate from a fresh artifact. Wholesale replacement is
    /// deliberate: edits made since the previous generation are discarded so
    /// stale files can never survive a regeneration.
    pub fn apply_artifact(&mut self, artifact: &CodeArtifact) {
        self.clear();
        match artifact {
            CodeArtifact::SingleFile { content } => {
                self.add_file("index.html", content.clone(), FileKind::Page);
                self.entry = Some("index.html".to_string());
            }
            CodeArtifact::MultiFile {
                files, entry_path, ..
            } => {
                for f in files {
                    self.add_file(f.path.clone(), f.content.clone(), f.kind);
                }
                // The artifact constructor already enforced entry membership.
                self.entry = Some(entry_path.clone());
            }
        }
    }
}
