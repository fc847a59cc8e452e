//! Virtual project store and the sandboxed preview renderer.
//!
//! The store is the in-memory multi-file tree a builder-mode generation
//! populates; the renderer turns an entry file into a self-contained,
//! addressable document that executes untrusted generated UI code in
//! isolation from the host.

pub mod project;
pub mod sandbox;
pub mod transform;

pub use project::{SharedProjectStore, VirtualProjectStore};
pub use sandbox::{render, SandboxDocument};
pub use transform::{Preprocessor, TypeStripper};
