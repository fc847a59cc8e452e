//! Shared types for the generation pipeline.
//!
//! This crate holds the data model every other crate speaks: conversation
//! turns, generation modes and requests, code artifacts, project files,
//! provider descriptors, and the upstream error taxonomy.

pub mod chat;
pub mod error;
pub mod markup;
pub mod settings;

pub use chat::{
    BackendPayload, CodeArtifact, ConversationTurn, FileKind, GenerationMode, GenerationRequest,
    GenerationResult, ProjectFile, RawFile, Role, HISTORY_CAP,
};
pub use error::{ErrorCode, GenerateError};
pub use settings::{CostClass, ProviderDescriptor, SessionSettings};
