//! AI backend clients and the provider orchestrator.
//!
//! One HTTP client speaks the generation wire contract; the orchestrator
//! owns the retry/fallback ladder across the ordered provider list and
//! reports which provider actually served each response.

pub mod backend;
pub mod budget;
pub mod mock;
pub mod orchestrator;

pub use backend::{Backend, HttpBackend};
pub use orchestrator::{GenerationJob, LadderState, Orchestrator, ServedGeneration};
