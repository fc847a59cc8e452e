//! Generation response pipeline.
//!
//! This crate is the host side of the product: it classifies user intent,
//! drives the provider orchestrator, normalizes raw model output into prose
//! or a code artifact, and applies the result to the shared project store
//! and preview renderer. One [`session::Pipeline::run_turn`] call is one
//! user turn, processed strictly in submission order per session.

pub mod extract;
pub mod intent;
pub mod persist;
pub mod prompts;
pub mod session;

pub use extract::{extract, extract_text, SUCCESS_PHRASE};
pub use intent::{classify, is_edit_command, resolve_mode};
pub use persist::{NoopStore, SessionStore};
pub use session::{Pipeline, SessionContext, TurnOutcome};
