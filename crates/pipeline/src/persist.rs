//! Persistence collaborator seam.
//!
//! The pipeline calls the store opportunistically and must tolerate its
//! failure without aborting the user-visible turn: errors are logged, never
//! surfaced.

use anyhow::Result;
use async_trait::async_trait;
use shared::chat::{ConversationTurn, GenerationMode};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        user_id: &str,
        mode: GenerationMode,
        provider: &str,
        title: &str,
    ) -> Result<String>;

    async fn save_message(&self, session_id: &str, turn: &ConversationTurn) -> Result<()>;

    async fn session_messages(&self, session_id: &str) -> Result<Vec<ConversationTurn>>;
}

/// Store for embedding surfaces that keep no history.
pub struct NoopStore;

#[async_trait]
impl SessionStore for NoopStore {
    async fn create_session(
        &self,
        _user_id: &str,
        _mode: GenerationMode,
        _provider: &str,
        _title: &str,
    ) -> Result<String> {
        Ok(String::new())
    }

    async fn save_message(&self, _session_id: &str, _turn: &ConversationTurn) -> Result<()> {
        Ok(())
    }

    async fn session_messages(&self, _session_id: &str) -> Result<Vec<ConversationTurn>> {
        Ok(Vec::new())
    }
}
