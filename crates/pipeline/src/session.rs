//! Session context and the per-turn pipeline driver.
//!
//! The session owns what used to be ambient UI state: the active mode, the
//! selected provider, the rolling history, and the shared project store. One
//! driver call runs a whole turn in submission order: classify, budget,
//! generate with fallback, extract, apply, render. A new turn is refused
//! while one is in flight; the pipeline never runs concurrently for a
//! session.

use crate::extract;
use crate::intent;
use crate::persist::SessionStore;
use crate::prompts;
use anyhow::{bail, Result};
use preview::project::{SharedProjectStore, VirtualProjectStore};
use preview::sandbox::{self, SandboxDocument};
use providers::backend::Backend;
use providers::orchestrator::{GenerationJob, Orchestrator};
use shared::chat::{ConversationTurn, GenerationMode, GenerationResult, HISTORY_CAP};
use shared::error::GenerateError;
use shared::settings::SessionSettings;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Explicit session state: created on new chat, mutated by each turn, torn
/// down on session switch.
pub struct SessionContext {
    pub id: Uuid,
    pub mode: GenerationMode,
    /// Provider the user selected; fallback substitutions do not change it.
    pub provider: String,
    pub store: SharedProjectStore,
    history: Vec<ConversationTurn>,
    persisted_id: Option<String>,
    in_flight: bool,
}

impl SessionContext {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: GenerationMode::Tutor,
            provider: settings.default_provider.clone(),
            store: VirtualProjectStore::shared(),
            history: Vec::new(),
            persisted_id: None,
            in_flight: false,
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Whether a generated artifact is on screen, for the edit-command rule.
    pub fn has_artifact(&self) -> bool {
        !self.store.read().is_empty()
    }

    fn push_turn(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
        if self.history.len() > HISTORY_CAP {
            let overflow = self.history.len() - HISTORY_CAP;
            self.history.drain(..overflow);
        }
    }
}

/// Result of one turn, ready for the chat and preview surfaces.
#[derive(Debug)]
pub struct TurnOutcome {
    pub mode: GenerationMode,
    pub reply: String,
    /// Provider that actually served, for usage accounting. `None` on
    /// failure.
    pub served_by: Option<String>,
    pub preview: Option<SandboxDocument>,
    pub failed: bool,
}

pub struct Pipeline<B: Backend, S: SessionStore> {
    orchestrator: Orchestrator<B>,
    persist: S,
}

impl<B: Backend, S: SessionStore> Pipeline<B, S> {
    pub fn new(orchestrator: Orchestrator<B>, persist: S) -> Self {
        Self {
            orchestrator,
            persist,
        }
    }

    /// Run one user turn end to end. State transitions complete before the
    /// call returns; a second call while one is in flight is refused.
    pub async fn run_turn(
        &self,
        session: &mut SessionContext,
        text: &str,
        images: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        if session.in_flight {
            bail!("a generation is already in flight for this session");
        }
        session.in_flight = true;
        let outcome = self.turn_inner(session, text, images, cancel).await;
        session.in_flight = false;
        outcome
    }

    async fn turn_inner(
        &self,
        session: &mut SessionContext,
        text: &str,
        images: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let classified = intent::classify(text);
        let mode = intent::resolve_mode(classified, session.mode, session.has_artifact(), text);
        session.mode = mode;
        info!(session = %session.id, %mode, "turn started");

        let job = GenerationJob {
            prompt: text.to_string(),
            history: session.history.clone(),
            mode,
            images: images.clone(),
            system_prompt: prompts::system_prompt(mode),
        };
        let user_turn = ConversationTurn::user(text).with_images(images);

        let outcome = match self.orchestrator.generate(&job, &session.provider, cancel).await {
            Ok(served) => {
                let result = extract::extract(&served.payload, mode);
                let mut preview = None;
                if let GenerationResult::Code { artifact, .. } = &result {
                    session.store.write().apply_artifact(artifact);
                    preview = Some(sandbox::render(
                        artifact.entry_content(),
                        artifact.framework(),
                    ));
                }
                let assistant_turn = match &result {
                    GenerationResult::TextReply { text } => {
                        ConversationTurn::assistant(text.clone())
                    }
                    GenerationResult::Code { artifact, reply } => {
                        ConversationTurn::assistant(reply.clone())
                            .with_code(artifact.entry_content())
                    }
                };
                let reply = result.reply_text().to_string();
                self.record(session, user_turn, assistant_turn).await;
                TurnOutcome {
                    mode,
                    reply,
                    served_by: Some(served.served_by),
                    preview,
                    failed: false,
                }
            }
            Err(err) => {
                let reply = failure_reply(&err);
                let assistant_turn = ConversationTurn::assistant(reply.clone());
                self.record(session, user_turn, assistant_turn).await;
                TurnOutcome {
                    mode,
                    reply,
                    served_by: None,
                    preview: None,
                    failed: true,
                }
            }
        };
        Ok(outcome)
    }

    /// Append both turns to the session and save them opportunistically.
    /// Persistence failure never aborts the turn.
    async fn record(
        &self,
        session: &mut SessionContext,
        user_turn: ConversationTurn,
        assistant_turn: ConversationTurn,
    ) {
        if session.persisted_id.is_none() {
            let title: String = user_turn.text.chars().take(48).collect();
            match self
                .persist
                .create_session("local", session.mode, &session.provider, &title)
                .await
            {
                Ok(id) => session.persisted_id = Some(id),
                Err(e) => warn!(session = %session.id, error = %e, "create_session failed"),
            }
        }
        if let Some(id) = session.persisted_id.clone() {
            for turn in [&user_turn, &assistant_turn] {
                if let Err(e) = self.persist.save_message(&id, turn).await {
                    warn!(session = %session.id, error = %e, "save_message failed");
                }
            }
        }
        session.push_turn(user_turn);
        session.push_turn(assistant_turn);
    }
}

/// Plain-language failure message with actionable suggestions. The user
/// never sees a raw error or a blank screen.
fn failure_reply(err: &GenerateError) -> String {
    match err {
        GenerateError::Cancelled => "Generation cancelled.".to_string(),
        _ => format!(
            "I couldn't get a response from the AI backends just now ({}). \
             You can rephrase your request, switch to another provider, or try again in a moment.",
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SUCCESS_PHRASE;
    use crate::persist::NoopStore;
    use providers::mock::MockBackend;
    use shared::chat::BackendPayload;
    use shared::chat::GenerationMode::{Builder, Tutor};
    use shared::error::ErrorCode;

    fn pipeline(backend: MockBackend) -> Pipeline<MockBackend, NoopStore> {
        Pipeline::new(
            Orchestrator::new(backend, SessionSettings::default()),
            NoopStore,
        )
    }

    fn session() -> SessionContext {
        SessionContext::new(&SessionSettings::default())
    }

    fn html_payload() -> BackendPayload {
        BackendPayload::text(
            "```html\n<!DOCTYPE html><html><body><h1>Bakery</h1></body></html>\n```",
        )
    }

    #[tokio::test]
    async fn builder_turn_populates_store_and_preview() {
        let pipe = pipeline(MockBackend::always_ok(html_payload()));
        let mut session = session();
        let cancel = CancellationToken::new();

        let outcome = pipe
            .run_turn(&mut session, "build a landing page for a bakery", vec![], &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.mode, Builder);
        assert_eq!(outcome.reply, SUCCESS_PHRASE);
        assert_eq!(outcome.served_by.as_deref(), Some("atlas-pro"));
        assert!(outcome.preview.is_some());
        assert!(session.has_artifact());
        assert_eq!(session.store.read().entry(), Some("index.html"));
        assert_eq!(session.history().len(), 2);
        assert!(session.history()[1].code.is_some());
    }

    #[tokio::test]
    async fn tutor_turn_leaves_the_store_alone() {
        let pipe = pipeline(MockBackend::always_ok(BackendPayload::text(
            "A closure captures its environment.",
        )));
        let mut session = session();
        let cancel = CancellationToken::new();

        let outcome = pipe
            .run_turn(&mut session, "what is a closure?", vec![], &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.mode, Tutor);
        assert!(outcome.preview.is_none());
        assert!(!session.has_artifact());
        assert_eq!(outcome.reply, "A closure captures its environment.");
    }

    #[tokio::test]
    async fn regeneration_replaces_the_previous_project_wholesale() {
        let first = BackendPayload::Files {
            files: vec![
                shared::chat::RawFile {
                    path: "old.html".into(),
                    content: "<html>old</html>".into(),
                },
                shared::chat::RawFile {
                    path: "old.css".into(),
                    content: "body{}".into(),
                },
            ],
            entry: Some("old.html".into()),
            framework: Some("html".into()),
        };
        let second = BackendPayload::Files {
            files: vec![shared::chat::RawFile {
                path: "new.html".into(),
                content: "<html>new</html>".into(),
            }],
            entry: Some("new.html".into()),
            framework: Some("html".into()),
        };
        let pipe = pipeline(MockBackend::script(vec![Ok(first), Ok(second)]));
        let mut session = session();
        let cancel = CancellationToken::new();

        pipe.run_turn(&mut session, "build a website for my shop", vec![], &cancel)
            .await
            .unwrap();
        assert_eq!(session.store.read().get_all().len(), 2);

        pipe.run_turn(&mut session, "ubah warna jadi biru", vec![], &cancel)
            .await
            .unwrap();
        let store = session.store.read();
        let paths: Vec<_> = store.get_all().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["new.html"]);
        assert_eq!(store.entry(), Some("new.html"));
    }

    #[tokio::test]
    async fn edit_command_keeps_builder_mode_when_an_artifact_exists() {
        let pipe = pipeline(MockBackend::always_ok(html_payload()));
        let mut session = session();
        let cancel = CancellationToken::new();

        pipe.run_turn(&mut session, "build a website for a cafe", vec![], &cancel)
            .await
            .unwrap();
        assert_eq!(session.mode, Builder);

        let outcome = pipe
            .run_turn(&mut session, "make it yellow", vec![], &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.mode, Builder);
    }

    #[tokio::test]
    async fn exhausted_ladder_surfaces_a_helpful_failure_turn() {
        let pipe = pipeline(MockBackend::always_fail(GenerateError::Quota {
            code: ErrorCode::QuotaExceeded,
            detail: "credit limit".into(),
        }));
        let mut session = session();
        let cancel = CancellationToken::new();

        let outcome = pipe
            .run_turn(&mut session, "build a website for a cafe", vec![], &cancel)
            .await
            .unwrap();

        assert!(outcome.failed);
        assert!(outcome.reply.contains("try again"));
        assert!(outcome.served_by.is_none());
        // The failed turn still lands in history, and the gate is released.
        assert_eq!(session.history().len(), 2);
        let again = pipe
            .run_turn(&mut session, "build a website for a cafe", vec![], &cancel)
            .await
            .unwrap();
        assert!(again.failed);
    }

    #[tokio::test]
    async fn history_is_capped_at_twenty_turns() {
        let pipe = pipeline(MockBackend::script(
            (0..30)
                .map(|i| Ok(BackendPayload::text(format!("answer {i}"))))
                .collect(),
        ));
        let mut session = session();
        let cancel = CancellationToken::new();

        for i in 0..15 {
            pipe.run_turn(&mut session, &format!("question {i}"), vec![], &cancel)
                .await
                .unwrap();
        }
        assert_eq!(session.history().len(), HISTORY_CAP);
        // Newest turns survive.
        let last = session.history().last().unwrap();
        assert_eq!(last.text, "answer 14");
    }
}
