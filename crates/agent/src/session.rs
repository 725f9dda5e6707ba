//! Call session
//!
//! One phone call: a fresh thread id, a turn orchestrator bound to it and a
//! turn counter. Abandoning a turn (caller hangs up, barge-in) is dropping
//! the stream returned by [`CallSession::handle_utterance`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use phone_agent_core::{AudioChunk, ReasoningEngine, SpeechSynthesizer, Transcriber};
use phone_agent_pipeline::BoundedEffectPlayer;
use uuid::Uuid;

use crate::error::AgentError;
use crate::orchestrator::{TurnConfig, TurnOrchestrator, TurnOutcome, TurnStream};

/// Dependencies shared by every call
#[derive(Clone)]
pub struct SessionDeps {
    pub transcriber: Arc<dyn Transcriber>,
    pub reasoner: Arc<dyn ReasoningEngine>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub effect: BoundedEffectPlayer,
    pub config: TurnConfig,
}

pub struct CallSession {
    orchestrator: TurnOrchestrator,
    reasoner: Arc<dyn ReasoningEngine>,
    turns: AtomicU64,
}

impl CallSession {
    /// Start a session under a newly generated thread id
    pub fn new(deps: &SessionDeps) -> Result<Self, AgentError> {
        let thread_id = Uuid::new_v4().to_string();
        let orchestrator = TurnOrchestrator::builder()
            .thread_id(thread_id.clone())
            .transcriber(Arc::clone(&deps.transcriber))
            .reasoner(Arc::clone(&deps.reasoner))
            .synthesizer(Arc::clone(&deps.synthesizer))
            .effect(deps.effect.clone())
            .config(deps.config.clone())
            .build()?;

        tracing::info!(thread_id = %thread_id, "Call session started");

        Ok(Self {
            orchestrator,
            reasoner: Arc::clone(&deps.reasoner),
            turns: AtomicU64::new(0),
        })
    }

    pub fn thread_id(&self) -> &str {
        self.orchestrator.thread_id()
    }

    /// Turns started so far
    pub fn turn_count(&self) -> u64 {
        self.turns.load(Ordering::Relaxed)
    }

    /// Run one turn for a segmented caller utterance
    pub fn handle_utterance(&self, audio: AudioChunk) -> TurnStream {
        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            thread_id = %self.thread_id(),
            turn,
            samples = audio.len(),
            "Handling utterance"
        );
        self.orchestrator.run_turn(audio)
    }

    /// Run one turn to completion
    pub async fn handle_utterance_collect(&self, audio: AudioChunk) -> TurnOutcome {
        self.turns.fetch_add(1, Ordering::Relaxed);
        self.orchestrator.run_turn_collect(audio).await
    }

    /// End the call and release the reasoner's history for its thread
    pub fn end(self, reason: &str) {
        self.reasoner.end_thread(self.thread_id());
        tracing::info!(
            thread_id = %self.thread_id(),
            turns = self.turn_count(),
            reason,
            "Call session ended"
        );
    }
}
