//! Turn orchestrator
//!
//! Drives one caller utterance through transcription, streaming reasoning and
//! synthesis, and emits the reply as one ordered stream of audio chunks:
//!
//! 1. transcribe the utterance
//! 2. pull reasoning steps one at a time; on a tool invocation that has not
//!    been announced yet, speak the filler phrase and play the bounded effect
//! 3. keep the last final text seen on a `model` step
//! 4. speak that text, or the fallback phrase when there is none
//!
//! The returned stream owns everything it needs. Dropping it abandons the
//! turn and drops the reasoning and synthesis streams with it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use metrics::counter;
use phone_agent_config::constants;
use phone_agent_config::{AgentSettings, FillerFailure, Settings};
use phone_agent_core::{
    AudioChunk, ConversationTurn, ReasoningEngine, ReasoningError, SpeechSynthesizer, StepEvent,
    SynthesisError, Transcriber, TranscriptionError,
};
use phone_agent_pipeline::{BoundedEffectPlayer, EffectBudget};
use serde_json::Value;

use crate::error::{AgentError, SpeechPhase, TurnError};
use crate::payload;

/// Outbound audio of one turn; ends after the first `Err`
pub type TurnStream = BoxStream<'static, Result<AudioChunk, TurnError>>;

/// Per-turn behavior shared by every turn of a session
#[derive(Debug, Clone, PartialEq)]
pub struct TurnConfig {
    /// Filler phrase spoken on each tool round
    pub tool_use_message: String,
    /// Spoken when reasoning produces no final text
    pub fallback_message: String,
    /// Effect cutoff per tool round; `0` disables the effect
    pub sound_effect_seconds: f64,
    /// Effect emission chunk size
    pub effect_chunk_ms: u32,
    /// Deadline for each individual port await
    pub port_timeout: Option<Duration>,
    pub filler_failure: FillerFailure,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for TurnConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            tool_use_message: settings.tool_use_message.clone(),
            fallback_message: settings.fallback_message.clone(),
            sound_effect_seconds: settings.sound_effect_seconds,
            effect_chunk_ms: constants::effect::CHUNK_MS,
            port_timeout: settings.port_timeout_ms.map(Duration::from_millis),
            filler_failure: settings.filler_failure,
        }
    }
}

impl From<&Settings> for TurnConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            effect_chunk_ms: settings.effect.chunk_ms,
            ..Self::from(&settings.agent)
        }
    }
}

impl TurnConfig {
    pub fn with_sound_effect_seconds(mut self, seconds: f64) -> Self {
        self.sound_effect_seconds = seconds;
        self
    }

    pub fn with_port_timeout(mut self, timeout: Duration) -> Self {
        self.port_timeout = Some(timeout);
        self
    }

    pub fn with_filler_failure(mut self, policy: FillerFailure) -> Self {
        self.filler_failure = policy;
        self
    }

    fn validate(&self) -> Result<(), AgentError> {
        if !self.sound_effect_seconds.is_finite() || self.sound_effect_seconds < 0.0 {
            return Err(AgentError::InvalidConfig(format!(
                "sound_effect_seconds must be finite and non-negative, got {}",
                self.sound_effect_seconds
            )));
        }
        if self.effect_chunk_ms == 0 {
            return Err(AgentError::InvalidConfig(
                "effect_chunk_ms must be positive".to_string(),
            ));
        }
        if self.port_timeout == Some(Duration::ZERO) {
            return Err(AgentError::InvalidConfig(
                "port_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn effect_budget(&self) -> EffectBudget {
        EffectBudget::new(self.sound_effect_seconds, self.effect_chunk_ms)
    }
}

/// Whole turn gathered in memory
#[derive(Debug, Default)]
pub struct TurnOutcome {
    /// Every chunk emitted before the turn ended
    pub chunks: Vec<AudioChunk>,
    /// Failure that ended the turn, if any
    pub error: Option<TurnError>,
}

impl TurnOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn total_samples(&self) -> usize {
        self.chunks.iter().map(AudioChunk::len).sum()
    }
}

/// Composes the ports into conversational turns for one thread.
///
/// Cheap to clone; dependencies are shared behind `Arc`s and no state is kept
/// between turns besides the thread id.
#[derive(Clone)]
pub struct TurnOrchestrator {
    thread_id: String,
    transcriber: Arc<dyn Transcriber>,
    reasoner: Arc<dyn ReasoningEngine>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    effect: BoundedEffectPlayer,
    config: Arc<TurnConfig>,
}

impl TurnOrchestrator {
    pub fn builder() -> TurnOrchestratorBuilder {
        TurnOrchestratorBuilder::default()
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// Run one turn for a caller utterance
    pub fn run_turn(&self, audio: AudioChunk) -> TurnStream {
        let thread_id = self.thread_id.clone();
        let transcriber = Arc::clone(&self.transcriber);
        let reasoner = Arc::clone(&self.reasoner);
        let synthesizer = Arc::clone(&self.synthesizer);
        let effect = self.effect.clone();
        let config = Arc::clone(&self.config);

        Box::pin(stream! {
            counter!("phone_agent_turns_total").increment(1);

            let transcription = within(
                config.port_timeout,
                transcriber.transcribe(&audio),
                TranscriptionError::Timeout,
            )
            .await;
            let text = match transcription {
                Ok(text) => text,
                Err(e) => {
                    let err = TurnError::from(e);
                    record_failure(&thread_id, &err);
                    yield Err(err);
                    return;
                }
            };
            tracing::info!(thread_id = %thread_id, transcription = %text, "Transcription");

            let mut steps = reasoner.stream_turn(ConversationTurn::new(thread_id.clone(), text));
            let mut announced: HashSet<String> = HashSet::new();
            let mut candidate: Option<String> = None;

            loop {
                let event = match next_within(&mut steps, config.port_timeout, ReasoningError::Timeout).await {
                    None => break,
                    Some(Ok(event)) => event,
                    Some(Err(e)) => {
                        let err = TurnError::from(e);
                        record_failure(&thread_id, &err);
                        yield Err(err);
                        return;
                    }
                };
                tracing::debug!(thread_id = %thread_id, step = event.label(), "Reasoning step");

                let StepEvent::Model(step) = &event else {
                    continue;
                };

                if payload::has_tool_calls(step) && claim_tool_round(step, &mut announced) {
                    counter!("phone_agent_tool_rounds_total").increment(1);
                    tracing::debug!(thread_id = %thread_id, "Tool invocation, playing filler");

                    let mut filler = speak(
                        synthesizer.as_ref(),
                        &config.tool_use_message,
                        config.port_timeout,
                        SpeechPhase::Filler,
                    );
                    while let Some(item) = filler.next().await {
                        match item {
                            Ok(chunk) => yield Ok(chunk),
                            Err(err) if config.filler_failure == FillerFailure::Skip => {
                                tracing::warn!(thread_id = %thread_id, error = %err, "Skipping filler phrase");
                                break;
                            }
                            Err(err) => {
                                record_failure(&thread_id, &err);
                                yield Err(err);
                                return;
                            }
                        }
                    }

                    if config.sound_effect_seconds > 0.0 {
                        let mut sound = effect.stream(config.effect_budget());
                        while let Some(chunk) = sound.next().await {
                            if !chunk.is_empty() {
                                yield Ok(chunk);
                            }
                        }
                    }
                }

                if let Some(text) = payload::final_text(step) {
                    candidate = Some(text);
                }
            }

            let answer = match candidate.filter(|text| !text.is_empty()) {
                Some(text) => text,
                None => {
                    counter!("phone_agent_fallback_total").increment(1);
                    tracing::warn!(thread_id = %thread_id, "No final text from reasoning, using fallback");
                    config.fallback_message.clone()
                }
            };
            tracing::info!(thread_id = %thread_id, response = %answer, "Final response");

            let mut speech = speak(
                synthesizer.as_ref(),
                &answer,
                config.port_timeout,
                SpeechPhase::Answer,
            );
            while let Some(item) = speech.next().await {
                if let Err(err) = &item {
                    record_failure(&thread_id, err);
                }
                let failed = item.is_err();
                yield item;
                if failed {
                    return;
                }
            }
        })
    }

    /// Run a turn to completion and gather its output
    pub async fn run_turn_collect(&self, audio: AudioChunk) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();
        let mut turn = self.run_turn(audio);
        while let Some(item) = turn.next().await {
            match item {
                Ok(chunk) => outcome.chunks.push(chunk),
                Err(err) => {
                    outcome.error = Some(err);
                    break;
                }
            }
        }
        outcome
    }
}

/// Builder for [`TurnOrchestrator`]
#[derive(Default)]
pub struct TurnOrchestratorBuilder {
    thread_id: Option<String>,
    transcriber: Option<Arc<dyn Transcriber>>,
    reasoner: Option<Arc<dyn ReasoningEngine>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    effect: Option<BoundedEffectPlayer>,
    config: Option<TurnConfig>,
}

impl TurnOrchestratorBuilder {
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn reasoner(mut self, reasoner: Arc<dyn ReasoningEngine>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Effect player; without one the effect stage emits nothing
    pub fn effect(mut self, effect: BoundedEffectPlayer) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn config(mut self, config: TurnConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<TurnOrchestrator, AgentError> {
        let thread_id = self
            .thread_id
            .filter(|id| !id.is_empty())
            .ok_or(AgentError::MissingDependency("thread_id"))?;
        let transcriber = self
            .transcriber
            .ok_or(AgentError::MissingDependency("transcriber"))?;
        let reasoner = self
            .reasoner
            .ok_or(AgentError::MissingDependency("reasoner"))?;
        let synthesizer = self
            .synthesizer
            .ok_or(AgentError::MissingDependency("synthesizer"))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        tracing::debug!(
            thread_id = %thread_id,
            transcriber = transcriber.name(),
            reasoner = reasoner.name(),
            synthesizer = synthesizer.name(),
            "Built turn orchestrator"
        );

        Ok(TurnOrchestrator {
            thread_id,
            transcriber,
            reasoner,
            synthesizer,
            effect: self.effect.unwrap_or_else(BoundedEffectPlayer::empty),
            config: Arc::new(config),
        })
    }
}

/// Whether this tool step still needs an audible cue.
///
/// Ids are remembered for the rest of the turn. A step whose every call id
/// was already announced is skipped; calls without an id always count.
fn claim_tool_round(step: &Value, announced: &mut HashSet<String>) -> bool {
    let ids = payload::tool_call_ids(step);
    let fresh = ids.is_empty()
        || ids
            .iter()
            .any(|id| id.as_ref().map_or(true, |id| !announced.contains(id)));
    announced.extend(ids.into_iter().flatten());
    fresh
}

/// Synthesize `text`, dropping empty chunks and tagging failures with `phase`
fn speak(
    synthesizer: &dyn SpeechSynthesizer,
    text: &str,
    deadline: Option<Duration>,
    phase: SpeechPhase,
) -> TurnStream {
    let mut audio = synthesizer.synthesize(text);

    Box::pin(stream! {
        loop {
            match next_within(&mut audio, deadline, SynthesisError::Timeout).await {
                None => break,
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => yield Ok(chunk),
                Some(Err(source)) => {
                    yield Err(TurnError::Synthesis { phase, source });
                    break;
                }
            }
        }
    })
}

async fn within<T, E, F>(deadline: Option<Duration>, fut: F, on_timeout: fn(Duration) -> E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
        None => fut.await,
    }
}

async fn next_within<S, T, E>(
    stream: &mut S,
    deadline: Option<Duration>,
    on_timeout: fn(Duration) -> E,
) -> Option<Result<T, E>>
where
    S: Stream<Item = Result<T, E>> + Unpin,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
            Ok(item) => item,
            Err(_) => Some(Err(on_timeout(limit))),
        },
        None => stream.next().await,
    }
}

fn record_failure(thread_id: &str, err: &TurnError) {
    counter!("phone_agent_turn_errors_total", "stage" => err.stage()).increment(1);
    tracing::error!(thread_id = %thread_id, stage = err.stage(), error = %err, "Turn failed");
}
