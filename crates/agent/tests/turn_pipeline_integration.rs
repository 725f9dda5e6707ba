//! Integration tests for the turn pipeline (STT -> reasoning + tools -> TTS)
//!
//! Stub ports tag their audio with a constant sample value so the order of
//! emitted segments can be read back from the output stream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};

use phone_agent_agent::{SpeechPhase, TurnConfig, TurnError, TurnOrchestrator, TurnOutcome};
use phone_agent_config::FillerFailure;
use phone_agent_core::{
    AudioChunk, AudioStream, ConversationTurn, ReasoningEngine, ReasoningError,
    SpeechSynthesizer, StepEvent, StepStream, SynthesisError, TranscriptionError,
};
use phone_agent_pipeline::{BoundedEffectPlayer, ScriptedTranscriber};

const FILLER: &str = "FILLER";
const FALLBACK: &str = "FALLBACK";

const FILLER_TAG: f32 = 0.1;
const ANSWER_TAG: f32 = 0.2;
const FALLBACK_TAG: f32 = 0.3;
const EFFECT_TAG: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Filler,
    Answer,
    Fallback,
    Effect,
    Other,
}

fn classify(chunk: &AudioChunk) -> Segment {
    let value = chunk.samples()[0];
    let is = |tag: f32| (value - tag).abs() < 1e-6;
    if is(FILLER_TAG) {
        Segment::Filler
    } else if is(ANSWER_TAG) {
        Segment::Answer
    } else if is(FALLBACK_TAG) {
        Segment::Fallback
    } else if is(EFFECT_TAG) {
        Segment::Effect
    } else {
        Segment::Other
    }
}

/// Consecutive chunks of the same kind merged into `(kind, samples)`
fn segments(outcome: &TurnOutcome) -> Vec<(Segment, usize)> {
    let mut merged: Vec<(Segment, usize)> = Vec::new();
    for chunk in &outcome.chunks {
        let kind = classify(chunk);
        if let Some((last, samples)) = merged.last_mut() {
            if *last == kind {
                *samples += chunk.len();
                continue;
            }
        }
        merged.push((kind, chunk.len()));
    }
    merged
}

fn kinds(outcome: &TurnOutcome) -> Vec<Segment> {
    segments(outcome).into_iter().map(|(kind, _)| kind).collect()
}

/// Synthesizer emitting two tagged 200-sample chunks per request
#[derive(Default)]
struct TaggedSynthesizer {
    fail_on: Option<String>,
    hang_on: Option<String>,
    empty_first: bool,
    calls: Mutex<Vec<String>>,
}

impl TaggedSynthesizer {
    fn failing_on(text: &str) -> Self {
        Self {
            fail_on: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// Stalls after the first chunk for `text`
    fn hanging_on(text: &str) -> Self {
        Self {
            hang_on: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl SpeechSynthesizer for TaggedSynthesizer {
    fn synthesize(&self, text: &str) -> AudioStream {
        self.calls.lock().push(text.to_string());
        let tag = match text {
            FILLER => FILLER_TAG,
            FALLBACK => FALLBACK_TAG,
            _ => ANSWER_TAG,
        };

        let mut items = Vec::new();
        if self.empty_first {
            items.push(Ok(AudioChunk::new(16000, Vec::new())));
        }
        items.push(Ok(AudioChunk::new(16000, vec![tag; 200])));
        if self.hang_on.as_deref() == Some(text) {
            return Box::pin(stream::iter(items).chain(stream::pending()));
        }
        if self.fail_on.as_deref() == Some(text) {
            items.push(Err(SynthesisError::backend("voice unavailable")));
        } else {
            items.push(Ok(AudioChunk::new(16000, vec![tag; 200])));
        }
        Box::pin(stream::iter(items))
    }

    fn name(&self) -> &str {
        "tagged"
    }
}

/// Reasoner replaying a fixed step list, optionally never finishing
#[derive(Default)]
struct ScriptedReasoner {
    steps: Vec<Result<StepEvent, ReasoningError>>,
    hang_after: bool,
    calls: AtomicUsize,
    guard: Arc<()>,
}

impl ScriptedReasoner {
    fn new(steps: Vec<Result<StepEvent, ReasoningError>>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    fn hanging(steps: Vec<Result<StepEvent, ReasoningError>>) -> Self {
        Self {
            steps,
            hang_after: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Live step streams still holding the guard
    fn open_streams(&self) -> usize {
        Arc::strong_count(&self.guard) - 1
    }
}

impl ReasoningEngine for ScriptedReasoner {
    fn stream_turn(&self, _turn: ConversationTurn) -> StepStream {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let guard = Arc::clone(&self.guard);
        let steps = stream::iter(self.steps.clone());
        let tail = if self.hang_after {
            stream::pending().boxed()
        } else {
            stream::empty().boxed()
        };
        Box::pin(steps.chain(tail).map(move |step| {
            let _held = &guard;
            step
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn tool_step(id: Option<&str>) -> Result<StepEvent, ReasoningError> {
    let mut call = json!({"name": "search_property_tool", "args": {"query": "flat"}});
    if let Some(id) = id {
        call["id"] = Value::from(id);
    }
    Ok(StepEvent::Model(json!({
        "messages": [{"role": "assistant", "content": "", "tool_calls": [call]}]
    })))
}

fn answer_step(text: &str) -> Result<StepEvent, ReasoningError> {
    Ok(StepEvent::Model(json!({
        "messages": [{"role": "assistant", "content": text}]
    })))
}

fn tools_step() -> Result<StepEvent, ReasoningError> {
    Ok(StepEvent::Tools(json!({
        "messages": [{"role": "tool", "content": "{\"count\":0}"}]
    })))
}

/// Effect source: `count` chunks of one second each at 1 kHz
fn effect_player(count: usize) -> BoundedEffectPlayer {
    BoundedEffectPlayer::new(
        (0..count)
            .map(|_| AudioChunk::new(1000, vec![EFFECT_TAG; 1000]))
            .collect(),
    )
}

fn config(sound_effect_seconds: f64) -> TurnConfig {
    TurnConfig {
        tool_use_message: FILLER.to_string(),
        fallback_message: FALLBACK.to_string(),
        sound_effect_seconds,
        ..TurnConfig::default()
    }
}

fn orchestrator(
    reasoner: Arc<ScriptedReasoner>,
    synthesizer: Arc<TaggedSynthesizer>,
    config: TurnConfig,
) -> TurnOrchestrator {
    TurnOrchestrator::builder()
        .thread_id("call-1")
        .transcriber(Arc::new(ScriptedTranscriber::new("any flats?")))
        .reasoner(reasoner)
        .synthesizer(synthesizer)
        .effect(effect_player(5))
        .config(config)
        .build()
        .unwrap()
}

fn utterance() -> AudioChunk {
    AudioChunk::new(16000, vec![0.05; 3200])
}

/// Tool step then final text: filler, effect, answer, nothing else
#[tokio::test]
async fn test_filler_effect_then_answer() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("c1")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, Arc::clone(&synthesizer), config(2.0))
        .run_turn_collect(utterance())
        .await;

    assert!(outcome.is_ok());
    assert_eq!(
        segments(&outcome),
        vec![
            (Segment::Filler, 400),
            (Segment::Effect, 2000),
            (Segment::Answer, 400)
        ]
    );
    assert_eq!(synthesizer.calls(), vec![FILLER, "X"]);
}

#[tokio::test]
async fn test_effect_disabled() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("c1")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, synthesizer, config(0.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(kinds(&outcome), vec![Segment::Filler, Segment::Answer]);
}

#[tokio::test]
async fn test_fallback_when_no_text() {
    let steps = vec![
        Ok(StepEvent::Model(json!({"messages": [{"role": "assistant"}]}))),
        tools_step(),
    ];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, Arc::clone(&synthesizer), config(1.0))
        .run_turn_collect(utterance())
        .await;

    assert!(outcome.is_ok());
    assert_eq!(kinds(&outcome), vec![Segment::Fallback]);
    assert_eq!(synthesizer.calls(), vec![FALLBACK]);
}

#[tokio::test]
async fn test_last_model_text_wins() {
    let steps = vec![answer_step("first"), answer_step("second")];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let _ = orchestrator(reasoner, Arc::clone(&synthesizer), config(1.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(synthesizer.calls(), vec!["second"]);
}

#[tokio::test]
async fn test_step_without_text_keeps_candidate() {
    let steps = vec![
        answer_step("kept"),
        Ok(StepEvent::Model(json!({"messages": []}))),
    ];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let _ = orchestrator(reasoner, Arc::clone(&synthesizer), config(1.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(synthesizer.calls(), vec!["kept"]);
}

#[tokio::test]
async fn test_transcription_failure_stops_turn() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let orchestrator = TurnOrchestrator::builder()
        .thread_id("call-1")
        .transcriber(Arc::new(ScriptedTranscriber::failing("no signal")))
        .reasoner(Arc::clone(&reasoner) as Arc<dyn ReasoningEngine>)
        .synthesizer(Arc::clone(&synthesizer) as Arc<dyn SpeechSynthesizer>)
        .config(config(1.0))
        .build()
        .unwrap();

    let outcome = orchestrator.run_turn_collect(utterance()).await;

    assert!(outcome.chunks.is_empty());
    assert_eq!(
        outcome.error,
        Some(TurnError::Transcription(TranscriptionError::backend("no signal")))
    );
    assert_eq!(reasoner.calls(), 0);
    assert!(synthesizer.calls().is_empty());
}

/// Each tool round gets its own filler and its own full effect budget
#[tokio::test]
async fn test_two_tool_rounds_each_budgeted() {
    let steps = vec![
        tool_step(Some("a")),
        tools_step(),
        tool_step(Some("b")),
        tools_step(),
        answer_step("X"),
    ];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, Arc::clone(&synthesizer), config(1.5))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(
        segments(&outcome),
        vec![
            (Segment::Filler, 400),
            (Segment::Effect, 1500),
            (Segment::Filler, 400),
            (Segment::Effect, 1500),
            (Segment::Answer, 400),
        ]
    );
    assert_eq!(synthesizer.calls(), vec![FILLER, FILLER, "X"]);
}

#[tokio::test]
async fn test_announced_tool_call_not_repeated() {
    let steps = vec![tool_step(Some("a")), tool_step(Some("a")), answer_step("X")];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, synthesizer, config(0.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(kinds(&outcome), vec![Segment::Filler, Segment::Answer]);
}

#[tokio::test]
async fn test_tool_calls_without_ids_always_announced() {
    let steps = vec![tool_step(None), tool_step(None), answer_step("X")];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, Arc::clone(&synthesizer), config(0.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(synthesizer.calls(), vec![FILLER, FILLER, "X"]);
    assert!(outcome.is_ok());
}

/// Audio already played stays delivered when reasoning fails later
#[tokio::test]
async fn test_reasoning_failure_keeps_partial_audio() {
    let steps = vec![tool_step(Some("a")), Err(ReasoningError::backend("model crashed"))];
    let reasoner = Arc::new(ScriptedReasoner::new(steps));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(reasoner, Arc::clone(&synthesizer), config(1.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(kinds(&outcome), vec![Segment::Filler, Segment::Effect]);
    assert_eq!(
        outcome.error,
        Some(TurnError::Reasoning(ReasoningError::backend("model crashed")))
    );
    assert_eq!(synthesizer.calls(), vec![FILLER]);
}

#[tokio::test]
async fn test_filler_failure_aborts_by_default() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("a")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::failing_on(FILLER));
    let outcome = orchestrator(reasoner, Arc::clone(&synthesizer), config(1.0))
        .run_turn_collect(utterance())
        .await;

    assert_eq!(segments(&outcome), vec![(Segment::Filler, 200)]);
    assert!(matches!(
        outcome.error,
        Some(TurnError::Synthesis {
            phase: SpeechPhase::Filler,
            ..
        })
    ));
    assert_eq!(synthesizer.calls(), vec![FILLER]);
}

#[tokio::test]
async fn test_filler_failure_skip_policy() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("a")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::failing_on(FILLER));
    let outcome = orchestrator(
        reasoner,
        synthesizer,
        config(1.0).with_filler_failure(FillerFailure::Skip),
    )
    .run_turn_collect(utterance())
    .await;

    assert!(outcome.is_ok());
    assert_eq!(
        segments(&outcome),
        vec![
            (Segment::Filler, 200),
            (Segment::Effect, 1000),
            (Segment::Answer, 400)
        ]
    );
}

#[tokio::test]
async fn test_answer_failure_surfaced() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::failing_on("X"));
    let outcome = orchestrator(
        reasoner,
        synthesizer,
        config(1.0).with_filler_failure(FillerFailure::Skip),
    )
    .run_turn_collect(utterance())
    .await;

    assert_eq!(segments(&outcome), vec![(Segment::Answer, 200)]);
    assert!(matches!(
        outcome.error,
        Some(TurnError::Synthesis {
            phase: SpeechPhase::Answer,
            ..
        })
    ));
}

#[tokio::test]
async fn test_empty_chunks_never_forwarded() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("a")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer {
        empty_first: true,
        ..TaggedSynthesizer::default()
    });
    let outcome = orchestrator(reasoner, synthesizer, config(0.25))
        .run_turn_collect(utterance())
        .await;

    assert!(outcome.is_ok());
    assert!(outcome.chunks.iter().all(|c| !c.is_empty()));
    assert_eq!(
        segments(&outcome),
        vec![
            (Segment::Filler, 400),
            (Segment::Effect, 250),
            (Segment::Answer, 400)
        ]
    );
}

/// Dropping the turn mid-way releases the reasoning stream
#[tokio::test]
async fn test_abandoned_turn_releases_streams() {
    let reasoner = Arc::new(ScriptedReasoner::hanging(vec![tool_step(Some("a"))]));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let orchestrator = orchestrator(Arc::clone(&reasoner), synthesizer, config(1.0));

    let mut turn = orchestrator.run_turn(utterance());
    let first = turn.next().await.unwrap().unwrap();
    assert_eq!(classify(&first), Segment::Filler);
    assert_eq!(reasoner.open_streams(), 1);

    drop(turn);
    assert_eq!(reasoner.open_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reasoning_step_timeout() {
    let reasoner = Arc::new(ScriptedReasoner::hanging(vec![tool_step(Some("a"))]));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let outcome = orchestrator(
        reasoner,
        synthesizer,
        config(0.0).with_port_timeout(Duration::from_millis(500)),
    )
    .run_turn_collect(utterance())
    .await;

    assert_eq!(kinds(&outcome), vec![Segment::Filler]);
    assert_eq!(
        outcome.error,
        Some(TurnError::Reasoning(ReasoningError::Timeout(
            Duration::from_millis(500)
        )))
    );
}

/// A voice that stops producing audio mid-answer is cut off by the port timeout
#[tokio::test(start_paused = true)]
async fn test_answer_synthesis_stall_times_out() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::hanging_on("X"));
    let outcome = orchestrator(
        reasoner,
        Arc::clone(&synthesizer),
        config(1.0).with_port_timeout(Duration::from_millis(500)),
    )
    .run_turn_collect(utterance())
    .await;

    assert_eq!(segments(&outcome), vec![(Segment::Answer, 200)]);
    assert_eq!(
        outcome.error,
        Some(TurnError::Synthesis {
            phase: SpeechPhase::Answer,
            source: SynthesisError::Timeout(Duration::from_millis(500)),
        })
    );
    assert_eq!(synthesizer.calls(), vec!["X"]);
}

#[tokio::test(start_paused = true)]
async fn test_filler_synthesis_stall_aborts_turn() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("a")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::hanging_on(FILLER));
    let outcome = orchestrator(
        reasoner,
        Arc::clone(&synthesizer),
        config(1.0).with_port_timeout(Duration::from_millis(500)),
    )
    .run_turn_collect(utterance())
    .await;

    assert_eq!(segments(&outcome), vec![(Segment::Filler, 200)]);
    assert_eq!(
        outcome.error,
        Some(TurnError::Synthesis {
            phase: SpeechPhase::Filler,
            source: SynthesisError::Timeout(Duration::from_millis(500)),
        })
    );
    assert_eq!(synthesizer.calls(), vec![FILLER]);
}

#[tokio::test]
async fn test_concurrent_turns_are_independent() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![tool_step(Some("a")), answer_step("X")]));
    let synthesizer = Arc::new(TaggedSynthesizer::default());
    let orchestrator = orchestrator(Arc::clone(&reasoner), synthesizer, config(1.0));

    let (first, second) = tokio::join!(
        orchestrator.run_turn_collect(utterance()),
        orchestrator.run_turn_collect(utterance())
    );

    assert_eq!(segments(&first), segments(&second));
    assert_eq!(reasoner.calls(), 2);
}
