//! Conversation Types
//!
//! A turn handed to the reasoning engine and the step events it streams back.

use serde_json::Value;

/// Step label used by the reasoning engine for model output
pub const MODEL_STEP: &str = "model";

/// Step label used by the reasoning engine for tool execution output
pub const TOOLS_STEP: &str = "tools";

/// One caller utterance addressed to a conversation thread.
///
/// `thread_id` is assigned once per call and passed unchanged on every turn
/// so the reasoning engine can keep dialogue history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub thread_id: String,
    pub utterance_text: String,
}

impl ConversationTurn {
    pub fn new(thread_id: impl Into<String>, utterance_text: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            utterance_text: utterance_text.into(),
        }
    }
}

/// One increment of progress reported by the reasoning engine.
///
/// Payloads stay opaque JSON; interpreting them is the job of the agent's
/// payload adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// Model output: tool invocations, terminal content, or both
    Model(Value),
    /// Tool execution results
    Tools(Value),
    /// Any step kind not known to the pipeline
    Unrecognized { label: String, payload: Value },
}

impl StepEvent {
    /// Build from a raw `(label, payload)` pair
    pub fn from_parts(label: impl Into<String>, payload: Value) -> Self {
        let label = label.into();
        match label.as_str() {
            MODEL_STEP => StepEvent::Model(payload),
            TOOLS_STEP => StepEvent::Tools(payload),
            _ => StepEvent::Unrecognized { label, payload },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StepEvent::Model(_) => MODEL_STEP,
            StepEvent::Tools(_) => TOOLS_STEP,
            StepEvent::Unrecognized { label, .. } => label,
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            StepEvent::Model(payload) | StepEvent::Tools(payload) => payload,
            StepEvent::Unrecognized { payload, .. } => payload,
        }
    }
}
