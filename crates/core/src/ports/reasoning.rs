use futures::stream::BoxStream;

use crate::{ConversationTurn, ReasoningError, StepEvent};

/// Lazy sequence of reasoning steps for one turn
pub type StepStream = BoxStream<'static, Result<StepEvent, ReasoningError>>;

/// Tool-calling reasoning collaborator.
///
/// Dialogue history keyed by `thread_id` belongs to the implementation; the
/// pipeline only passes the id through.
pub trait ReasoningEngine: Send + Sync {
    /// Start reasoning over `turn`, streaming step updates as they happen
    fn stream_turn(&self, turn: ConversationTurn) -> StepStream;

    /// The call on `thread_id` is over; drop any history kept for it
    fn end_thread(&self, _thread_id: &str) {}

    /// Backend name for logging
    fn name(&self) -> &str;
}
