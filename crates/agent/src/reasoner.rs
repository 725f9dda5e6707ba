//! Keyword tool-calling reasoner
//!
//! Offline stand-in for an LLM agent. It streams the same step shapes a
//! tool-calling agent does (`model` with `tool_calls`, `tools`, final
//! `model`) so the whole turn pipeline can run without a model.

use std::collections::HashMap;
use std::sync::Arc;

use async_stream::stream;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use phone_agent_config::constants::search;
use phone_agent_core::{ConversationTurn, ReasoningEngine, ReasoningError, StepEvent, StepStream};
use phone_agent_tools::ToolRegistry;
use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

static HOUSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(apartments?|flats?|houses?|homes?|propert(?:y|ies)|bedrooms?|rooms?|studios?|rent|buy|listings?)\b",
    )
    .unwrap()
});

const GREETING_REPLY: &str = "I can help you find a property. Tell me the neighborhood, \
     how many rooms you need or your budget.";

const NO_MATCH_REPLY: &str = "I couldn't find any property matching that right now.";

type History = Arc<Mutex<HashMap<String, Vec<Value>>>>;

/// Routes housing questions to the property search tool
#[derive(Clone)]
pub struct KeywordToolReasoner {
    tools: ToolRegistry,
    history: History,
}

impl KeywordToolReasoner {
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            history: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Messages recorded for a thread, oldest first
    pub fn history(&self, thread_id: &str) -> Vec<Value> {
        self.history
            .lock()
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop the history of a finished thread
    pub fn forget(&self, thread_id: &str) -> bool {
        self.history.lock().remove(thread_id).is_some()
    }

    fn wants_search(&self, text: &str) -> bool {
        HOUSING.is_match(text) && self.tools.get(search::TOOL_NAME).is_some()
    }
}

fn record(history: &History, thread_id: &str, messages: impl IntoIterator<Item = Value>) {
    history
        .lock()
        .entry(thread_id.to_string())
        .or_default()
        .extend(messages);
}

/// Spoken summary of the best match in a search tool result
fn describe_result(result: Option<&Value>) -> String {
    let Some(best) = result.and_then(|r| r.get("properties")).and_then(|p| p.get(0)) else {
        return NO_MATCH_REPLY.to_string();
    };

    let field = |name: &str| best.get(name).and_then(Value::as_u64).unwrap_or_default();
    let location = best.get("location").and_then(Value::as_str).unwrap_or("the city");
    let description = best.get("description").and_then(Value::as_str).unwrap_or_default();

    format!(
        "I found a place in {} with {} rooms and {} bathrooms, {} square feet, listed at {} euros. {}",
        location,
        field("rooms"),
        field("baths"),
        field("sqft"),
        field("price"),
        description
    )
    .trim_end()
    .to_string()
}

impl ReasoningEngine for KeywordToolReasoner {
    fn stream_turn(&self, turn: ConversationTurn) -> StepStream {
        let history = Arc::clone(&self.history);
        let tools = self.tools.clone();
        let wants_search = self.wants_search(&turn.utterance_text);
        let ConversationTurn {
            thread_id,
            utterance_text,
        } = turn;

        Box::pin(stream! {
            record(&history, &thread_id, [json!({"role": "user", "content": utterance_text})]);

            if !wants_search {
                let reply = json!({"role": "assistant", "content": GREETING_REPLY});
                record(&history, &thread_id, [reply.clone()]);
                yield Ok(StepEvent::Model(json!({"messages": [reply]})));
                return;
            }

            let call_id = format!("call_{}", Uuid::new_v4().simple());
            let args = json!({"query": utterance_text});
            let request = json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{"id": call_id, "name": search::TOOL_NAME, "args": args}],
            });
            yield Ok(StepEvent::Model(json!({"messages": [request.clone()]})));

            let output = match tools.execute(search::TOOL_NAME, args).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(thread_id = %thread_id, error = %e, "Tool call failed");
                    yield Err(ReasoningError::Tool(e.to_string()));
                    return;
                }
            };

            let tool_message = json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": search::TOOL_NAME,
                "content": output.as_text(),
            });
            yield Ok(StepEvent::Tools(json!({"messages": [tool_message.clone()]})));

            let reply = json!({"role": "assistant", "content": describe_result(output.json_value())});
            record(&history, &thread_id, [request, tool_message, reply.clone()]);
            yield Ok(StepEvent::Model(json!({"messages": [reply]})));
        })
    }

    fn end_thread(&self, thread_id: &str) {
        if self.forget(thread_id) {
            tracing::debug!(thread_id = %thread_id, "Thread history released");
        }
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
