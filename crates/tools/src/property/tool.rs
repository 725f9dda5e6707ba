//! Property search tool
//!
//! Exposes a [`PropertySearch`] service to the reasoning engine. A failed
//! lookup is reported to the model as "no results" so the conversation can
//! continue instead of dropping the call.

use std::sync::Arc;

use async_trait::async_trait;
use phone_agent_config::constants::search;
use phone_agent_core::PropertySearch;
use serde_json::{json, Value};

use crate::mcp::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

pub struct PropertySearchTool {
    service: Arc<dyn PropertySearch>,
    default_limit: usize,
    max_limit: usize,
}

impl PropertySearchTool {
    pub fn new(service: Arc<dyn PropertySearch>) -> Self {
        Self {
            service,
            default_limit: search::DEFAULT_LIMIT,
            max_limit: search::MAX_LIMIT,
        }
    }

    /// Override result limits; `max_limit` is raised to at least 1
    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }

    fn limit_from(&self, input: &Value) -> Result<usize, ToolError> {
        match input.get("limit") {
            None | Some(Value::Null) => Ok(self.default_limit),
            Some(value) => {
                let requested = value
                    .as_u64()
                    .ok_or_else(|| ToolError::invalid_params("limit must be a positive integer"))?;
                Ok((requested as usize).clamp(1, self.max_limit))
            }
        }
    }
}

#[async_trait]
impl Tool for PropertySearchTool {
    fn name(&self) -> &str {
        search::TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search available properties matching the caller's description, \
         such as neighborhood, number of rooms or budget."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "query",
                    PropertySchema::string("What the caller is looking for, in their words"),
                    true,
                )
                .property(
                    "limit",
                    PropertySchema::integer("Maximum number of properties to return")
                        .with_range(1.0, self.max_limit as f64),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let query = input
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::invalid_params("query is required"))?;
        let limit = self.limit_from(&input)?;

        let properties = match self.service.search(query, limit).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, query, "Property search failed, returning no results");
                Vec::new()
            }
        };

        tracing::debug!(query, limit, count = properties.len(), "Property search");

        Ok(ToolOutput::json(json!({
            "count": properties.len(),
            "properties": properties,
        })))
    }
}
