//! Tools the reasoning engine can call during a turn
//!
//! - `mcp`: tool trait, schemas and outputs
//! - `registry`: name-indexed tool lookup
//! - `property`: property index and the search tool built on it

pub mod mcp;
pub mod property;
pub mod registry;

pub use mcp::{
    ContentBlock, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema,
};
pub use property::{InMemoryPropertyIndex, PropertySearchTool, QueryFilters};
pub use registry::ToolRegistry;
