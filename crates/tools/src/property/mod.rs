//! Property search
//!
//! The lookup the assistant runs while the caller hears the filler cue:
//! a natural-language query against an explicitly constructed index.

mod index;
mod query;
mod tool;

pub use index::InMemoryPropertyIndex;
pub use query::QueryFilters;
pub use tool::PropertySearchTool;
