use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::SearchError;

/// A real estate listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: u64,
    pub description: String,
    pub baths: u32,
    pub rooms: u32,
    pub sqft: u32,
    pub location: String,
    /// Asking price in euros
    pub price: u64,
}

/// Property lookup invoked as a reasoning tool
#[async_trait]
pub trait PropertySearch: Send + Sync {
    /// Return at most `limit` listings matching a natural-language query
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Property>, SearchError>;
}
