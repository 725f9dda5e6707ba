//! In-memory property index
//!
//! Constructed once at startup from a record list or JSON file, then shared
//! behind an `Arc` by every call. Nothing mutates it after construction.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use phone_agent_core::{Property, PropertySearch, SearchError};
use unicode_segmentation::UnicodeSegmentation;

use super::query::QueryFilters;

#[derive(Debug, Clone)]
struct IndexedProperty {
    property: Property,
    terms: HashSet<String>,
}

/// Keyword-ranked property index with structured filters
#[derive(Debug, Clone, Default)]
pub struct InMemoryPropertyIndex {
    entries: Vec<IndexedProperty>,
    locations: Vec<String>,
}

impl InMemoryPropertyIndex {
    pub fn from_records(records: Vec<Property>) -> Self {
        let mut locations: Vec<String> = Vec::new();
        let entries = records
            .into_iter()
            .map(|property| {
                if !locations.iter().any(|l| l.eq_ignore_ascii_case(&property.location)) {
                    locations.push(property.location.clone());
                }
                let text = format!("{} {}", property.description, property.location).to_lowercase();
                let terms = text.unicode_words().map(str::to_string).collect();
                IndexedProperty { property, terms }
            })
            .collect();

        Self { entries, locations }
    }

    /// Load a JSON array of property records
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Backend(format!("{}: {}", path.display(), e)))?;
        let records: Vec<Property> = serde_json::from_str(&raw)
            .map_err(|e| SearchError::Backend(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), count = records.len(), "Ingested properties");
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Neighborhoods present in the index
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    fn matches(property: &Property, filters: &QueryFilters) -> bool {
        if let Some(location) = &filters.location {
            if !property.location.eq_ignore_ascii_case(location) {
                return false;
            }
        }
        filters.min_rooms.map_or(true, |min| property.rooms >= min)
            && filters.min_baths.map_or(true, |min| property.baths >= min)
            && filters.min_sqft.map_or(true, |min| property.sqft >= min)
            && filters.max_price.map_or(true, |max| property.price <= max)
    }

    /// Rank by keyword overlap, then larger size, then lower price
    pub fn query(&self, query: &str, limit: usize) -> Vec<Property> {
        let filters = QueryFilters::parse(query, &self.locations);
        tracing::debug!(?filters, "Parsed property query");

        let mut scored: Vec<(usize, &Property)> = self
            .entries
            .iter()
            .filter(|entry| Self::matches(&entry.property, &filters))
            .map(|entry| {
                let score = filters
                    .keywords
                    .iter()
                    .filter(|k| entry.terms.contains(k.as_str()))
                    .count();
                (score, &entry.property)
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| b.sqft.cmp(&a.sqft))
                .then_with(|| a.price.cmp(&b.price))
                .then_with(|| a.id.cmp(&b.id))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, property)| property.clone())
            .collect()
    }
}

#[async_trait]
impl PropertySearch for InMemoryPropertyIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Property>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }
        Ok(self.query(query, limit))
    }
}
