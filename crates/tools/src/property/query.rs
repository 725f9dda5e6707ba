//! Natural-language query parsing
//!
//! Pulls structured constraints ("two bedrooms", "under 300k", a known
//! neighborhood) out of the caller's words; what remains becomes ranking
//! keywords.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

const COUNT: &str = r"(\d+|one|two|three|four|five|six|seven|eight|nine|ten)";

static ROOMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{}[\s-]*(?:bed(?:room)?s?|rooms?)\b", COUNT)).unwrap()
});

static BATHS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{}[\s-]*(?:bath(?:room)?s?)\b", COUNT)).unwrap()
});

static MAX_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:under|below|less than|up to|max(?:imum)?|cheaper than)\s*(?:€|eur(?:os?)?)?\s*(\d[\d,.]*)\s*(k|thousand|m|million)?\b",
    )
    .unwrap()
});

static MIN_SQFT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d[\d,]*)\s*(?:sq\.?\s?ft|sqft|square\s+f(?:ee|oo)t)\b").unwrap()
});

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "have", "has", "want", "looking", "need",
    "find", "show", "any", "some", "there", "what", "which", "can", "you", "are", "apartment",
    "apartments", "flat", "flats", "place", "property", "properties", "home", "house", "near",
    "from", "than", "under", "below", "less", "about", "like", "would", "please", "me",
];

/// Constraints extracted from a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilters {
    pub location: Option<String>,
    pub min_rooms: Option<u32>,
    pub min_baths: Option<u32>,
    pub min_sqft: Option<u32>,
    pub max_price: Option<u64>,
    /// Lowercased content words used for ranking
    pub keywords: Vec<String>,
}

impl QueryFilters {
    /// Parse `query`, matching locations against `known_locations`
    pub fn parse(query: &str, known_locations: &[String]) -> Self {
        let lower = query.to_lowercase();

        // Longest name first so "Eixample Esquerra" wins over "Eixample"
        let mut locations: Vec<&String> = known_locations.iter().collect();
        locations.sort_by_key(|l| std::cmp::Reverse(l.len()));
        let location = locations
            .into_iter()
            .find(|l| !l.is_empty() && lower.contains(&l.to_lowercase()))
            .cloned();

        let min_rooms = ROOMS
            .captures(&lower)
            .and_then(|c| parse_count(&c[1]));
        let min_baths = BATHS
            .captures(&lower)
            .and_then(|c| parse_count(&c[1]));
        let min_sqft = MIN_SQFT
            .captures(&lower)
            .and_then(|c| c[1].replace(',', "").parse().ok());
        let max_price = MAX_PRICE.captures(&lower).and_then(|c| {
            let base: f64 = c[1].replace(',', "").trim_end_matches('.').parse().ok()?;
            let multiplier = match c.get(2).map(|m| m.as_str()) {
                Some("k") | Some("thousand") => 1_000.0,
                Some("m") | Some("million") => 1_000_000.0,
                _ => 1.0,
            };
            Some((base * multiplier) as u64)
        });

        let keywords = lower
            .unicode_words()
            .filter(|w| w.chars().count() > 2)
            .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
            .filter(|w| !STOPWORDS.contains(w))
            .map(str::to_string)
            .collect();

        Self {
            location,
            min_rooms,
            min_baths,
            min_sqft,
            max_price,
            keywords,
        }
    }
}

fn parse_count(token: &str) -> Option<u32> {
    match token {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        digits => digits.parse().ok(),
    }
}
