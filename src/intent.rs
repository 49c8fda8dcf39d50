//! Query intent classification
//!
//! A raw query is lower-cased and trimmed, then matched against three rules in
//! order: a route separator with text on both sides, an exact local keyword,
//! and finally a plain place lookup.

use crate::models::IntentKind;
use serde::Serialize;
use std::collections::HashSet;

/// Connector phrases meaning "to", checked in this order
pub const ROUTE_SEPARATORS: [&str; 2] = [" đến ", " to "];

/// Generic amenity words that trigger a nearby search
pub const DEFAULT_LOCAL_KEYWORDS: [&str; 11] = [
    "cà phê",
    "cafe",
    "nhà hàng",
    "restaurant",
    "atm",
    "cây xăng",
    "hotel",
    "khách sạn",
    "pizza",
    "phở",
    "bún",
];

/// The caller's inferred purpose for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Route { start: String, end: String },
    LocalPoi { keyword: String },
    Place { text: String },
}

impl Intent {
    #[must_use]
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Route { .. } => IntentKind::Route,
            Intent::LocalPoi { .. } => IntentKind::LocalPoi,
            Intent::Place { .. } => IntentKind::Place,
        }
    }

    /// Text recorded in search history
    #[must_use]
    pub fn subject_text(&self) -> String {
        match self {
            Intent::Route { start, end } => format!("{start} → {end}"),
            Intent::LocalPoi { keyword } => keyword.clone(),
            Intent::Place { text } => text.clone(),
        }
    }
}

/// Lower-case and trim a raw query
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Classify a query against a keyword vocabulary.
///
/// Returns `None` only for blank input; every other query maps to exactly one
/// intent, falling back to [`Intent::Place`].
#[must_use]
pub fn classify(query: &str, local_keywords: &HashSet<String>) -> Option<Intent> {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return None;
    }

    if let Some(intent) = detect_route(&normalized) {
        return Some(intent);
    }

    if local_keywords.contains(&normalized) {
        return Some(Intent::LocalPoi {
            keyword: normalized,
        });
    }

    Some(Intent::Place { text: normalized })
}

fn detect_route(normalized: &str) -> Option<Intent> {
    let separator = ROUTE_SEPARATORS
        .iter()
        .find(|sep| normalized.contains(*sep))?;

    // a repeated separator is ambiguous, not an error
    let parts: Vec<&str> = normalized.split(separator).map(str::trim).collect();
    match parts.as_slice() {
        [start, end] if !start.is_empty() && !end.is_empty() => Some(Intent::Route {
            start: (*start).to_string(),
            end: (*end).to_string(),
        }),
        _ => None,
    }
}

/// Classifier bound to a fixed keyword vocabulary
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    local_keywords: HashSet<String>,
}

impl IntentClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let local_keywords = keywords
            .into_iter()
            .map(|k| normalize_query(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { local_keywords }
    }

    #[must_use]
    pub fn classify(&self, query: &str) -> Option<Intent> {
        classify(query, &self.local_keywords)
    }

    #[must_use]
    pub fn is_local_keyword(&self, word: &str) -> bool {
        self.local_keywords.contains(&normalize_query(word))
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_KEYWORDS)
    }
}
