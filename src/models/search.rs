//! Aggregated search results handed to the presentation layer

use super::{PlaceResult, Poi, RoutePath, WeatherReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A place together with nearby POIs and its weather
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregatedResult {
    pub place: PlaceResult,
    /// At most the configured maximum, in source order
    pub pois: Vec<Poi>,
    /// Weather for `place` only; POIs never carry weather
    pub weather: Option<WeatherReport>,
}

/// Result of one search, by intent
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutcome {
    Route(RoutePath),
    Nearby(AggregatedResult),
    Place(AggregatedResult),
}

impl SearchOutcome {
    #[must_use]
    pub fn intent_kind(&self) -> IntentKind {
        match self {
            SearchOutcome::Route(_) => IntentKind::Route,
            SearchOutcome::Nearby(_) => IntentKind::LocalPoi,
            SearchOutcome::Place(_) => IntentKind::Place,
        }
    }
}

/// Intent discriminant, recorded in search history
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Route,
    LocalPoi,
    Place,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntentKind::Route => "route",
            IntentKind::LocalPoi => "local_poi",
            IntentKind::Place => "place",
        };
        f.write_str(name)
    }
}
