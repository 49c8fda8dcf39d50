//! Normalization of raw spatial features

use super::PoiFilter;
use crate::models::{Coordinate, Poi};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

/// Tags that describe what a feature is, most specific first
const GENERIC_CATEGORY_KEYS: [&str; 5] = ["amenity", "shop", "tourism", "leisure", "office"];

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct RawCenter {
    pub lat: f64,
    pub lon: f64,
}

/// One element of a spatial query response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawElement {
    #[serde(rename = "type", default = "default_element_type")]
    pub element_type: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Present for ways and relations queried with `out center`
    pub center: Option<RawCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

fn default_element_type() -> String {
    "node".to_string()
}

impl RawElement {
    /// Valid direct coordinates, else a valid geometry center
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        let direct = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).ok(),
            _ => None,
        };
        direct.or_else(|| {
            self.center
                .and_then(|center| Coordinate::new(center.lat, center.lon).ok())
        })
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn generic_category(&self) -> Option<&str> {
        GENERIC_CATEGORY_KEYS.iter().find_map(|key| self.tag(key))
    }

    /// name, then the filter's category tag, then any category tag, then a
    /// placeholder naming the search keyword
    #[must_use]
    pub fn display_name(&self, filter: &PoiFilter) -> String {
        self.tag("name")
            .or_else(|| filter.category_key().and_then(|key| self.tag(key)))
            .or_else(|| self.generic_category())
            .map_or_else(|| format!("({} without name)", filter.label()), ToString::to_string)
    }

    #[must_use]
    pub fn kind(&self, filter: &PoiFilter) -> String {
        filter
            .category_key()
            .and_then(|key| self.tag(key))
            .or_else(|| self.generic_category())
            .unwrap_or_else(|| filter.label())
            .to_string()
    }

    /// Canonical POI, `None` when the element has no usable coordinate
    #[must_use]
    pub fn normalize(&self, filter: &PoiFilter, center: &Coordinate) -> Option<Poi> {
        let Some(coordinate) = self.coordinate() else {
            trace!(id = self.id, "Dropping element without coordinates");
            return None;
        };
        Some(Poi {
            id: format!("{}/{}", self.element_type, self.id),
            display_name: self.display_name(filter),
            kind: self.kind(filter),
            distance_m: center.distance_m(&coordinate),
            coordinate,
        })
    }
}

/// Normalize in source order, dropping coordinate-less elements, and keep at
/// most `max` results
#[must_use]
pub fn normalize_elements(
    elements: &[RawElement],
    filter: &PoiFilter,
    center: &Coordinate,
    max: usize,
) -> Vec<Poi> {
    elements
        .iter()
        .filter_map(|element| element.normalize(filter, center))
        .take(max)
        .collect()
}
