//! Location Resolution Module
//!
//! Resolves free-text place names to a single best-match coordinate through a
//! country-scoped gazetteer lookup.

use crate::config::GazetteerConfig;
use crate::http::{HttpClient, read_json};
use crate::models::{Coordinate, PlaceResult};
use crate::{MapQueryError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// A candidate exactly as the gazetteer returns it
#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerCandidate {
    pub osm_id: Option<u64>,
    #[serde(default)]
    pub osm_type: Option<String>,
    /// Latitude as text
    pub lat: String,
    /// Longitude as text
    pub lon: String,
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl GazetteerCandidate {
    /// Convert into a place, parsing the textual coordinates
    pub fn into_place(self) -> Result<PlaceResult> {
        let coordinate = Coordinate::parse(&self.lat, &self.lon)?;
        let id = match (self.osm_type.as_deref(), self.osm_id) {
            (Some(t), Some(id)) => format!("{t}/{id}"),
            (None, Some(id)) => id.to_string(),
            _ => coordinate.format_coordinates(),
        };
        Ok(PlaceResult {
            id,
            coordinate,
            display_name: self.display_name,
            kind: self.kind.unwrap_or_else(|| "place".to_string()),
        })
    }
}

/// Free-text place search, ranked best first
#[async_trait]
pub trait Gazetteer: Send + Sync {
    async fn search(&self, text: &str) -> Result<Vec<GazetteerCandidate>>;

    /// Nearest addressable feature, `None` when nothing is there
    async fn reverse(&self, at: Coordinate) -> Result<Option<GazetteerCandidate>>;
}

/// Reverse lookups answer with an object, or with `{"error": ..}` when empty
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Found(GazetteerCandidate),
    Missing { error: String },
}

/// Nominatim search client
pub struct NominatimClient {
    client: HttpClient,
    base_url: String,
    country_codes: String,
}

impl NominatimClient {
    #[must_use]
    pub fn new(client: HttpClient, config: &GazetteerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country_codes: config.country_codes.clone(),
        }
    }
}

#[async_trait]
impl Gazetteer for NominatimClient {
    #[instrument(name = "gazetteer_search", skip(self))]
    async fn search(&self, text: &str) -> Result<Vec<GazetteerCandidate>> {
        let url = format!(
            "{}/search?q={}&format=json&countrycodes={}&limit=1&addressdetails=1",
            self.base_url,
            urlencoding::encode(text),
            urlencoding::encode(&self.country_codes)
        );
        debug!("Nominatim request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        read_json("Nominatim", response).await
    }

    #[instrument(name = "gazetteer_reverse", skip(self))]
    async fn reverse(&self, at: Coordinate) -> Result<Option<GazetteerCandidate>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&zoom=18",
            self.base_url, at.lat, at.lon
        );
        debug!("Nominatim request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        match read_json("Nominatim", response).await? {
            ReverseResponse::Found(candidate) => Ok(Some(candidate)),
            ReverseResponse::Missing { error } => {
                debug!("Nothing to reverse geocode: {}", error);
                Ok(None)
            }
        }
    }
}

/// Service for resolving place names
pub struct LocationResolver<G: ?Sized> {
    gazetteer: std::sync::Arc<G>,
}

impl<G: Gazetteer + ?Sized> LocationResolver<G> {
    pub fn new(gazetteer: std::sync::Arc<G>) -> Self {
        Self { gazetteer }
    }

    /// Resolve a place name to its rank-1 gazetteer match.
    ///
    /// Zero candidates, or a first candidate whose coordinates do not parse,
    /// is [`MapQueryError::NotFound`].
    #[instrument(skip(self))]
    pub async fn resolve(&self, text: &str) -> Result<PlaceResult> {
        let candidates = self.gazetteer.search(text).await?;

        // Use the first (best) result
        let Some(best) = candidates.into_iter().next() else {
            debug!("Gazetteer returned no candidates");
            return Err(MapQueryError::not_found(text));
        };

        let place = best.into_place().map_err(|e| {
            debug!("Discarding candidate with bad coordinates: {}", e);
            MapQueryError::not_found(text)
        })?;

        debug!(
            "Found location: {} ({:.4}, {:.4})",
            place.display_name, place.coordinate.lat, place.coordinate.lon
        );
        Ok(place)
    }
}

impl<G: Gazetteer + ?Sized> LocationResolver<G> {
    /// Address of a coordinate. The place keeps the queried coordinate; only
    /// its name and identity come from the gazetteer.
    #[instrument(skip(self))]
    pub async fn reverse(&self, at: Coordinate) -> Result<PlaceResult> {
        let label = at.format_coordinates();
        let Some(candidate) = self.gazetteer.reverse(at).await? else {
            return Err(MapQueryError::not_found(label));
        };
        let place = candidate
            .into_place()
            .map_err(|_| MapQueryError::not_found(label))?;
        Ok(PlaceResult {
            coordinate: at,
            ..place
        })
    }
}

impl<G: ?Sized> Clone for LocationResolver<G> {
    fn clone(&self) -> Self {
        Self {
            gazetteer: self.gazetteer.clone(),
        }
    }
}
