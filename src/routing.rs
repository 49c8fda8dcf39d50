//! Driving routes between geocoded places

use crate::config::{RoutingConfig, WaypointPolicy};
use crate::http::HttpClient;
use crate::location_resolver::{Gazetteer, LocationResolver};
use crate::models::{BoundingBox, Coordinate, RoutePath};
use crate::{MapQueryError, Result, polyline};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered coordinates to route through
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub coordinates: Vec<Coordinate>,
    pub alternatives: bool,
}

/// One path offered by the routing service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteCandidate {
    /// Encoded polyline at 1e5 precision
    pub geometry: String,
    /// Meters
    #[serde(rename = "distance")]
    pub distance_m: f64,
    /// Seconds
    #[serde(rename = "duration")]
    pub duration_s: f64,
}

/// Routing service, candidates ranked best first
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, request: &RouteRequest) -> Result<Vec<RouteCandidate>>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteCandidate>,
}

/// OSRM route service client
pub struct OsrmClient {
    client: HttpClient,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    #[must_use]
    pub fn new(client: HttpClient, config: &RoutingConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        }
    }

    #[must_use]
    pub fn build_url(&self, request: &RouteRequest) -> String {
        let coordinates = request
            .coordinates
            .iter()
            .map(|c| format!("{},{}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline&alternatives={}",
            self.base_url, self.profile, coordinates, request.alternatives
        )
    }
}

#[async_trait]
impl RouteProvider for OsrmClient {
    #[instrument(name = "route_request", skip(self, request), fields(points = request.coordinates.len()))]
    async fn route(&self, request: &RouteRequest) -> Result<Vec<RouteCandidate>> {
        let url = self.build_url(request);
        debug!("OSRM request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // OSRM reports "no route" as a 400 with a JSON code
        match serde_json::from_str::<OsrmResponse>(&body) {
            Ok(parsed) if parsed.code == "Ok" => Ok(parsed.routes),
            Ok(parsed) if matches!(parsed.code.as_str(), "NoRoute" | "NoSegment") => {
                debug!("OSRM found no route: {}", parsed.code);
                Ok(Vec::new())
            }
            Ok(parsed) => Err(MapQueryError::upstream(
                "OSRM",
                format!("{}: {}", parsed.code, parsed.message.unwrap_or_default()),
            )),
            Err(_) if !status.is_success() => {
                Err(MapQueryError::upstream("OSRM", format!("HTTP {status}")))
            }
            Err(e) => Err(MapQueryError::upstream(
                "OSRM",
                format!("unreadable response: {e}"),
            )),
        }
    }
}

/// Geocodes route endpoints and turns the first service candidate into a path
pub struct RouteEngine {
    resolver: LocationResolver<dyn Gazetteer>,
    provider: Arc<dyn RouteProvider>,
    waypoints: WaypointPolicy,
    alternatives: bool,
}

impl RouteEngine {
    #[must_use]
    pub fn new(
        resolver: LocationResolver<dyn Gazetteer>,
        provider: Arc<dyn RouteProvider>,
        config: &RoutingConfig,
    ) -> Self {
        Self {
            resolver,
            provider,
            waypoints: config.waypoints.clone(),
            alternatives: config.alternatives,
        }
    }

    /// Place texts to geocode, in visiting order
    fn stops<'a>(&'a self, start: &'a str, end: &'a str) -> Vec<&'a str> {
        let mut stops = vec![start];
        if let WaypointPolicy::Via(places) = &self.waypoints {
            stops.extend(places.iter().map(String::as_str));
        }
        stops.push(end);
        stops
    }

    /// Compute a driving route.
    ///
    /// Every stop must geocode; a failure is reported as
    /// [`MapQueryError::GeocodeFailed`] for that stop.
    #[instrument(skip(self))]
    pub async fn compute_route(&self, start: &str, end: &str) -> Result<RoutePath> {
        let stops = self.stops(start, end);
        let places = try_join_all(stops.iter().map(|text| async move {
            self.resolver
                .resolve(text)
                .await
                .map_err(|e| MapQueryError::geocode_failed(*text, e))
        }))
        .await?;

        let coordinates: Vec<Coordinate> = places.iter().map(|p| p.coordinate).collect();
        // the service only offers alternatives between two points
        let alternatives = self.alternatives && coordinates.len() == 2;
        let request = RouteRequest {
            coordinates,
            alternatives,
        };

        let candidates = self.provider.route(&request).await?;
        let offered = candidates.len();
        let Some(chosen) = candidates.into_iter().next() else {
            return Err(MapQueryError::route_not_found(format!("{start} → {end}")));
        };

        let points = polyline::decode(&chosen.geometry)?;
        let bounds = match BoundingBox::enclosing(&points) {
            Some(bounds) if points.len() >= 2 => bounds,
            _ => {
                return Err(MapQueryError::route_not_found(format!(
                    "degenerate geometry with {} point(s)",
                    points.len()
                )));
            }
        };

        let route = RoutePath {
            points,
            distance_km: chosen.distance_m / 1000.0,
            duration_hours: chosen.duration_s / 3600.0,
            bounds,
            alternatives: offered,
        };
        info!(
            "Route {} → {}: {:.2} km, {:.2} h, {} points ({} candidate(s))",
            start,
            end,
            route.display_distance_km(),
            route.display_duration_hours(),
            route.points.len(),
            offered
        );
        Ok(route)
    }
}
