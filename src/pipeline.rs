//! Query orchestration: classify, then route, search nearby, or look up a place

use crate::aggregation::AggregationPipeline;
use crate::config::MapQueryConfig;
use crate::history::{self, HistoryEntry, HistorySink};
use crate::http::build_client;
use crate::intent::{Intent, IntentClassifier};
use crate::location_resolver::{Gazetteer, LocationResolver, NominatimClient};
use crate::models::{AggregatedResult, Coordinate, PlaceResult, RoutePath, SearchOutcome};
use crate::poi::{OverpassClient, PoiSource};
use crate::routing::{OsrmClient, RouteEngine, RouteProvider};
use crate::weather::{OpenWeatherClient, WeatherProvider};
use crate::{MapQueryError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// External collaborators the pipeline talks to
#[derive(Clone)]
pub struct Services {
    pub gazetteer: Arc<dyn Gazetteer>,
    pub pois: Arc<dyn PoiSource>,
    pub weather: Arc<dyn WeatherProvider>,
    pub routes: Arc<dyn RouteProvider>,
    pub history: Arc<dyn HistorySink>,
}

impl Services {
    /// HTTP-backed services sharing one client
    pub fn from_config(config: &MapQueryConfig, history: Arc<dyn HistorySink>) -> Result<Self> {
        let client = build_client(&config.http)?;
        Ok(Self {
            gazetteer: Arc::new(NominatimClient::new(client.clone(), &config.gazetteer)),
            pois: Arc::new(OverpassClient::new(client.clone(), &config.spatial)),
            weather: Arc::new(OpenWeatherClient::new(client.clone(), &config.weather)?),
            routes: Arc::new(OsrmClient::new(client, &config.routing)),
            history,
        })
    }
}

pub struct SearchPipeline {
    classifier: IntentClassifier,
    resolver: LocationResolver<dyn Gazetteer>,
    aggregation: AggregationPipeline,
    routes: RouteEngine,
    history: Arc<dyn HistorySink>,
}

impl SearchPipeline {
    #[must_use]
    pub fn new(config: &MapQueryConfig, services: Services) -> Self {
        let resolver = LocationResolver::new(services.gazetteer);
        Self {
            classifier: IntentClassifier::new(&config.search.local_keywords),
            aggregation: AggregationPipeline::new(
                services.pois,
                services.weather,
                &config.spatial,
                &config.search,
            ),
            routes: RouteEngine::new(resolver.clone(), services.routes, &config.routing),
            resolver,
            history: services.history,
        }
    }

    #[must_use]
    pub fn classify(&self, query: &str) -> Option<Intent> {
        self.classifier.classify(query)
    }

    /// Run one query end to end.
    ///
    /// `Ok(None)` means the query was blank and nothing was done. A local
    /// keyword without a `reference` is rejected before any request is made.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        reference: Option<Coordinate>,
    ) -> Result<Option<SearchOutcome>> {
        let Some(intent) = self.classify(query) else {
            debug!("Blank query, nothing to do");
            return Ok(None);
        };
        debug!(?intent, "Classified query");

        if matches!(intent, Intent::LocalPoi { .. }) && reference.is_none() {
            return Err(MapQueryError::LocationRequired);
        }

        history::dispatch(
            &self.history,
            HistoryEntry {
                subject_text: intent.subject_text(),
                intent_kind: intent.kind(),
                timestamp: Utc::now(),
            },
        );

        let outcome = match intent {
            Intent::Route { start, end } => {
                SearchOutcome::Route(self.routes.compute_route(&start, &end).await?)
            }
            Intent::LocalPoi { keyword } => {
                let reference = reference.ok_or(MapQueryError::LocationRequired)?;
                SearchOutcome::Nearby(self.aggregation.near_me(reference, &keyword).await?)
            }
            Intent::Place { text } => {
                let place = self.resolver.resolve(&text).await?;
                SearchOutcome::Place(self.aggregation.around_place(place, None).await?)
            }
        };

        info!(kind = %outcome.intent_kind(), "Search completed");
        Ok(Some(outcome))
    }

    /// Describe a point: its address plus `keyword` matches around it.
    ///
    /// A point without an address is still explored under a reference name.
    #[instrument(skip(self))]
    pub async fn explore(&self, at: Coordinate, keyword: &str) -> Result<AggregatedResult> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(MapQueryError::validation("a keyword is required"));
        }
        let place = match self.resolver.reverse(at).await {
            Ok(place) => place,
            Err(MapQueryError::NotFound { .. }) => {
                debug!("No address for {}", at.format_coordinates());
                PlaceResult::reference(at)
            }
            Err(e) => return Err(e),
        };
        self.aggregation.near_place(place, &keyword).await
    }

    /// Route between two free-text places, bypassing classification
    pub async fn route(&self, start: &str, end: &str) -> Result<RoutePath> {
        let start = start.trim().to_lowercase();
        let end = end.trim().to_lowercase();
        if start.is_empty() || end.is_empty() {
            return Err(MapQueryError::validation("both route endpoints are required"));
        }
        self.routes.compute_route(&start, &end).await
    }
}
