//! Concurrent POI and weather aggregation around a coordinate
//!
//! Once a coordinate is known the spatial query, the current-weather fetch and
//! (around resolved places) the forecast fetch are spawned together. The join
//! is all-or-nothing: the first failing branch fails the aggregation, and the
//! siblings still in flight are left to finish with their results dropped.

use crate::config::{SearchConfig, SpatialConfig};
use crate::models::{AggregatedResult, Coordinate, PlaceResult, WeatherReport};
use crate::poi::{PoiFilter, PoiSource, SpatialQuery, normalize_elements};
use crate::weather::WeatherProvider;
use crate::{MapQueryError, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, instrument};

/// What to fetch around a place
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub place: PlaceResult,
    pub filter: PoiFilter,
    pub radius_m: u32,
    pub with_forecast: bool,
}

pub struct AggregationPipeline {
    pois: Arc<dyn PoiSource>,
    weather: Arc<dyn WeatherProvider>,
    near_radius_m: u32,
    place_radius_m: u32,
    max_pois: usize,
}

impl AggregationPipeline {
    #[must_use]
    pub fn new(
        pois: Arc<dyn PoiSource>,
        weather: Arc<dyn WeatherProvider>,
        spatial: &SpatialConfig,
        search: &SearchConfig,
    ) -> Self {
        Self {
            pois,
            weather,
            near_radius_m: spatial.near_radius_m,
            place_radius_m: spatial.place_radius_m,
            max_pois: search.max_pois,
        }
    }

    /// Aggregate around a coordinate. With a keyword this is a nearby search
    /// (near radius, no forecast); without one the coordinate is treated as a
    /// place (wide radius, forecast included).
    pub async fn aggregate(
        &self,
        coordinate: Coordinate,
        keyword: Option<&str>,
    ) -> Result<AggregatedResult> {
        match keyword {
            Some(keyword) => self.near_me(coordinate, keyword).await,
            None => self.around_place(PlaceResult::reference(coordinate), None).await,
        }
    }

    /// Nearby search around the caller's own position
    pub async fn near_me(&self, reference: Coordinate, keyword: &str) -> Result<AggregatedResult> {
        self.near_place(PlaceResult::reference(reference), keyword).await
    }

    /// Nearby search around an arbitrary point (near radius, no forecast)
    pub async fn near_place(&self, place: PlaceResult, keyword: &str) -> Result<AggregatedResult> {
        self.run(AggregationRequest {
            place,
            filter: PoiFilter::for_keyword(keyword),
            radius_m: self.near_radius_m,
            with_forecast: false,
        })
        .await
    }

    /// Full aggregation around a resolved place
    pub async fn around_place(
        &self,
        place: PlaceResult,
        keyword: Option<&str>,
    ) -> Result<AggregatedResult> {
        let filter = keyword.map_or_else(PoiFilter::nearby_attractions, PoiFilter::for_keyword);
        self.run(AggregationRequest {
            place,
            filter,
            radius_m: self.place_radius_m,
            with_forecast: true,
        })
        .await
    }

    #[instrument(skip(self, request), fields(place = %request.place.display_name, radius_m = request.radius_m))]
    pub async fn run(&self, request: AggregationRequest) -> Result<AggregatedResult> {
        let AggregationRequest {
            place,
            filter,
            radius_m,
            with_forecast,
        } = request;
        let at = place.coordinate;

        let query = SpatialQuery {
            center: at,
            radius_m,
            filter: filter.clone(),
        };
        let source = self.pois.clone();
        let spatial = tokio::spawn(async move { source.query(&query).await }.in_current_span());

        let weather = self.weather.clone();
        let current = tokio::spawn(async move { weather.current(at).await }.in_current_span());

        let forecast = with_forecast.then(|| {
            let weather = self.weather.clone();
            tokio::spawn(async move { weather.forecast(at).await }.in_current_span())
        });

        let (elements, current, forecast) = tokio::try_join!(
            settle("spatial query", spatial),
            settle("current weather", current),
            async {
                match forecast {
                    Some(handle) => settle("forecast", handle).await,
                    None => Ok(Vec::new()),
                }
            },
        )
        .map_err(|e| {
            debug!("Aggregation branch failed: {}", e);
            MapQueryError::aggregation_failed(e)
        })?;

        let pois = normalize_elements(&elements, &filter, &at, self.max_pois);
        info!(
            "Aggregated {} POI(s) from {} feature(s) with {} forecast point(s)",
            pois.len(),
            elements.len(),
            forecast.len()
        );

        Ok(AggregatedResult {
            place,
            pois,
            weather: Some(WeatherReport { current, forecast }),
        })
    }
}

async fn settle<T>(branch: &str, handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|e| MapQueryError::upstream(branch, format!("task did not complete: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastPoint, WeatherSnapshot};
    use crate::poi::RawElement;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakePois {
        fail: bool,
        count: i64,
        queries: Mutex<Vec<SpatialQuery>>,
    }

    #[async_trait]
    impl PoiSource for FakePois {
        async fn query(&self, query: &SpatialQuery) -> Result<Vec<RawElement>> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(MapQueryError::network("overpass unreachable"));
            }
            Ok((0..self.count)
                .map(|id| RawElement {
                    element_type: "node".to_string(),
                    id,
                    lat: Some(query.center.lat + 0.001),
                    lon: Some(query.center.lon),
                    center: None,
                    tags: [("amenity".to_string(), "cafe".to_string())].into(),
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeWeather {
        fail_current: bool,
        fail_forecast: bool,
        forecast_calls: AtomicUsize,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current(&self, _at: Coordinate) -> Result<WeatherSnapshot> {
            if self.fail_current {
                return Err(MapQueryError::upstream("OpenWeatherMap", "HTTP 401"));
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherSnapshot {
                temperature_c: 30.0,
                wind_speed: 2.5,
                humidity_pct: 80,
                description: "light rain".to_string(),
            })
        }

        async fn forecast(&self, _at: Coordinate) -> Result<Vec<ForecastPoint>> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_forecast {
                return Err(MapQueryError::network("timed out"));
            }
            Ok((0..8)
                .map(|i| ForecastPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(3 * i),
                    temperature_c: 28.0,
                    description: "clouds".to_string(),
                })
                .collect())
        }
    }

    fn pipeline(pois: Arc<FakePois>, weather: Arc<FakeWeather>) -> AggregationPipeline {
        AggregationPipeline::new(
            pois,
            weather,
            &SpatialConfig::default(),
            &SearchConfig::default(),
        )
    }

    fn hanoi() -> Coordinate {
        Coordinate::new(21.0285, 105.8542).unwrap()
    }

    fn place() -> PlaceResult {
        PlaceResult {
            id: "relation/1903516".to_string(),
            coordinate: hanoi(),
            display_name: "Hà Nội, Việt Nam".to_string(),
            kind: "administrative".to_string(),
        }
    }

    #[tokio::test]
    async fn test_near_me_uses_category_and_near_radius() {
        let pois = Arc::new(FakePois {
            count: 12,
            ..FakePois::default()
        });
        let weather = Arc::new(FakeWeather::default());
        let result = pipeline(pois.clone(), weather.clone())
            .near_me(hanoi(), "cafe")
            .await
            .unwrap();

        assert_eq!(result.pois.len(), 5);
        assert_eq!(result.place.kind, "reference");
        let report = result.weather.unwrap();
        assert!(report.forecast.is_empty());
        assert_eq!(weather.forecast_calls.load(Ordering::SeqCst), 0);

        let queries = pois.queries.lock().unwrap();
        assert_eq!(queries[0].radius_m, 1000);
        assert_eq!(queries[0].filter, PoiFilter::for_keyword("cafe"));
    }

    #[tokio::test]
    async fn test_around_place_includes_forecast_and_wide_radius() {
        let pois = Arc::new(FakePois {
            count: 2,
            ..FakePois::default()
        });
        let weather = Arc::new(FakeWeather::default());
        let result = pipeline(pois.clone(), weather.clone())
            .around_place(place(), None)
            .await
            .unwrap();

        assert_eq!(result.place, place());
        assert_eq!(result.pois.len(), 2);
        let report = result.weather.unwrap();
        assert_eq!(report.forecast.len(), 8);
        assert_eq!(report.forecast_preview().len(), 3);

        let queries = pois.queries.lock().unwrap();
        assert_eq!(queries[0].radius_m, 3000);
        assert_eq!(queries[0].filter, PoiFilter::nearby_attractions());
    }

    #[tokio::test]
    async fn test_failing_spatial_query_fails_whole_aggregation() {
        let pois = Arc::new(FakePois {
            fail: true,
            ..FakePois::default()
        });
        let weather = Arc::new(FakeWeather::default());
        let err = pipeline(pois, weather.clone())
            .around_place(place(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MapQueryError::AggregationFailed { .. }));

        // the sibling request is not cancelled
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(weather.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_current_weather_fails_whole_aggregation() {
        let pois = Arc::new(FakePois {
            count: 3,
            ..FakePois::default()
        });
        let weather = Arc::new(FakeWeather {
            fail_current: true,
            ..FakeWeather::default()
        });
        let err = pipeline(pois, weather).near_me(hanoi(), "atm").await.unwrap_err();
        assert!(matches!(err, MapQueryError::AggregationFailed { .. }));
    }

    #[tokio::test]
    async fn test_failing_forecast_fails_whole_aggregation() {
        let pois = Arc::new(FakePois {
            count: 3,
            ..FakePois::default()
        });
        let weather = Arc::new(FakeWeather {
            fail_forecast: true,
            ..FakeWeather::default()
        });
        let err = pipeline(pois, weather)
            .around_place(place(), Some("phở"))
            .await
            .unwrap_err();
        match err {
            MapQueryError::AggregationFailed { source } => {
                assert!(matches!(*source, MapQueryError::NetworkFailure { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_aggregate_dispatches_on_keyword() {
        let pois = Arc::new(FakePois::default());
        let weather = Arc::new(FakeWeather::default());
        let pipeline = pipeline(pois.clone(), weather.clone());

        pipeline.aggregate(hanoi(), Some("cafe")).await.unwrap();
        pipeline.aggregate(hanoi(), None).await.unwrap();

        let queries = pois.queries.lock().unwrap();
        assert_eq!(queries[0].radius_m, 1000);
        assert_eq!(queries[1].radius_m, 3000);
        assert_eq!(weather.forecast_calls.load(Ordering::SeqCst), 1);
    }
}
