//! In-process stand-ins for the external services

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mapquery::history::MemoryHistorySink;
use mapquery::location_resolver::{Gazetteer, GazetteerCandidate};
use mapquery::models::{Coordinate, ForecastPoint, WeatherSnapshot};
use mapquery::poi::{PoiSource, RawElement, SpatialQuery};
use mapquery::routing::{RouteCandidate, RouteProvider, RouteRequest};
use mapquery::weather::WeatherProvider;
use mapquery::{MapQueryConfig, MapQueryError, Result, SearchPipeline, Services, polyline};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Known places keyed by lower-cased query text
pub struct FakeGazetteer {
    places: HashMap<String, (f64, f64, String)>,
    delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGazetteer {
    pub fn vietnam() -> Self {
        let places = [
            ("hà nội", 21.0285, 105.8542, "Hà Nội, Việt Nam"),
            ("đà nẵng", 16.0544, 108.2022, "Đà Nẵng, Việt Nam"),
            ("hồ chí minh", 10.7769, 106.7009, "Thành phố Hồ Chí Minh, Việt Nam"),
            ("hồ gươm", 21.0288, 105.8525, "Hồ Gươm, Hoàn Kiếm, Hà Nội, Việt Nam"),
        ]
        .into_iter()
        .map(|(text, lat, lon, name)| (text.to_string(), (lat, lon, name.to_string())))
        .collect();
        Self {
            places,
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Gazetteer for FakeGazetteer {
    async fn search(&self, text: &str) -> Result<Vec<GazetteerCandidate>> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self
            .places
            .get(text)
            .map(|(lat, lon, name)| GazetteerCandidate {
                osm_id: Some(1000 + name.len() as u64),
                osm_type: Some("relation".to_string()),
                lat: lat.to_string(),
                lon: lon.to_string(),
                display_name: name.clone(),
                kind: Some("administrative".to_string()),
            })
            .into_iter()
            .collect())
    }

    async fn reverse(&self, at: Coordinate) -> Result<Option<GazetteerCandidate>> {
        self.calls.lock().unwrap().push(at.format_coordinates());
        Ok(self
            .places
            .values()
            .find(|(lat, lon, _)| (lat - at.lat).abs() < 0.01 && (lon - at.lon).abs() < 0.01)
            .map(|(lat, lon, name)| GazetteerCandidate {
                osm_id: Some(2000),
                osm_type: Some("way".to_string()),
                lat: lat.to_string(),
                lon: lon.to_string(),
                display_name: name.clone(),
                kind: Some("road".to_string()),
            }))
    }
}

/// Returns `count` named cafes north of the query center
pub struct FakePois {
    pub count: i64,
    pub fail: bool,
    pub queries: Mutex<Vec<SpatialQuery>>,
}

impl FakePois {
    pub fn with_count(count: i64) -> Self {
        Self {
            count,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl PoiSource for FakePois {
    async fn query(&self, query: &SpatialQuery) -> Result<Vec<RawElement>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(MapQueryError::upstream("Overpass", "HTTP 429: rate limited"));
        }
        Ok((0..self.count)
            .map(|i| RawElement {
                element_type: "node".to_string(),
                id: 500 + i,
                lat: Some(query.center.lat + 0.0005 * (i + 1) as f64),
                lon: Some(query.center.lon),
                center: None,
                tags: [
                    ("amenity".to_string(), "cafe".to_string()),
                    ("name".to_string(), format!("Cộng Cà Phê {i}")),
                ]
                .into(),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeWeather {
    pub current_calls: AtomicUsize,
    pub forecast_calls: AtomicUsize,
}

impl FakeWeather {
    pub fn call_count(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst) + self.forecast_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, _at: Coordinate) -> Result<WeatherSnapshot> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        Ok(WeatherSnapshot {
            temperature_c: 29.4,
            wind_speed: 3.1,
            humidity_pct: 78,
            description: "scattered clouds".to_string(),
        })
    }

    async fn forecast(&self, _at: Coordinate) -> Result<Vec<ForecastPoint>> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Ok((0..8)
            .map(|i| ForecastPoint {
                timestamp: start + chrono::Duration::hours(3 * i),
                temperature_c: 27.0 + i as f64 * 0.5,
                description: "light rain".to_string(),
            })
            .collect())
    }
}

/// Draws a straight path through the requested coordinates
#[derive(Default)]
pub struct FakeRoutes {
    pub requests: Mutex<Vec<RouteRequest>>,
}

#[async_trait]
impl RouteProvider for FakeRoutes {
    async fn route(&self, request: &RouteRequest) -> Result<Vec<RouteCandidate>> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(vec![RouteCandidate {
            geometry: polyline::encode(&request.coordinates),
            distance_m: 763_456.0,
            duration_s: 39_600.0,
        }])
    }
}

pub struct Harness {
    pub gazetteer: Arc<FakeGazetteer>,
    pub pois: Arc<FakePois>,
    pub weather: Arc<FakeWeather>,
    pub routes: Arc<FakeRoutes>,
    pub history: Arc<MemoryHistorySink>,
    pub pipeline: Arc<SearchPipeline>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(&MapQueryConfig::default(), FakeGazetteer::vietnam(), FakePois::with_count(7))
    }

    pub fn build(config: &MapQueryConfig, gazetteer: FakeGazetteer, pois: FakePois) -> Self {
        let gazetteer = Arc::new(gazetteer);
        let pois = Arc::new(pois);
        let weather = Arc::new(FakeWeather::default());
        let routes = Arc::new(FakeRoutes::default());
        let history = Arc::new(MemoryHistorySink::new(50));
        let services = Services {
            gazetteer: gazetteer.clone(),
            pois: pois.clone(),
            weather: weather.clone(),
            routes: routes.clone(),
            history: history.clone(),
        };
        Self {
            pipeline: Arc::new(SearchPipeline::new(config, services)),
            gazetteer,
            pois,
            weather,
            routes,
            history,
        }
    }
}

pub fn hanoi_center() -> Coordinate {
    Coordinate::new(21.0285, 105.8542).unwrap()
}

/// Let detached history tasks run
pub async fn drain_background() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
