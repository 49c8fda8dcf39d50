//! Data models for the map search core
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, bounding boxes, places and POIs
//! - Weather: current conditions and forecast points
//! - Route: decoded driving paths
//! - Search: aggregated results and search outcomes

pub mod location;
pub mod route;
pub mod search;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{BoundingBox, Coordinate, PlaceResult, Poi};
pub use route::RoutePath;
pub use search::{AggregatedResult, IntentKind, SearchOutcome};
pub use weather::{ForecastPoint, WeatherReport, WeatherSnapshot};
