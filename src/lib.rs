//! `MapQuery` - free-text map search
//!
//! A single query line is classified as a route request, a nearby amenity
//! search or a place lookup, then answered from a gazetteer, a spatial POI
//! index, a weather service and a road router.

pub mod aggregation;
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod intent;
pub mod location_resolver;
pub mod models;
pub mod pipeline;
pub mod poi;
pub mod polyline;
pub mod routing;
pub mod session;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use aggregation::AggregationPipeline;
pub use config::MapQueryConfig;
pub use error::MapQueryError;
pub use intent::{Intent, IntentClassifier};
pub use location_resolver::LocationResolver;
pub use models::{AggregatedResult, Coordinate, PlaceResult, Poi, RoutePath, SearchOutcome};
pub use pipeline::{SearchPipeline, Services};
pub use routing::RouteEngine;
pub use session::{Generation, SearchSession, Stamped};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MapQueryError>;
