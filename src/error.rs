//! Error types and handling for the map search core

use thiserror::Error;

/// Main error type for the map search core
#[derive(Error, Debug)]
pub enum MapQueryError {
    /// The gazetteer returned no usable candidate
    #[error("No place found for '{query}'")]
    NotFound { query: String },

    /// One endpoint of a route could not be resolved
    #[error("Could not resolve route endpoint '{endpoint}': {source}")]
    GeocodeFailed {
        endpoint: String,
        #[source]
        source: Box<MapQueryError>,
    },

    /// One of the concurrent sub-fetches of an aggregation failed
    #[error("Aggregation failed: {source}")]
    AggregationFailed {
        #[source]
        source: Box<MapQueryError>,
    },

    /// The routing service returned no candidate path
    #[error("No route found: {message}")]
    RouteNotFound { message: String },

    /// Transport-level failure, including deadline expiry
    #[error("Network error: {message}")]
    NetworkFailure { message: String },

    /// A service answered with an error status or an unreadable body
    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },

    /// Malformed polyline geometry
    #[error("Polyline decode error: {message}")]
    Decode { message: String },

    /// A nearby search was issued without a reference coordinate
    #[error("A reference location is required for nearby searches")]
    LocationRequired,

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl MapQueryError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// Wrap a resolver failure for a route endpoint
    pub fn geocode_failed<S: Into<String>>(endpoint: S, source: MapQueryError) -> Self {
        Self::GeocodeFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a failing aggregation branch
    #[must_use]
    pub fn aggregation_failed(source: MapQueryError) -> Self {
        Self::AggregationFailed {
            source: Box::new(source),
        }
    }

    /// Create a new route-not-found error
    pub fn route_not_found<S: Into<String>>(message: S) -> Self {
        Self::RouteNotFound {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    /// Create a new upstream service error
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used by the HTTP API
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            MapQueryError::NotFound { .. } => "not_found",
            MapQueryError::GeocodeFailed { .. } => "geocode_failed",
            MapQueryError::AggregationFailed { .. } => "aggregation_failed",
            MapQueryError::RouteNotFound { .. } => "route_not_found",
            MapQueryError::NetworkFailure { .. } => "network_failure",
            MapQueryError::Upstream { .. } => "upstream",
            MapQueryError::Decode { .. } => "decode_error",
            MapQueryError::LocationRequired => "location_required",
            MapQueryError::Config { .. } => "config",
            MapQueryError::Validation { .. } => "validation",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MapQueryError::NotFound { query } => format!("Could not find \"{query}\"."),
            MapQueryError::GeocodeFailed { endpoint, .. } => {
                format!("Could not find route endpoint \"{endpoint}\".")
            }
            MapQueryError::AggregationFailed { .. } => {
                "Failed to load the place details or weather. Please try again.".to_string()
            }
            MapQueryError::RouteNotFound { .. } => "No route found.".to_string(),
            MapQueryError::NetworkFailure { .. } | MapQueryError::Upstream { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            MapQueryError::Decode { .. } => "The route geometry could not be read.".to_string(),
            MapQueryError::LocationRequired => {
                "Please allow location access to search nearby places.".to_string()
            }
            MapQueryError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            MapQueryError::Validation { message } => format!("Invalid input: {message}"),
        }
    }
}

impl From<reqwest::Error> for MapQueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MapQueryError::network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            MapQueryError::upstream("HTTP", format!("unreadable response body: {err}"))
        } else {
            MapQueryError::network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for MapQueryError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(inner) => inner.into(),
            reqwest_middleware::Error::Middleware(inner) => MapQueryError::network(inner.to_string()),
        }
    }
}
