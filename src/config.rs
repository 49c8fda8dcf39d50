//! Configuration management for the map search service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MapQueryError;
use crate::intent::DEFAULT_LOCAL_KEYWORDS;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MapQueryConfig {
    /// Gazetteer (Nominatim) settings
    pub gazetteer: GazetteerConfig,
    /// Spatial feature service (Overpass) settings
    pub spatial: SpatialConfig,
    /// Weather API settings
    pub weather: WeatherConfig,
    /// Routing service (OSRM) settings
    pub routing: RoutingConfig,
    /// Shared HTTP client settings
    pub http: HttpConfig,
    /// Query classification and result shaping
    pub search: SearchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP API server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    pub base_url: String,
    /// Results are restricted to these ISO 3166-1 codes (comma separated)
    pub country_codes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub base_url: String,
    /// Radius around the caller's own position
    pub near_radius_m: u32,
    /// Radius around a resolved place
    pub place_radius_m: u32,
    /// Server-side query timeout passed in the query header
    pub query_timeout_seconds: u32,
    /// Number of raw elements requested before normalization
    pub fetch_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    pub base_url: String,
    /// Number of forecast points requested
    pub forecast_count: u32,
    /// Optional description language (e.g. `vi`)
    pub language: Option<String>,
}

/// Whether routes are forced through intermediate places
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "places", rename_all = "snake_case")]
pub enum WaypointPolicy {
    /// Start and end only
    #[default]
    Direct,
    /// Geocode these places and visit them in order between start and end
    Via(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub base_url: String,
    pub profile: String,
    /// Ask the service for alternative candidates
    pub alternatives: bool,
    pub waypoints: WaypointPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Deadline for every outbound request
    pub timeout_seconds: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Queries equal to one of these trigger a nearby search
    pub local_keywords: Vec<String>,
    /// Maximum POIs per result
    pub max_pois: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            country_codes: "vn".to_string(),
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            base_url: "https://overpass-api.de/api/interpreter".to_string(),
            near_radius_m: 1000,
            place_radius_m: 3000,
            query_timeout_seconds: 60,
            fetch_limit: 20,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            forecast_count: 8,
            language: None,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            alternatives: true,
            waypoints: WaypointPolicy::Direct,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            user_agent: format!("mapquery/{}", crate::VERSION),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            local_keywords: DEFAULT_LOCAL_KEYWORDS.iter().map(ToString::to_string).collect(),
            max_pois: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl MapQueryConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // MAPQUERY__WEATHER__API_KEY=... style overrides
        builder = builder.add_source(
            Environment::with_prefix("MAPQUERY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: MapQueryConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapquery").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.weather.api_key {
            if api_key.trim().is_empty() {
                return Err(MapQueryError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(MapQueryError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds == 0 || self.http.timeout_seconds > 300 {
            return Err(MapQueryError::config("HTTP timeout must be between 1 and 300 seconds").into());
        }

        if self.spatial.near_radius_m == 0 || self.spatial.place_radius_m == 0 {
            return Err(MapQueryError::config("Search radii must be positive").into());
        }

        if self.spatial.near_radius_m > 50_000 || self.spatial.place_radius_m > 50_000 {
            return Err(MapQueryError::config("Search radius cannot exceed 50000 m").into());
        }

        if self.spatial.fetch_limit == 0 || self.spatial.query_timeout_seconds == 0 {
            return Err(
                MapQueryError::config("Spatial fetch limit and query timeout must be positive").into(),
            );
        }

        if self.search.max_pois == 0 || self.search.max_pois > 100 {
            return Err(MapQueryError::config("Maximum POIs must be between 1 and 100").into());
        }

        if self.weather.forecast_count == 0 || self.weather.forecast_count > 40 {
            return Err(MapQueryError::config("Forecast count must be between 1 and 40").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MapQueryError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MapQueryError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Gazetteer", &self.gazetteer.base_url),
            ("Spatial", &self.spatial.base_url),
            ("Weather", &self.weather.base_url),
            ("Routing", &self.routing.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MapQueryError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.routing.profile.trim().is_empty() {
            return Err(MapQueryError::config("Routing profile cannot be empty").into());
        }

        if let WaypointPolicy::Via(places) = &self.routing.waypoints {
            if places.iter().any(|p| p.trim().is_empty()) {
                return Err(MapQueryError::config("Waypoint places cannot be empty").into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MapQueryConfig::default();
        assert_eq!(config.gazetteer.country_codes, "vn");
        assert_eq!(config.spatial.near_radius_m, 1000);
        assert!(config.spatial.place_radius_m > config.spatial.near_radius_m);
        assert_eq!(config.weather.forecast_count, 8);
        assert_eq!(config.search.max_pois, 5);
        assert_eq!(config.routing.waypoints, WaypointPolicy::Direct);
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = MapQueryConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = MapQueryConfig::default();
        config.http.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HTTP timeout"));
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = MapQueryConfig::default();
        config.weather.api_key = Some("  ".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_config_validation_empty_waypoint() {
        let mut config = MapQueryConfig::default();
        config.routing.waypoints = WaypointPolicy::Via(vec!["Đà Nẵng".to_string(), String::new()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("mapquery-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[spatial]
near_radius_m = 750

[weather]
api_key = "0123456789abcdef"
language = "vi"

[routing.waypoints]
mode = "via"
places = ["Đà Nẵng, Việt Nam"]
"#
        )
        .unwrap();

        let config = MapQueryConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.spatial.near_radius_m, 750);
        assert_eq!(config.spatial.place_radius_m, 3000);
        assert_eq!(config.weather.language.as_deref(), Some("vi"));
        assert_eq!(
            config.routing.waypoints,
            WaypointPolicy::Via(vec!["Đà Nẵng, Việt Nam".to_string()])
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = MapQueryConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("mapquery"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
