//! Weather service seam and its OpenWeatherMap client

use crate::config::WeatherConfig;
use crate::http::{HttpClient, read_json};
use crate::models::{Coordinate, ForecastPoint, WeatherSnapshot};
use crate::{MapQueryError, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Current conditions and short-range forecast for a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, at: Coordinate) -> Result<WeatherSnapshot>;

    /// Chronological forecast points, source order preserved
    async fn forecast(&self, at: Coordinate) -> Result<Vec<ForecastPoint>>;
}

/// OpenWeatherMap 2.5 client (metric units)
pub struct OpenWeatherClient {
    client: HttpClient,
    base_url: String,
    api_key: String,
    forecast_count: u32,
    language: Option<String>,
}

impl OpenWeatherClient {
    /// Create a client; the API key is mandatory for this provider
    pub fn new(client: HttpClient, config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                MapQueryError::config(
                    "Weather API key is required (set weather.api_key or MAPQUERY__WEATHER__API_KEY)",
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            forecast_count: config.forecast_count,
            language: config.language.clone(),
        })
    }

    fn url(&self, endpoint: &str, at: Coordinate, extra: &str) -> String {
        let mut url = format!(
            "{}/{}?lat={}&lon={}&appid={}&units=metric{}",
            self.base_url,
            endpoint,
            at.lat,
            at.lon,
            urlencoding::encode(&self.api_key),
            extra
        );
        if let Some(lang) = &self.language {
            url.push_str(&format!("&lang={}", urlencoding::encode(lang)));
        }
        url
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(name = "current_weather", skip(self))]
    async fn current(&self, at: Coordinate) -> Result<WeatherSnapshot> {
        let url = self.url("weather", at, "");
        debug!("Requesting current weather for {}", at.format_coordinates());

        let response = self.client.get(&url).send().await?;
        let current: openweather::CurrentResponse = read_json("OpenWeatherMap", response).await?;
        Ok(current.into())
    }

    #[instrument(name = "weather_forecast", skip(self))]
    async fn forecast(&self, at: Coordinate) -> Result<Vec<ForecastPoint>> {
        let url = self.url("forecast", at, &format!("&cnt={}", self.forecast_count));
        debug!(
            "Requesting {} forecast points for {}",
            self.forecast_count,
            at.format_coordinates()
        );

        let response = self.client.get(&url).send().await?;
        let forecast: openweather::ForecastResponse = read_json("OpenWeatherMap", response).await?;
        forecast.into_points()
    }
}

/// `OpenWeatherMap` API response structures and conversion utilities
mod openweather {
    use crate::models::{ForecastPoint, WeatherSnapshot};
    use crate::{MapQueryError, Result};
    use chrono::DateTime;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct MainData {
        pub temp: f64,
        #[serde(default)]
        pub humidity: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct WindData {
        pub speed: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: String,
    }

    /// `/weather` response
    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub main: MainData,
        pub wind: Option<WindData>,
        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastEntry {
        /// Unix seconds
        pub dt: i64,
        pub main: MainData,
        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    /// `/forecast` response
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        #[serde(default)]
        pub list: Vec<ForecastEntry>,
    }

    fn describe(conditions: &[Condition]) -> String {
        conditions
            .first()
            .map_or_else(|| "Unknown".to_string(), |c| c.description.clone())
    }

    impl From<CurrentResponse> for WeatherSnapshot {
        fn from(response: CurrentResponse) -> Self {
            let humidity = response.main.humidity.unwrap_or(0.0).clamp(0.0, 100.0);
            Self {
                temperature_c: response.main.temp,
                wind_speed: response.wind.map_or(0.0, |w| w.speed),
                humidity_pct: humidity.round() as u8,
                description: describe(&response.weather),
            }
        }
    }

    impl ForecastResponse {
        pub fn into_points(self) -> Result<Vec<ForecastPoint>> {
            self.list
                .into_iter()
                .map(|entry| {
                    let timestamp = DateTime::from_timestamp(entry.dt, 0).ok_or_else(|| {
                        MapQueryError::upstream(
                            "OpenWeatherMap",
                            format!("invalid forecast timestamp {}", entry.dt),
                        )
                    })?;
                    Ok(ForecastPoint {
                        timestamp,
                        temperature_c: entry.main.temp,
                        description: describe(&entry.weather),
                    })
                })
                .collect()
        }
    }
}
