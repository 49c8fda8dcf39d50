//! Weather models and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forecast points shown to the user; the full sequence stays available
pub const FORECAST_PREVIEW_LEN: usize = 3;

/// Point-in-time weather conditions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Relative humidity percentage (0-100)
    pub humidity_pct: u8,
    /// Human-readable description of weather conditions
    pub description: String,
}

impl WeatherSnapshot {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature_c)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_speed)
    }
}

/// One future forecast entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature_c: f64,
    pub description: String,
}

/// Weather attached to the primary place of an aggregation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    /// Chronological, in source order; empty for nearby searches
    pub forecast: Vec<ForecastPoint>,
}

impl WeatherReport {
    /// The leading forecast entries intended for display
    #[must_use]
    pub fn forecast_preview(&self) -> &[ForecastPoint] {
        let len = self.forecast.len().min(FORECAST_PREVIEW_LEN);
        &self.forecast[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(hour: u32) -> ForecastPoint {
        ForecastPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
            temperature_c: 30.0 + f64::from(hour),
            description: "light rain".to_string(),
        }
    }

    #[test]
    fn test_forecast_preview_caps_at_three() {
        let report = WeatherReport {
            current: WeatherSnapshot {
                temperature_c: 31.2,
                wind_speed: 3.4,
                humidity_pct: 70,
                description: "scattered clouds".to_string(),
            },
            forecast: (0..8).map(|i| point(i * 3)).collect(),
        };
        assert_eq!(report.forecast_preview().len(), 3);
        assert_eq!(report.forecast_preview()[0], report.forecast[0]);
        assert_eq!(report.forecast.len(), 8);
    }

    #[test]
    fn test_forecast_preview_short_sequence() {
        let report = WeatherReport {
            current: WeatherSnapshot {
                temperature_c: 25.0,
                wind_speed: 1.0,
                humidity_pct: 50,
                description: "clear sky".to_string(),
            },
            forecast: vec![point(0)],
        };
        assert_eq!(report.forecast_preview().len(), 1);
        assert_eq!(report.current.format_temperature(), "25.0°C");
    }
}
