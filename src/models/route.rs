//! Decoded driving route

use super::{BoundingBox, Coordinate};
use serde::{Deserialize, Serialize};

/// A driving path with at least two points
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoutePath {
    pub points: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_hours: f64,
    /// Area the map should be fitted to
    pub bounds: BoundingBox,
    /// Number of candidates the routing service offered
    pub alternatives: usize,
}

impl RoutePath {
    /// Distance rounded to 2 decimals for display
    #[must_use]
    pub fn display_distance_km(&self) -> f64 {
        round2(self.distance_km)
    }

    /// Duration rounded to 2 decimals for display
    #[must_use]
    pub fn display_duration_hours(&self) -> f64 {
        round2(self.duration_hours)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounding() {
        let points = vec![
            Coordinate { lat: 21.0, lon: 105.8 },
            Coordinate { lat: 16.0, lon: 108.2 },
        ];
        let route = RoutePath {
            bounds: BoundingBox::enclosing(&points).unwrap(),
            points,
            distance_km: 763.4567,
            duration_hours: 12.3456,
            alternatives: 2,
        };
        assert_eq!(route.display_distance_km(), 763.46);
        assert_eq!(route.display_duration_hours(), 12.35);
    }
}
