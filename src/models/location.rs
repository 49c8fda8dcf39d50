//! Location models: coordinates, bounding boxes, places and POIs

use crate::{MapQueryError, Result};
use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(MapQueryError::validation(format!(
                "coordinate must be finite, got ({lat}, {lon})"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MapQueryError::validation(format!(
                "latitude {lat} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(MapQueryError::validation(format!(
                "longitude {lon} is outside -180..=180"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Parse a coordinate from the textual fields a gazetteer returns
    pub fn parse(lat: &str, lon: &str) -> Result<Self> {
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| MapQueryError::validation(format!("unparseable latitude '{lat}'")))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| MapQueryError::validation(format!("unparseable longitude '{lon}'")))?;
        Self::new(lat, lon)
    }

    /// Great-circle distance in meters
    #[must_use]
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.lat,
                longitude: self.lon,
            },
            HaversineLocation {
                latitude: other.lat,
                longitude: other.lon,
            },
            Units::Kilometers,
        ) * 1000.0
    }

    /// Format as `lat, lon` with 4 decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Axis-aligned bounding box, used to fit the map to a path
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box containing all points, `None` for an empty slice
    #[must_use]
    pub fn enclosing(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        Some(points.iter().skip(1).fold(init, |b, p| Self {
            south: b.south.min(p.lat),
            west: b.west.min(p.lon),
            north: b.north.max(p.lat),
            east: b.east.max(p.lon),
        }))
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lon)
    }
}

/// Best gazetteer match for one query string
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceResult {
    /// Source-assigned identifier
    pub id: String,
    pub coordinate: Coordinate,
    /// Full display name as returned by the gazetteer
    pub display_name: String,
    /// Feature type (city, village, administrative, ...)
    pub kind: String,
}

impl PlaceResult {
    /// Pseudo place standing for the caller's own position
    #[must_use]
    pub fn reference(coordinate: Coordinate) -> Self {
        Self {
            id: "reference".to_string(),
            display_name: format!("Your location ({})", coordinate.format_coordinates()),
            coordinate,
            kind: "reference".to_string(),
        }
    }
}

/// Normalized point of interest from a spatial query
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Poi {
    /// Source-assigned identifier (`node/123`, `way/456`, ...)
    pub id: String,
    pub coordinate: Coordinate,
    pub display_name: String,
    pub kind: String,
    /// Distance from the search center in meters
    pub distance_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_parse() {
        let c = Coordinate::parse("21.0285", " 105.8542").unwrap();
        assert_eq!(c.lat, 21.0285);
        assert_eq!(c.lon, 105.8542);

        assert!(Coordinate::parse("abc", "105.0").is_err());
        assert!(Coordinate::parse("91.0", "105.0").is_err());
        assert!(Coordinate::parse("21.0", "-181.0").is_err());
        assert!(Coordinate::parse("NaN", "10.0").is_err());
    }

    #[test]
    fn test_distance_hanoi_danang() {
        let hanoi = Coordinate::new(21.0285, 105.8542).unwrap();
        let danang = Coordinate::new(16.0544, 108.2022).unwrap();
        let km = hanoi.distance_m(&danang) / 1000.0;
        assert!((600.0..650.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_bounding_box() {
        let points = [
            Coordinate::new(21.0, 105.8).unwrap(),
            Coordinate::new(16.0, 108.2).unwrap(),
            Coordinate::new(18.5, 105.6).unwrap(),
        ];
        let bounds = BoundingBox::enclosing(&points).unwrap();
        assert_eq!(bounds.south, 16.0);
        assert_eq!(bounds.north, 21.0);
        assert_eq!(bounds.west, 105.6);
        assert_eq!(bounds.east, 108.2);
        assert!(points.iter().all(|p| bounds.contains(p)));
        assert!(BoundingBox::enclosing(&[]).is_none());
    }
}
