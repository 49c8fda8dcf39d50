//! Encoded polyline codec
//!
//! Coordinates are stored as cumulative deltas scaled by 1e5, zig-zag encoded
//! and split into 5-bit groups. Each group is offset by 63 so it lands in the
//! printable ASCII range; bit `0x20` marks that more groups follow. Latitude
//! and longitude deltas alternate.

use crate::models::Coordinate;
use crate::{MapQueryError, Result};

const PRECISION: f64 = 1e5;
const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const OFFSET: u8 = 63;

/// Decode a polyline into an ordered coordinate sequence
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;
    let mut points = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        lat = accumulate(lat, next_value(bytes, &mut index)?, index)?;
        if index >= bytes.len() {
            return Err(MapQueryError::decode(format!(
                "latitude without longitude at byte {index}"
            )));
        }
        lon = accumulate(lon, next_value(bytes, &mut index)?, index)?;
        let point = Coordinate::new(lat as f64 / PRECISION, lon as f64 / PRECISION)
            .map_err(|e| MapQueryError::decode(format!("point {}: {e}", points.len())))?;
        points.push(point);
    }

    Ok(points)
}

/// Encode coordinates at 1e5 precision
#[must_use]
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in points {
        let lat = scale(point.lat);
        let lon = scale(point.lon);
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lon - prev_lon);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

fn scale(degrees: f64) -> i64 {
    (degrees * PRECISION).round() as i64
}

fn accumulate(total: i64, delta: i64, index: usize) -> Result<i64> {
    total.checked_add(delta).ok_or_else(|| {
        MapQueryError::decode(format!("running total overflows before byte {index}"))
    })
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(MapQueryError::decode(format!(
                "truncated value at byte {index}",
                index = *index
            )));
        };
        if !(OFFSET..=126).contains(&byte) {
            return Err(MapQueryError::decode(format!(
                "invalid character {:?} at byte {}",
                byte as char, *index
            )));
        }
        if shift > 60 {
            return Err(MapQueryError::decode(format!(
                "value starting before byte {} overflows",
                *index
            )));
        }
        *index += 1;

        let chunk = i64::from(byte - OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    // zig-zag: low bit carries the sign
    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

fn push_value(out: &mut String, value: i64) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (v & CHUNK_MASK)) as u8) + OFFSET));
        v >>= CHUNK_BITS;
    }
    out.push(char::from((v as u8) + OFFSET));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Reference example from the encoded polyline format documentation
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn test_decode_reference() {
        let points = decode(REFERENCE).unwrap();
        assert_eq!(
            points,
            vec![
                Coordinate { lat: 38.5, lon: -120.2 },
                Coordinate { lat: 40.7, lon: -120.95 },
                Coordinate { lat: 43.252, lon: -126.453 },
            ]
        );
    }

    #[test]
    fn test_encode_reference() {
        let points = [
            Coordinate { lat: 38.5, lon: -120.2 },
            Coordinate { lat: 40.7, lon: -120.95 },
            Coordinate { lat: 43.252, lon: -126.453 },
        ];
        assert_eq!(encode(&points), REFERENCE);
    }

    #[test]
    fn test_round_trip_within_precision() {
        let points = [
            Coordinate { lat: 21.028_511, lon: 105.804_817 },
            Coordinate { lat: 20.254_123, lon: 105.974_998 },
            Coordinate { lat: 18.679_401, lon: 105.681_276 },
            Coordinate { lat: 16.054_407, lon: 108.202_167 },
            Coordinate { lat: -33.868_82, lon: 151.209_29 },
        ];
        let decoded = decode(&encode(&points)).unwrap();
        assert_eq!(decoded.len(), points.len());
        for (a, b) in decoded.iter().zip(points.iter()) {
            assert!((a.lat - b.lat).abs() <= 1e-5, "{a:?} vs {b:?}");
            assert!((a.lon - b.lon).abs() <= 1e-5, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(decode("").unwrap().is_empty());
        assert_eq!(encode(&[]), "");
    }

    #[rstest]
    #[case::truncated("_p~iF~ps|")]
    #[case::dangling_latitude("_p~iF")]
    #[case::out_of_range("_p~iF ps|U")]
    #[case::non_ascii("_p~iFđ")]
    #[case::overflow("~~~~~~~~~~~~~~~~~~?")]
    fn test_malformed_input(#[case] input: &str) {
        let err = decode(input).unwrap_err();
        assert!(matches!(err, MapQueryError::Decode { .. }), "{err:?}");
    }

    /// Twelve-group value close to `i64::MAX / 2`
    fn huge_delta() -> String {
        format!("}}{}F", "~".repeat(11))
    }

    #[rstest]
    #[case::huge_latitude_deltas(format!("{0}?{0}?{0}?", huge_delta()))]
    #[case::latitude_out_of_range(encode_raw(&[(10_000_000, 0)]))]
    #[case::longitude_out_of_range(encode_raw(&[(0, -18_100_000)]))]
    #[case::second_point_out_of_range(encode_raw(&[(2_100_000, 10_500_000), (8_000_000, 0)]))]
    fn test_well_formed_but_invalid_geometry(#[case] input: String) {
        let err = decode(&input).unwrap_err();
        assert!(matches!(err, MapQueryError::Decode { .. }), "{err:?}");
    }

    /// Encode raw 1e5-scaled deltas without range checks
    fn encode_raw(deltas: &[(i64, i64)]) -> String {
        let mut out = String::new();
        for (lat, lon) in deltas {
            push_value(&mut out, *lat);
            push_value(&mut out, *lon);
        }
        out
    }
}
