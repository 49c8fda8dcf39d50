//! Points of interest
//!
//! This module provides:
//! - Keyword to tag-filter mapping for nearby searches
//! - The spatial feature service seam and its Overpass client
//! - Normalization of raw features into [`Poi`](crate::models::Poi) records

pub mod filter;
pub mod normalize;
pub mod overpass;

pub use filter::{PoiCategory, PoiFilter};
pub use normalize::{RawElement, normalize_elements};
pub use overpass::{OverpassClient, PoiSource, SpatialQuery};
