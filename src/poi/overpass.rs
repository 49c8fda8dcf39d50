//! Spatial feature service seam and its Overpass client

use super::{PoiFilter, RawElement};
use crate::config::SpatialConfig;
use crate::http::{HttpClient, read_json};
use crate::models::Coordinate;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// A radius search around a coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialQuery {
    pub center: Coordinate,
    pub radius_m: u32,
    pub filter: PoiFilter,
}

/// Source of raw spatial features
#[async_trait]
pub trait PoiSource: Send + Sync {
    async fn query(&self, query: &SpatialQuery) -> Result<Vec<RawElement>>;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
}

/// Overpass API client
pub struct OverpassClient {
    client: HttpClient,
    endpoint: String,
    timeout_seconds: u32,
    fetch_limit: u32,
}

impl OverpassClient {
    #[must_use]
    pub fn new(client: HttpClient, config: &SpatialConfig) -> Self {
        Self {
            client,
            endpoint: config.base_url.clone(),
            timeout_seconds: config.query_timeout_seconds,
            fetch_limit: config.fetch_limit,
        }
    }

    /// Render the Overpass QL for a radius query over nodes, ways and relations
    #[must_use]
    pub fn build_query(&self, query: &SpatialQuery) -> String {
        format!(
            "[out:json][timeout:{}];\n( nwr(around:{},{},{}){}; );\nout center {};",
            self.timeout_seconds,
            query.radius_m,
            query.center.lat,
            query.center.lon,
            query.filter.to_overpass(),
            self.fetch_limit
        )
    }
}

#[async_trait]
impl PoiSource for OverpassClient {
    #[instrument(name = "spatial_query", skip(self), fields(radius_m = query.radius_m))]
    async fn query(&self, query: &SpatialQuery) -> Result<Vec<RawElement>> {
        let body = self.build_query(query);
        debug!("Overpass query: {}", body);

        let response = self.client.post(&self.endpoint).body(body).send().await?;
        let parsed: OverpassResponse = read_json("Overpass", response).await?;

        info!("Found {} raw features", parsed.elements.len());
        Ok(parsed.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::http::build_client;
    use mockito::Matcher;

    fn client_for(base_url: String) -> OverpassClient {
        let config = SpatialConfig {
            base_url,
            ..SpatialConfig::default()
        };
        OverpassClient::new(build_client(&HttpConfig::default()).unwrap(), &config)
    }

    fn cafe_query() -> SpatialQuery {
        SpatialQuery {
            center: Coordinate::new(21.0285, 105.8542).unwrap(),
            radius_m: 1000,
            filter: PoiFilter::for_keyword("cafe"),
        }
    }

    #[test]
    fn test_build_query() {
        let client = client_for("http://localhost/api/interpreter".to_string());
        let ql = client.build_query(&cafe_query());
        assert_eq!(
            ql,
            "[out:json][timeout:60];\n( nwr(around:1000,21.0285,105.8542)[\"amenity\"=\"cafe\"]; );\nout center 20;"
        );
    }

    #[tokio::test]
    async fn test_query_posts_ql_and_parses_elements() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/interpreter")
            .match_body(Matcher::Regex(r#"nwr\(around:1000,21\.0285,105\.8542\)\["amenity"="cafe"\]"#.to_string()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"version": 0.6, "elements": [
                    {"type": "node", "id": 1, "lat": 21.03, "lon": 105.85, "tags": {"name": "Cafe A", "amenity": "cafe"}},
                    {"type": "way", "id": 2, "center": {"lat": 21.02, "lon": 105.86}, "tags": {"amenity": "cafe"}}
                ]}"#,
            )
            .create_async()
            .await;

        let client = client_for(format!("{}/api/interpreter", server.url()));
        let elements = client.query(&cafe_query()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].tags.get("name").map(String::as_str), Some("Cafe A"));
        assert_eq!(elements[1].element_type, "way");
        assert!(elements[1].center.is_some());
    }
}
