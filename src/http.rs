//! Shared outbound HTTP client
//!
//! Every service client goes through one `reqwest` client with a fixed
//! per-request deadline, wrapped in a middleware that logs each call.

use crate::config::HttpConfig;
use crate::{MapQueryError, Result};
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub type HttpClient = ClientWithMiddleware;

const SLOW_REQUEST: Duration = Duration::from_secs(5);
const MAX_ERROR_BODY: usize = 200;

/// Build the shared client from configuration
pub fn build_client(config: &HttpConfig) -> Result<HttpClient> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| MapQueryError::config(format!("Failed to create HTTP client: {e}")))?;

    Ok(ClientBuilder::new(client).with(RequestLogger).build())
}

/// Check the status and decode a JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(service: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        return Err(MapQueryError::upstream(service, format!("HTTP {status}: {body}")));
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            e.into()
        } else {
            MapQueryError::upstream(service, format!("unreadable response: {e}"))
        }
    })
}

struct RequestLogger;

#[async_trait::async_trait]
impl Middleware for RequestLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let host = req.url().host_str().unwrap_or_default().to_string();
        let path = req.url().path().to_string();
        let started = Instant::now();

        let result = next.run(req, extensions).await;

        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(response) => debug!(
                %method,
                %host,
                %path,
                status = response.status().as_u16(),
                elapsed_ms,
                "Upstream request completed"
            ),
            Err(e) => warn!(%method, %host, %path, elapsed_ms, error = %e, "Upstream request failed"),
        }
        if elapsed > SLOW_REQUEST {
            warn!(%host, "Slow API response detected: {:.3}s", elapsed.as_secs_f64());
        }

        result
    }
}
