//! HTTP clients for the complaint store and routing service.
//!
//! One [`ComplaintApiClient`] talks to both endpoints of the admin backend:
//! - `GET  /api/complaintsmap` lists complaints
//! - `POST /api/router/register` computes and stores a route
//!
//! Connections are pooled; transport errors and 429s are retried with
//! exponential backoff.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::pipeline::{DangerMapEngine, DangerMapReport, EngineConfig};
use crate::{
    ComplaintRecord, ComplaintSource, DangerMapError, FilterCriteria, GeoPoint, Result,
    RouteRegistrar, RouteRegistration,
};

const MAX_RETRIES: u32 = 3;
const MAX_IDLE_PER_HOST: usize = 16;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Backend base URL, without a trailing slash. Default: `http://localhost:3001`
    pub base_url: String,
    /// Per-request timeout. Default: 30s
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Body of a route registration request.
#[derive(Debug, Serialize)]
struct RegisterRequest {
    start_lat: f64,
    start_lng: f64,
    end_lat: f64,
    end_lng: f64,
}

/// Reply from the route registration endpoint.
#[derive(Debug, Deserialize)]
struct RegisterResponse {
    success: bool,
    /// `[lng, lat]` pairs.
    #[serde(default)]
    route_coords: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the admin backend.
#[derive(Debug, Clone)]
pub struct ComplaintApiClient {
    client: Client,
    base_url: String,
}

impl ComplaintApiClient {
    /// Create a client with pooled connections.
    ///
    /// # Errors
    ///
    /// Returns [`DangerMapError::Http`] if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(config.timeout)
            .build()
            .map_err(|e| DangerMapError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, retrying transport errors and 429s.
    ///
    /// `build` is called once per attempt since builders are consumed by `send`.
    async fn send_with_retry<F>(&self, label: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;

        loop {
            match build().send().await {
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(DangerMapError::Http("Max retries exceeded (429)".to_string()));
                    }
                    let wait = Duration::from_millis(500 * (1 << retries));
                    warn!("[Http {}] 429 Too Many Requests, retry {} after {:?}", label, retries, wait);
                    tokio::time::sleep(wait).await;
                }
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(DangerMapError::Http(format!("Request error: {}", e)));
                    }
                    let wait = Duration::from_millis(200 * (1 << retries));
                    warn!("[Http {}] Error: {}, retry {} after {:?}", label, e, retries, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn read_body(resp: Response) -> Result<(StatusCode, Vec<u8>)> {
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| DangerMapError::Http(format!("Body download error: {}", e)))?;
        Ok((status, bytes.to_vec()))
    }
}

#[async_trait]
impl ComplaintSource for ComplaintApiClient {
    async fn list_complaints(&self) -> Result<Vec<ComplaintRecord>> {
        let start = Instant::now();
        let url = self.url("/api/complaintsmap");

        let resp = self.send_with_retry("complaints", || self.client.get(&url)).await?;
        let (status, body) = Self::read_body(resp).await?;
        if !status.is_success() {
            return Err(DangerMapError::Http(format!("HTTP {} from {}", status, url)));
        }

        let records: Vec<ComplaintRecord> = serde_json::from_slice(&body)?;

        info!(
            "[Http] Fetched {} complaints ({:.1}KB) in {}ms",
            records.len(),
            body.len() as f64 / 1024.0,
            start.elapsed().as_millis()
        );

        Ok(records)
    }
}

#[async_trait]
impl RouteRegistrar for ComplaintApiClient {
    async fn register_route(&self, start: GeoPoint, end: GeoPoint) -> Result<RouteRegistration> {
        let started = Instant::now();
        let url = self.url("/api/router/register");
        let request = RegisterRequest {
            start_lat: start.latitude,
            start_lng: start.longitude,
            end_lat: end.latitude,
            end_lng: end.longitude,
        };

        let resp = self
            .send_with_retry("register", || self.client.post(&url).json(&request))
            .await?;
        let (status, body) = Self::read_body(resp).await?;

        // Failed registrations may come back with an error status and a JSON body
        let reply: RegisterResponse = match serde_json::from_slice(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(DangerMapError::Http(format!("HTTP {} from {}", status, url)));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(
            "[Http] Route registration success={} points={} in {}ms",
            reply.success,
            reply.route_coords.as_ref().map_or(0, Vec::len),
            started.elapsed().as_millis()
        );

        Ok(RouteRegistration {
            success: reply.success && status.is_success(),
            coords: reply
                .route_coords
                .map(|pairs| pairs.into_iter().map(GeoPoint::from_lng_lat).collect()),
            message: reply.message,
        })
    }
}

/// Run the full pipeline against the backend on a fresh tokio runtime.
///
/// For batch jobs that are not already async.
///
/// # Errors
///
/// Returns an error if the runtime or HTTP client cannot be created, or the
/// complaint list cannot be fetched.
pub fn run_report_blocking(
    http: HttpConfig,
    engine: EngineConfig,
    criteria: &FilterCriteria,
) -> Result<DangerMapReport> {
    use tokio::runtime::Builder;

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| DangerMapError::Http(format!("Runtime error: {}", e)))?;

    let client = ComplaintApiClient::new(http)?;
    let engine = DangerMapEngine::with_config(client.clone(), client, engine);

    rt.block_on(engine.run(criteria))
}
