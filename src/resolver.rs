//! Route resolution for complaints that arrive without a polyline.
//!
//! Paths that already carry coordinates pass straight through. The rest are
//! sent to a [`RouteRegistrar`] concurrently, one independent call per path.
//! A failed call drops only that path; results come back in input order.

use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::{ComplaintRecord, DangerMapError, DangerPath, GeoPoint, ResolvedPath, Result};

/// Default number of routing calls in flight at once.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

/// Reply from the routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRegistration {
    pub success: bool,
    pub coords: Option<Vec<GeoPoint>>,
    pub message: Option<String>,
}

impl RouteRegistration {
    /// A successful registration carrying a route.
    pub fn routed(coords: Vec<GeoPoint>) -> Self {
        Self { success: true, coords: Some(coords), message: None }
    }

    /// A registration the service declined.
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, coords: None, message: Some(message.into()) }
    }
}

/// Service that computes and stores a route between two points.
#[async_trait]
pub trait RouteRegistrar: Send + Sync {
    /// Register a route from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns an error when the service cannot be reached or replies with
    /// something unreadable. A reachable service that cannot route replies
    /// `Ok` with `success == false`.
    async fn register_route(&self, start: GeoPoint, end: GeoPoint) -> Result<RouteRegistration>;
}

/// Store that lists complaints with their optional coordinate sequences.
#[async_trait]
pub trait ComplaintSource: Send + Sync {
    /// Fetch every complaint to show on the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn list_complaints(&self) -> Result<Vec<ComplaintRecord>>;
}

/// Outcome of resolving a batch.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    /// Resolved paths, in input order.
    pub resolved: Vec<ResolvedPath>,
    /// One [`DangerMapError::RoutingFailure`] per dropped path.
    pub failures: Vec<DangerMapError>,
}

/// Ensure a single path has coordinates.
///
/// # Errors
///
/// Returns [`DangerMapError::RoutingFailure`] if the path had no coordinates
/// and the registrar failed, declined, or returned an empty route.
pub async fn resolve<R>(mut path: DangerPath, registrar: &R) -> Result<ResolvedPath>
where
    R: RouteRegistrar + ?Sized,
{
    if let Some(coords) = path.coords.take().filter(|c| !c.is_empty()) {
        return Ok(ResolvedPath::from_parts(path, coords));
    }

    debug!("[Resolver] Registering route for path {}", path.id);

    let registration = registrar
        .register_route(path.start, path.end)
        .await
        .map_err(|e| DangerMapError::RoutingFailure {
            path_id: path.id.clone(),
            message: e.to_string(),
        })?;

    if !registration.success {
        return Err(DangerMapError::RoutingFailure {
            path_id: path.id,
            message: registration
                .message
                .unwrap_or_else(|| "routing service reported failure".to_string()),
        });
    }

    match registration.coords.filter(|c| !c.is_empty()) {
        Some(coords) => Ok(ResolvedPath::from_parts(path, coords)),
        None => Err(DangerMapError::RoutingFailure {
            path_id: path.id,
            message: "routing service returned no coordinates".to_string(),
        }),
    }
}

/// Resolve a batch of paths.
///
/// Routing calls run concurrently, at most `concurrency` at a time, and
/// share no state. Output keeps input order; failures are logged and
/// returned alongside instead of aborting the batch.
pub async fn resolve_all<R>(paths: Vec<DangerPath>, registrar: &R, concurrency: usize) -> ResolveOutcome
where
    R: RouteRegistrar + ?Sized,
{
    let total = paths.len();
    let needs_routing = paths.iter().filter(|p| !p.has_coords()).count();
    let start = Instant::now();

    let results: Vec<Result<ResolvedPath>> = stream::iter(paths)
        .map(|path| resolve(path, registrar))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = ResolveOutcome::default();
    for result in results {
        match result {
            Ok(path) => outcome.resolved.push(path),
            Err(e) => {
                warn!("[Resolver] {}", e);
                outcome.failures.push(e);
            }
        }
    }

    info!(
        "[Resolver] Resolved {}/{} paths ({} needed routing, {} failed) in {}ms",
        outcome.resolved.len(),
        total,
        needs_routing,
        outcome.failures.len(),
        start.elapsed().as_millis()
    );

    outcome
}
