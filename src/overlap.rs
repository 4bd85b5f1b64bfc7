//! # Path Overlap Counting
//!
//! Counts, for every path, how many *other* paths pass near it.
//!
//! ## Algorithm
//! 1. Split each path into consecutive segments `(coords[k], coords[k+1])`
//! 2. For every unordered pair of paths, compare every segment of one with
//!    every segment of the other
//! 3. A segment pair is near when the smallest of its four endpoint-to-endpoint
//!    distances is `<= tolerance_meters`
//! 4. Stop at the first near segment pair and credit both paths once
//!
//! Proximity is judged on segment endpoints only, not by projecting points
//! onto segments. Long segments that cross without sharing nearby vertices
//! are therefore not counted; existing reports depend on this.
//!
//! The naive pass is O(P² · S²). [`count_overlaps_indexed`] and
//! [`count_overlaps_parallel`] prune pairs whose bounding boxes are too far
//! apart with an R-tree and give identical counts.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

use crate::geo_utils::{expand_bounds, haversine_distance};
use crate::{Bounds, GeoPoint, ResolvedPath};

/// Tolerance used when none is configured, in meters.
pub const DEFAULT_TOLERANCE_METERS: f64 = 30.0;

/// Configuration for overlap counting.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapConfig {
    /// Maximum endpoint distance for two segments to count as overlapping.
    /// The boundary is inclusive. Default: 30.0 meters
    pub tolerance_meters: f64,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self { tolerance_meters: DEFAULT_TOLERANCE_METERS }
    }
}

/// Overlap count per path id.
///
/// Every path passed to the counting run has an entry, zero when nothing
/// came near it. Unknown ids read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OverlapCounts {
    counts: HashMap<String, u32>,
}

impl OverlapCounts {
    fn for_paths(paths: &[ResolvedPath]) -> Self {
        Self {
            counts: paths.iter().map(|p| (p.id.clone(), 0)).collect(),
        }
    }

    fn record_pair(&mut self, a: &str, b: &str) {
        *self.counts.entry(a.to_string()).or_insert(0) += 1;
        *self.counts.entry(b.to_string()).or_insert(0) += 1;
    }

    /// Overlap count for `id` (0 if absent).
    pub fn get(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Number of paths with an entry.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over `(id, count)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }

    /// Number of overlapping pairs found (each pair adds 2 to the sum of counts).
    pub fn overlapping_pairs(&self) -> u32 {
        self.counts.values().sum::<u32>() / 2
    }
}

/// Smallest of the four endpoint-to-endpoint distances between two segments.
#[inline]
fn min_endpoint_distance(a: &[GeoPoint], b: &[GeoPoint]) -> f64 {
    haversine_distance(&a[0], &b[0])
        .min(haversine_distance(&a[0], &b[1]))
        .min(haversine_distance(&a[1], &b[0]))
        .min(haversine_distance(&a[1], &b[1]))
}

/// Check whether any segment of `a` comes within `tolerance_meters` of any
/// segment of `b`, judged by segment endpoints.
///
/// Paths with fewer than two points have no segments and are never near.
///
/// # Example
/// ```
/// use danger_paths::{GeoPoint, paths_are_near};
///
/// let a = vec![GeoPoint::new(35.8540, 128.4860), GeoPoint::new(35.8550, 128.4860)];
/// let b = vec![GeoPoint::new(35.8540, 128.4861), GeoPoint::new(35.8550, 128.4861)];
///
/// assert!(paths_are_near(&a, &b, 30.0));
/// assert!(!paths_are_near(&a[..1], &b, 30.0));
/// ```
pub fn paths_are_near(a: &[GeoPoint], b: &[GeoPoint], tolerance_meters: f64) -> bool {
    if a.len() < 2 || b.len() < 2 {
        return false;
    }

    a.windows(2).any(|seg_a| {
        b.windows(2)
            .any(|seg_b| min_endpoint_distance(seg_a, seg_b) <= tolerance_meters)
    })
}

/// Count overlaps by comparing every unordered pair of paths.
///
/// Each near pair adds exactly 1 to both paths' counts. Empty input gives an
/// empty map; a single path gives a zero entry.
pub fn count_overlaps(paths: &[ResolvedPath], config: &OverlapConfig) -> OverlapCounts {
    let start = Instant::now();
    let mut counts = OverlapCounts::for_paths(paths);

    for (i, a) in paths.iter().enumerate() {
        for b in &paths[i + 1..] {
            if paths_are_near(a.coords(), b.coords(), config.tolerance_meters) {
                counts.record_pair(&a.id, &b.id);
            }
        }
    }

    debug!(
        "[Overlap] {} paths, {} overlapping pairs in {}ms",
        paths.len(),
        counts.overlapping_pairs(),
        start.elapsed().as_millis()
    );

    counts
}

// =============================================================================
// R-tree Pre-filter
// =============================================================================

/// A path's bounding box, expanded by the tolerance, for R-tree queries.
#[derive(Debug, Clone)]
struct PathEnvelope {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PathEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Envelopes for one path's expanded box.
///
/// A box that runs past the antimeridian also gets a copy shifted by 360
/// degrees, so paths either side of it still meet in the tree.
fn path_envelopes(idx: usize, b: &Bounds) -> Vec<PathEnvelope> {
    let at = |shift: f64| PathEnvelope {
        idx,
        envelope: AABB::from_corners([b.min_lng + shift, b.min_lat], [b.max_lng + shift, b.max_lat]),
    };

    let mut envelopes = vec![at(0.0)];
    if b.max_lng > 180.0 {
        envelopes.push(at(-360.0));
    }
    if b.min_lng < -180.0 {
        envelopes.push(at(360.0));
    }
    envelopes
}

/// Index pairs `(i, j)`, `i < j`, whose expanded boxes intersect.
///
/// Paths without segments are left out of the tree entirely.
fn candidate_pairs(paths: &[ResolvedPath], tolerance_meters: f64) -> Vec<(usize, usize)> {
    let envelopes: Vec<PathEnvelope> = paths
        .iter()
        .enumerate()
        .filter(|(_, p)| p.segment_count() > 0)
        .filter_map(|(idx, p)| Some(path_envelopes(idx, &expand_bounds(&p.bounds()?, tolerance_meters))))
        .flatten()
        .collect();

    let rtree = RTree::bulk_load(envelopes.clone());

    let mut pairs: Vec<(usize, usize)> = envelopes
        .iter()
        .flat_map(|a| {
            rtree
                .locate_in_envelope_intersecting(&a.envelope)
                .filter(move |b| b.idx > a.idx)
                .map(move |b| (a.idx, b.idx))
        })
        .collect();

    // Wrapped copies can report the same pair twice
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Count overlaps, comparing only pairs whose tolerance-expanded bounding
/// boxes intersect.
///
/// Gives the same counts as [`count_overlaps`].
pub fn count_overlaps_indexed(paths: &[ResolvedPath], config: &OverlapConfig) -> OverlapCounts {
    let start = Instant::now();
    let mut counts = OverlapCounts::for_paths(paths);

    let pairs = candidate_pairs(paths, config.tolerance_meters);
    let total_pairs = paths.len() * paths.len().saturating_sub(1) / 2;

    for &(i, j) in &pairs {
        if paths_are_near(paths[i].coords(), paths[j].coords(), config.tolerance_meters) {
            counts.record_pair(&paths[i].id, &paths[j].id);
        }
    }

    debug!(
        "[Overlap] {} paths, {}/{} pairs after R-tree filter, {} overlapping in {}ms",
        paths.len(),
        pairs.len(),
        total_pairs,
        counts.overlapping_pairs(),
        start.elapsed().as_millis()
    );

    counts
}

/// Count overlaps using the R-tree pre-filter and rayon for the pair checks.
///
/// Recommended for large batches (hundreds of paths). Gives the same counts
/// as [`count_overlaps`].
#[cfg(feature = "parallel")]
pub fn count_overlaps_parallel(paths: &[ResolvedPath], config: &OverlapConfig) -> OverlapCounts {
    use rayon::prelude::*;

    let start = Instant::now();
    let mut counts = OverlapCounts::for_paths(paths);

    let pairs = candidate_pairs(paths, config.tolerance_meters);
    let candidates = pairs.len();

    // Pair checks in parallel, counting is sequential
    let near: Vec<(usize, usize)> = pairs
        .into_par_iter()
        .filter(|&(i, j)| paths_are_near(paths[i].coords(), paths[j].coords(), config.tolerance_meters))
        .collect();

    for (i, j) in near {
        counts.record_pair(&paths[i].id, &paths[j].id);
    }

    debug!(
        "[Overlap] {} paths, {} candidate pairs, {} overlapping (parallel) in {}ms",
        paths.len(),
        candidates,
        counts.overlapping_pairs(),
        start.elapsed().as_millis()
    );

    counts
}
