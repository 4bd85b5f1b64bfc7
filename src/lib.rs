//! # Danger Paths
//!
//! Overlap clustering and risk ranking for citizen-reported danger paths.
//!
//! This library provides:
//! - Route resolution for complaints that arrive without a polyline
//! - Pairwise overlap counting between paths within a distance tolerance
//! - Stable danger-level ranking and category / danger-level filtering
//! - Per-path report records ready for a map renderer
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel overlap counting with rayon
//! - **`http`** - Enable HTTP clients for the complaint store and routing service
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use danger_paths::{
//!     DangerLevel, DangerPath, GeoPoint, OverlapConfig, ResolvedPath,
//!     build_report, count_overlaps, rank_by_danger,
//! };
//!
//! let line = vec![GeoPoint::new(35.8540, 128.4860), GeoPoint::new(35.8550, 128.4860)];
//!
//! let a = DangerPath::new("a", line[0], line[1])
//!     .with_coords(line.clone())
//!     .with_danger_level(DangerLevel::High);
//! let b = DangerPath::new("b", line[0], line[1])
//!     .with_coords(line.clone())
//!     .with_danger_level(DangerLevel::Low);
//!
//! let paths: Vec<ResolvedPath> = [a, b].into_iter().filter_map(ResolvedPath::from_path).collect();
//! let counts = count_overlaps(&paths, &OverlapConfig::default());
//! let report = build_report(&rank_by_danger(&paths), &counts);
//!
//! assert_eq!(report[0].id, "b");
//! assert_eq!(report[0].overlap_count, 1);
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub mod error;
pub use error::{DangerMapError, Result};

pub mod geo_utils;

// Wire records from the complaint store
pub mod complaint;
pub use complaint::{decode_complaints, parse_route_coords, ComplaintRecord};

// Route resolution against the routing service
pub mod resolver;
pub use resolver::{
    resolve, resolve_all, ComplaintSource, ResolveOutcome, RouteRegistrar, RouteRegistration,
};

// Pairwise overlap counting
pub mod overlap;
pub use overlap::{
    count_overlaps, count_overlaps_indexed, paths_are_near, OverlapConfig, OverlapCounts,
    DEFAULT_TOLERANCE_METERS,
};

#[cfg(feature = "parallel")]
pub use overlap::count_overlaps_parallel;

// Danger ranking and filtering
pub mod ranking;
pub use ranking::{danger_priority, filter_paths, rank_by_danger, FilterCriteria, Selection};

// Report records for renderers
pub mod report;
pub use report::{build_report, recent_complaints, ReportRecord};

// End-to-end pipeline
pub mod pipeline;
pub use pipeline::{analyze_paths, DangerMapEngine, DangerMapReport, EngineConfig};

// HTTP clients for the complaint store and routing service
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{run_report_blocking, ComplaintApiClient, HttpConfig};

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use danger_paths::GeoPoint;
/// let point = GeoPoint::new(35.854, 128.486); // Daegu
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Create a point from the `[lng, lat]` pair used on the wire.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[1], pair[0])
    }

    /// The `[lng, lat]` pair used on the wire.
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Largest absolute latitude covered by the box.
    pub fn max_abs_lat(&self) -> f64 {
        self.min_lat.abs().max(self.max_lat.abs())
    }
}

/// Kind of hazard a complaint reports.
///
/// Parsing accepts the canonical name or the display label used by the
/// complaint store, case-sensitively. Callers trim input first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
pub enum Category {
    #[strum(to_string = "no-CCTV", serialize = "CCTV 부재")]
    #[serde(rename = "no-CCTV")]
    NoCctv,
    #[strum(to_string = "no-streetlight", serialize = "가로등 부재")]
    #[serde(rename = "no-streetlight")]
    NoStreetlight,
    #[strum(to_string = "narrow-passage", serialize = "좁은 길목")]
    #[serde(rename = "narrow-passage")]
    NarrowPassage,
    #[strum(to_string = "broken-pavement", serialize = "보도블럭 파손")]
    #[serde(rename = "broken-pavement")]
    BrokenPavement,
    #[strum(to_string = "illegal-dumping", serialize = "쓰레기 무단 투기")]
    #[serde(rename = "illegal-dumping")]
    IllegalDumping,
    #[strum(to_string = "other", serialize = "기타")]
    #[serde(rename = "other")]
    Other,
}

/// Danger level assigned to a complaint. "Unset" is modelled as `None`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
pub enum DangerLevel {
    #[strum(to_string = "low", serialize = "낮음")]
    #[serde(rename = "low")]
    Low,
    #[strum(to_string = "medium", serialize = "중간")]
    #[serde(rename = "medium")]
    Medium,
    #[strum(to_string = "high", serialize = "높음")]
    #[serde(rename = "high")]
    High,
}

/// Parse a category string, trimming surrounding whitespace first.
///
/// Returns `None` for blank or unrecognised values.
pub fn parse_category(raw: &str) -> Option<Category> {
    raw.trim().parse().ok()
}

/// Parse a danger level string, trimming surrounding whitespace first.
///
/// Returns `None` for blank or unrecognised values (treated as unset).
pub fn parse_danger_level(raw: &str) -> Option<DangerLevel> {
    raw.trim().parse().ok()
}

/// A single complaint's danger path.
///
/// `coords` is either supplied by the complaint store or filled in once by
/// the resolver; nothing in this crate mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DangerPath {
    pub id: String,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub coords: Option<Vec<GeoPoint>>,
    pub category: Option<Category>,
    pub danger_level: Option<DangerLevel>,
    pub reason: String,
    /// Creation timestamp exactly as the complaint store reported it.
    pub created_at: Option<String>,
}

impl DangerPath {
    /// Create a path with no geometry and no metadata.
    pub fn new(id: impl Into<String>, start: GeoPoint, end: GeoPoint) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            coords: None,
            category: None,
            danger_level: None,
            reason: String::new(),
            created_at: None,
        }
    }

    pub fn with_coords(mut self, coords: Vec<GeoPoint>) -> Self {
        self.coords = Some(coords);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_danger_level(mut self, level: DangerLevel) -> Self {
        self.danger_level = Some(level);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// True when the path already carries a usable coordinate sequence.
    pub fn has_coords(&self) -> bool {
        self.coords.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A path guaranteed to carry a non-empty coordinate sequence.
///
/// Construct with [`ResolvedPath::from_path`] or via the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub id: String,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub category: Option<Category>,
    pub danger_level: Option<DangerLevel>,
    pub reason: String,
    pub created_at: Option<String>,
    coords: Vec<GeoPoint>,
}

impl ResolvedPath {
    /// Promote a path whose coordinates are already present.
    ///
    /// Returns `None` if `coords` is missing or empty.
    pub fn from_path(mut path: DangerPath) -> Option<Self> {
        let coords = path.coords.take()?;
        Self::with_route(path, coords)
    }

    /// Attach a freshly routed coordinate sequence to a path.
    ///
    /// Returns `None` if `coords` is empty.
    pub fn with_route(path: DangerPath, coords: Vec<GeoPoint>) -> Option<Self> {
        if coords.is_empty() {
            return None;
        }
        Some(Self::from_parts(path, coords))
    }

    /// Callers guarantee `coords` is non-empty.
    pub(crate) fn from_parts(path: DangerPath, coords: Vec<GeoPoint>) -> Self {
        debug_assert!(!coords.is_empty());
        Self {
            id: path.id,
            start: path.start,
            end: path.end,
            category: path.category,
            danger_level: path.danger_level,
            reason: path.reason,
            created_at: path.created_at,
            coords,
        }
    }

    /// The resolved coordinate sequence (never empty).
    pub fn coords(&self) -> &[GeoPoint] {
        &self.coords
    }

    /// Number of segments (`coords.len() - 1`).
    pub fn segment_count(&self) -> usize {
        self.coords.len().saturating_sub(1)
    }

    /// Bounding box of the coordinate sequence.
    pub fn bounds(&self) -> Option<Bounds> {
        geo_utils::compute_bounds(&self.coords)
    }

    /// Total path length in meters.
    pub fn length_meters(&self) -> f64 {
        geo_utils::polyline_length(&self.coords)
    }

    /// The path as a `geo` line string (x = longitude, y = latitude).
    pub fn to_line_string(&self) -> geo::LineString<f64> {
        geo_utils::to_line_string(&self.coords)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(35.8540, 128.4860),
            GeoPoint::new(35.8545, 128.4865),
            GeoPoint::new(35.8550, 128.4870),
        ]
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(35.854, 128.486).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_lng_lat_pair_order() {
        let p = GeoPoint::from_lng_lat([128.486, 35.854]);
        assert_eq!(p.latitude, 35.854);
        assert_eq!(p.longitude, 128.486);
        assert_eq!(p.to_lng_lat(), [128.486, 35.854]);
    }

    #[test]
    fn test_category_parsing_accepts_both_labels() {
        assert_eq!(parse_category("no-CCTV"), Some(Category::NoCctv));
        assert_eq!(parse_category(" CCTV 부재 "), Some(Category::NoCctv));
        assert_eq!(parse_category("쓰레기 무단 투기"), Some(Category::IllegalDumping));
        assert_eq!(parse_category("No-cctv"), None);
        assert_eq!(parse_category(""), None);
        assert_eq!(Category::NarrowPassage.to_string(), "narrow-passage");
    }

    #[test]
    fn test_every_label_round_trips() {
        use strum::IntoEnumIterator;

        for category in Category::iter() {
            assert_eq!(parse_category(&category.to_string()), Some(category));
        }
        for level in DangerLevel::iter() {
            assert_eq!(parse_danger_level(&level.to_string()), Some(level));
        }
    }

    #[test]
    fn test_danger_level_parsing() {
        assert_eq!(parse_danger_level("높음 "), Some(DangerLevel::High));
        assert_eq!(parse_danger_level("medium"), Some(DangerLevel::Medium));
        assert_eq!(parse_danger_level("LOW"), None);
        assert_eq!(DangerLevel::Low.to_string(), "low");
    }

    #[test]
    fn test_resolved_path_requires_coords() {
        let start = GeoPoint::new(35.854, 128.486);
        let end = GeoPoint::new(35.855, 128.487);

        assert!(ResolvedPath::from_path(DangerPath::new("1", start, end)).is_none());
        assert!(ResolvedPath::from_path(DangerPath::new("1", start, end).with_coords(vec![])).is_none());

        let resolved = ResolvedPath::from_path(
            DangerPath::new("1", start, end)
                .with_coords(sample_route())
                .with_reason("dark alley"),
        )
        .unwrap();
        assert_eq!(resolved.coords().len(), 3);
        assert_eq!(resolved.segment_count(), 2);
        assert_eq!(resolved.reason, "dark alley");
        assert!(resolved.length_meters() > 0.0);
    }

    #[test]
    fn test_line_string_uses_lng_as_x() {
        let start = GeoPoint::new(35.854, 128.486);
        let path = DangerPath::new("1", start, start).with_coords(sample_route());
        let line = ResolvedPath::from_path(path).unwrap().to_line_string();
        assert_eq!(line.0[0].x, 128.4860);
        assert_eq!(line.0[0].y, 35.8540);
    }
}
