//! Per-path report records for map renderers and reporting jobs.

use serde::{Deserialize, Serialize};

use crate::ranking::filter_paths;
use crate::{Category, DangerLevel, FilterCriteria, GeoPoint, OverlapCounts, ResolvedPath};

/// Number of complaints listed under the map by default.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Stroke colour for paths without a danger level.
const UNSET_COLOR: &str = "#999999";

/// Everything a renderer needs to draw and describe one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    pub reason: String,
    pub category: Option<Category>,
    pub danger_level: Option<DangerLevel>,
    /// Number of other paths passing near this one.
    pub overlap_count: u32,
    pub coords: Vec<GeoPoint>,
    pub created_at: Option<String>,
}

impl ReportRecord {
    /// Stroke colour keyed by danger level.
    pub fn stroke_color(&self) -> &'static str {
        match self.danger_level {
            Some(DangerLevel::High) => "#dc2626",
            Some(DangerLevel::Medium) => "#f59e0b",
            Some(DangerLevel::Low) => "#3b82f6",
            None => UNSET_COLOR,
        }
    }

    /// Reason text, or a placeholder when the complaint gave none.
    pub fn reason_or_default(&self) -> &str {
        let reason = self.reason.trim();
        if reason.is_empty() {
            "(no reason)"
        } else {
            reason
        }
    }
}

/// Merge overlap counts into ranked paths.
///
/// Output order is exactly the input order. Ids missing from `counts` get an
/// overlap count of 0.
pub fn build_report(ranked: &[ResolvedPath], counts: &OverlapCounts) -> Vec<ReportRecord> {
    ranked
        .iter()
        .map(|path| ReportRecord {
            id: path.id.clone(),
            reason: path.reason.clone(),
            category: path.category,
            danger_level: path.danger_level,
            overlap_count: counts.get(&path.id),
            coords: path.coords().to_vec(),
            created_at: path.created_at.clone(),
        })
        .collect()
}

/// The first `limit` paths matching `criteria`, in source order.
///
/// Built from resolved paths, so complaints dropped for malformed
/// coordinates or failed routing are not listed.
pub fn recent_complaints(
    paths: &[ResolvedPath],
    criteria: &FilterCriteria,
    limit: usize,
) -> Vec<ResolvedPath> {
    let mut filtered = filter_paths(paths, criteria);
    filtered.truncate(limit);
    filtered
}
