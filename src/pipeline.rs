//! End-to-end danger map pipeline.
//!
//! complaints → decode → resolve → filter → overlap counts → rank → report
//!
//! Only fetching the complaint list can fail the run. Malformed records and
//! unroutable paths are dropped individually and reported in
//! [`DangerMapReport::diagnostics`].

use std::time::Instant;

use log::info;

use crate::overlap::OverlapConfig;
use crate::report::DEFAULT_RECENT_LIMIT;
use crate::resolver::DEFAULT_RESOLVE_CONCURRENCY;
use crate::{
    build_report, decode_complaints, filter_paths, rank_by_danger, recent_complaints, resolve_all,
    ComplaintRecord, ComplaintSource, DangerMapError, FilterCriteria, OverlapCounts, ReportRecord,
    ResolvedPath, Result, RouteRegistrar,
};

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Overlap tolerance settings.
    pub overlap: OverlapConfig,
    /// Maximum routing calls in flight. Default: 8
    pub resolve_concurrency: usize,
    /// Length of the recent complaint list. Default: 10
    pub recent_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overlap: OverlapConfig::default(),
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Default)]
pub struct DangerMapReport {
    /// Report records in draw order (ascending danger).
    pub records: Vec<ReportRecord>,
    /// The filtered paths in the same order, for drawing.
    pub paths: Vec<ResolvedPath>,
    /// Overlap counts over the filtered paths.
    pub overlap_counts: OverlapCounts,
    /// First few filtered complaints in source order.
    pub recent: Vec<ResolvedPath>,
    /// Records that were dropped, one error each.
    pub diagnostics: Vec<DangerMapError>,
}

/// Filter, count overlaps, rank, and build the report for resolved paths.
pub fn analyze_paths(
    resolved: &[ResolvedPath],
    criteria: &FilterCriteria,
    config: &EngineConfig,
) -> DangerMapReport {
    let filtered = filter_paths(resolved, criteria);

    #[cfg(feature = "parallel")]
    let overlap_counts = crate::overlap::count_overlaps_parallel(&filtered, &config.overlap);
    #[cfg(not(feature = "parallel"))]
    let overlap_counts = crate::overlap::count_overlaps_indexed(&filtered, &config.overlap);

    let paths = rank_by_danger(&filtered);
    let records = build_report(&paths, &overlap_counts);

    DangerMapReport {
        records,
        paths,
        overlap_counts,
        recent: recent_complaints(resolved, criteria, config.recent_limit),
        diagnostics: Vec::new(),
    }
}

/// Pipeline bound to a complaint store and a routing service.
pub struct DangerMapEngine<S, R> {
    source: S,
    registrar: R,
    config: EngineConfig,
}

impl<S, R> DangerMapEngine<S, R>
where
    S: ComplaintSource,
    R: RouteRegistrar,
{
    pub fn new(source: S, registrar: R) -> Self {
        Self::with_config(source, registrar, EngineConfig::default())
    }

    pub fn with_config(source: S, registrar: R, config: EngineConfig) -> Self {
        Self { source, registrar, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch complaints from the store and run the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error only if the complaint list cannot be fetched.
    pub async fn run(&self, criteria: &FilterCriteria) -> Result<DangerMapReport> {
        let records = self.source.list_complaints().await?;
        Ok(self.run_records(records, criteria).await)
    }

    /// Run the pipeline over complaint records that were already fetched.
    pub async fn run_records(
        &self,
        records: Vec<ComplaintRecord>,
        criteria: &FilterCriteria,
    ) -> DangerMapReport {
        let start = Instant::now();
        let total = records.len();

        let (paths, mut diagnostics) = decode_complaints(records);
        let outcome = resolve_all(paths, &self.registrar, self.config.resolve_concurrency).await;
        diagnostics.extend(outcome.failures);

        let mut report = analyze_paths(&outcome.resolved, criteria, &self.config);
        report.diagnostics = diagnostics;

        info!(
            "[Pipeline] {} complaints -> {} resolved, {} shown, {} overlapping pairs, {} dropped in {}ms",
            total,
            outcome.resolved.len(),
            report.records.len(),
            report.overlap_counts.overlapping_pairs(),
            report.diagnostics.len(),
            start.elapsed().as_millis()
        );

        report
    }
}
