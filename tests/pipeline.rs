//! End-to-end tests for resolution, overlap counting, ranking, and reporting.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use danger_paths::{
    analyze_paths, build_report, count_overlaps, rank_by_danger, resolve_all, Category,
    ComplaintRecord, ComplaintSource, DangerLevel, DangerMapEngine, DangerMapError, DangerPath,
    EngineConfig, FilterCriteria, GeoPoint, OverlapConfig, ResolvedPath, Result, RouteRegistrar,
    RouteRegistration,
};

fn line(lng: f64, lat0: f64) -> Vec<GeoPoint> {
    (0..3).map(|k| GeoPoint::new(lat0 + k as f64 * 0.001, lng)).collect()
}

fn resolved(id: &str, coords: Vec<GeoPoint>, level: DangerLevel) -> ResolvedPath {
    let (start, end) = (coords[0], coords[coords.len() - 1]);
    ResolvedPath::from_path(
        DangerPath::new(id, start, end)
            .with_coords(coords)
            .with_danger_level(level),
    )
    .unwrap()
}

/// Router that fails for any start point east of 128.55.
struct PickyRouter {
    calls: AtomicU32,
}

#[async_trait]
impl RouteRegistrar for PickyRouter {
    async fn register_route(&self, start: GeoPoint, end: GeoPoint) -> Result<RouteRegistration> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if start.longitude > 128.55 {
            return Ok(RouteRegistration::failed("no walkable route"));
        }
        Ok(RouteRegistration::routed(vec![start, end]))
    }
}

/// Router whose transport always errors.
struct DownRouter;

#[async_trait]
impl RouteRegistrar for DownRouter {
    async fn register_route(&self, _: GeoPoint, _: GeoPoint) -> Result<RouteRegistration> {
        Err(DangerMapError::Http("connection refused".to_string()))
    }
}

struct FixtureStore(&'static str);

#[async_trait]
impl ComplaintSource for FixtureStore {
    async fn list_complaints(&self) -> Result<Vec<ComplaintRecord>> {
        Ok(serde_json::from_str(self.0)?)
    }
}

#[test]
fn test_three_path_scenario() {
    // P1 and P2 run parallel ~9m apart, P3 is kilometres away
    let p1 = resolved("P1", line(128.4860, 35.854), DangerLevel::High);
    let p2 = resolved("P2", line(128.4861, 35.854), DangerLevel::Medium);
    let p3 = resolved("P3", line(128.6000, 35.870), DangerLevel::Low);
    let paths = vec![p1, p2, p3];

    let counts = count_overlaps(&paths, &OverlapConfig::default());
    assert_eq!(counts.get("P1"), 1);
    assert_eq!(counts.get("P2"), 1);
    assert_eq!(counts.get("P3"), 0);

    let ranked = rank_by_danger(&paths);
    let order: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["P3", "P2", "P1"]);

    let report = build_report(&ranked, &counts);
    assert_eq!(report[2].id, "P1");
    assert_eq!(report[2].overlap_count, 1);
    assert_eq!(report[0].overlap_count, 0);
}

#[test]
fn test_counts_are_symmetric() {
    let paths: Vec<ResolvedPath> = (0..8)
        .map(|k| resolved(&format!("p{k}"), line(128.48 + k as f64 * 0.00025, 35.85), DangerLevel::Low))
        .collect();
    let config = OverlapConfig::default();
    let counts = count_overlaps(&paths, &config);

    // Sum of counts is twice the number of near pairs
    let mut near_pairs = 0;
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            if danger_paths::paths_are_near(paths[i].coords(), paths[j].coords(), config.tolerance_meters) {
                near_pairs += 1;
            }
        }
    }
    let total: u32 = counts.iter().map(|(_, c)| c).sum();
    assert_eq!(total, 2 * near_pairs);
    assert_eq!(counts.overlapping_pairs(), near_pairs);
}

#[test]
fn test_analyze_counts_only_filtered_paths() {
    let mut a = resolved("a", line(128.4860, 35.854), DangerLevel::High);
    let mut b = resolved("b", line(128.4860, 35.854), DangerLevel::High);
    a.category = Some(Category::NoCctv);
    b.category = Some(Category::IllegalDumping);

    let criteria = FilterCriteria::all().with_category(Category::NoCctv);
    let report = analyze_paths(&[a, b], &criteria, &EngineConfig::default());

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].id, "a");
    assert_eq!(report.records[0].overlap_count, 0);
    assert_eq!(report.recent.len(), 1);
}

#[test]
fn test_analyze_counts_across_antimeridian() {
    let at = |lng: f64| vec![GeoPoint::new(10.0, lng), GeoPoint::new(10.0001, lng)];
    let paths = vec![
        resolved("east", at(179.99995), DangerLevel::Low),
        resolved("west", at(-179.99995), DangerLevel::Low),
    ];

    let report = analyze_paths(&paths, &FilterCriteria::all(), &EngineConfig::default());

    assert_eq!(report.overlap_counts.get("east"), 1);
    assert_eq!(report.overlap_counts.get("west"), 1);
}

#[tokio::test]
async fn test_failed_routing_drops_only_that_path() {
    let router = PickyRouter { calls: AtomicU32::new(0) };
    let origin = GeoPoint::new(35.854, 128.486);
    let paths = vec![
        DangerPath::new("ok", origin, GeoPoint::new(35.855, 128.487)),
        DangerPath::new("fails", GeoPoint::new(35.87, 128.60), GeoPoint::new(35.871, 128.601)),
        DangerPath::new("stored", origin, origin).with_coords(line(128.486, 35.854)),
    ];

    let outcome = resolve_all(paths, &router, 4).await;

    let ids: Vec<&str> = outcome.resolved.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["ok", "stored"]);
    assert_eq!(outcome.resolved[0].coords(), &[origin, GeoPoint::new(35.855, 128.487)]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].path_id(), Some("fails"));
    assert_eq!(router.calls.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn test_transport_errors_become_routing_failures() {
    let origin = GeoPoint::new(35.854, 128.486);
    let outcome = resolve_all(vec![DangerPath::new("x", origin, origin)], &DownRouter, 1).await;

    assert!(outcome.resolved.is_empty());
    match &outcome.failures[0] {
        DangerMapError::RoutingFailure { path_id, message } => {
            assert_eq!(path_id, "x");
            assert!(message.contains("connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_resolve_empty_batch() {
    let outcome = resolve_all(Vec::new(), &DownRouter, 8).await;
    assert!(outcome.resolved.is_empty());
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_engine_run_end_to_end() {
    let store = FixtureStore(
        r#"[
        {"id": 1, "start_lat": 35.854, "start_lng": 128.4860, "end_lat": 35.856, "end_lng": 128.4860,
         "route_coords": "[[128.4860, 35.854], [128.4860, 35.855], [128.4860, 35.856]]",
         "category": "가로등 부재", "danger_level": "높음", "reason": "dark"},
        {"id": 2, "start_lat": 35.854, "start_lng": 128.4861, "end_lat": 35.856, "end_lng": 128.4861,
         "route_coords": null, "category": "CCTV 부재", "danger_level": " 중간 ", "reason": "no cameras"},
        {"id": 3, "start_lat": 35.870, "start_lng": 128.6000, "end_lat": 35.871, "end_lng": 128.6010,
         "route_coords": null, "category": "기타", "danger_level": "낮음"},
        {"id": 4, "start_lat": 35.880, "start_lng": 128.4000, "end_lat": 35.881, "end_lng": 128.4010,
         "route_coords": "[[128.4", "category": "기타", "danger_level": "낮음"}
    ]"#,
    );
    let router = PickyRouter { calls: AtomicU32::new(0) };
    let engine = DangerMapEngine::new(store, router);

    let report = engine.run(&FilterCriteria::all()).await.unwrap();

    // 3 is unroutable, 4 has malformed coordinates
    let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(report.records[0].overlap_count, 1);
    assert_eq!(report.records[1].overlap_count, 1);
    assert_eq!(report.paths.len(), 2);

    let mut dropped: Vec<&str> = report.diagnostics.iter().filter_map(|e| e.path_id()).collect();
    dropped.sort_unstable();
    assert_eq!(dropped, vec!["3", "4"]);
    assert!(report
        .diagnostics
        .iter()
        .any(|e| matches!(e, DangerMapError::MalformedCoordinates { .. })));
}

#[tokio::test]
async fn test_engine_survives_bad_rows() {
    let store = FixtureStore(
        r#"[
        {"id": 1, "start_lat": "35.854", "start_lng": "128.4860", "end_lat": "35.856", "end_lng": "128.4860",
         "route_coords": null, "danger_level": "높음"},
        {"id": 2, "start_lat": null, "start_lng": 128.4861, "end_lat": 35.856, "end_lng": 128.4861},
        {"start_lat": 35.854, "start_lng": 128.4862, "end_lat": 35.856, "end_lng": 128.4862},
        {"id": 4, "start_lat": 35.854, "start_lng": 128.4861, "end_lat": 35.856, "end_lng": 128.4861,
         "route_coords": [[128.4861, 35.854], [128.4861, 35.856]], "danger_level": "낮음"}
    ]"#,
    );
    let engine = DangerMapEngine::new(store, PickyRouter { calls: AtomicU32::new(0) });

    let report = engine.run(&FilterCriteria::all()).await.unwrap();

    let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "1"]);
    assert_eq!(report.records[1].overlap_count, 1);
    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.diagnostics[0].path_id(), Some("2"));
    assert!(matches!(report.diagnostics[1], DangerMapError::MalformedRecord { .. }));
}

#[tokio::test]
async fn test_engine_fails_when_store_is_unreadable() {
    let engine = DangerMapEngine::new(FixtureStore("{not json"), DownRouter);
    assert!(engine.run(&FilterCriteria::all()).await.is_err());
}
