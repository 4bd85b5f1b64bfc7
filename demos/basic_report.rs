//! Basic example of building a danger map report from complaint records.
//!
//! Run with: cargo run --example basic_report

use async_trait::async_trait;
use danger_paths::{
    ComplaintRecord, ComplaintSource, DangerMapEngine, FilterCriteria, GeoPoint, Result,
    RouteRegistrar, RouteRegistration,
};

/// Complaint store backed by an in-memory JSON document.
struct FixtureStore;

#[async_trait]
impl ComplaintSource for FixtureStore {
    async fn list_complaints(&self) -> Result<Vec<ComplaintRecord>> {
        let json = r#"[
            {"id": 1, "start_lat": 35.8540, "start_lng": 128.4860, "end_lat": 35.8560, "end_lng": 128.4860,
             "route_coords": "[[128.4860, 35.8540], [128.4860, 35.8550], [128.4860, 35.8560]]",
             "category": "가로등 부재", "danger_level": "높음", "reason": "Street lights out for a week"},
            {"id": 2, "start_lat": 35.8540, "start_lng": 128.4861, "end_lat": 35.8560, "end_lng": 128.4861,
             "route_coords": "[[128.4861, 35.8540], [128.4861, 35.8550], [128.4861, 35.8560]]",
             "category": "CCTV 부재", "danger_level": "중간", "reason": "No cameras along the underpass"},
            {"id": 3, "start_lat": 35.8700, "start_lng": 128.6000, "end_lat": 35.8710, "end_lng": 128.6010,
             "route_coords": null, "category": "좁은 길목", "danger_level": "낮음", "reason": "Narrow alley"},
            {"id": 4, "start_lat": 35.8800, "start_lng": 128.6100, "end_lat": 35.8810, "end_lng": 128.6110,
             "route_coords": "not json", "category": "기타", "danger_level": "낮음", "reason": "Broken record"}
        ]"#;
        Ok(serde_json::from_str(json)?)
    }
}

/// Router that draws a straight line between the endpoints.
struct StraightLineRouter;

#[async_trait]
impl RouteRegistrar for StraightLineRouter {
    async fn register_route(&self, start: GeoPoint, end: GeoPoint) -> Result<RouteRegistration> {
        Ok(RouteRegistration::routed(vec![start, end]))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let engine = DangerMapEngine::new(FixtureStore, StraightLineRouter);
    let report = engine.run(&FilterCriteria::all()).await?;

    println!("Danger Map Report\n");
    println!("Tolerance: {}m\n", engine.config().overlap.tolerance_meters);

    for record in &report.records {
        println!(
            "  #{:<3} {:<8} {:<16} overlaps={} color={} points={}",
            record.id,
            record.danger_level.map_or("unset".to_string(), |l| l.to_string()),
            record.category.map_or("-".to_string(), |c| c.to_string()),
            record.overlap_count,
            record.stroke_color(),
            record.coords.len(),
        );
        println!("        {}", record.reason_or_default());
    }

    if !report.diagnostics.is_empty() {
        println!("\nDropped records:");
        for err in &report.diagnostics {
            println!("  {}", err);
        }
    }

    Ok(())
}
