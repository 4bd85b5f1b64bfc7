//! Example of overlap counting over a large synthetic batch.
//!
//! Run with: cargo run --example batch_overlap --features parallel

use danger_paths::{
    count_overlaps, count_overlaps_indexed, count_overlaps_parallel, DangerPath, GeoPoint,
    OverlapConfig, ResolvedPath,
};
use std::time::Instant;

fn main() {
    println!("Batch Overlap Counting Example\n");

    // 40 x 10 grid of short north-south paths around Daegu, ~20m apart east-west
    let mut paths = Vec::new();
    for col in 0..40 {
        for row in 0..10 {
            let lat = 35.850 + row as f64 * 0.01;
            let lng = 128.480 + col as f64 * 0.0002;
            let coords: Vec<GeoPoint> = (0..8)
                .map(|k| GeoPoint::new(lat + k as f64 * 0.0003, lng))
                .collect();
            let path = DangerPath::new(format!("{}-{}", col, row), coords[0], coords[7])
                .with_coords(coords);
            if let Some(resolved) = ResolvedPath::from_path(path) {
                paths.push(resolved);
            }
        }
    }

    let config = OverlapConfig::default();
    println!("Paths: {}, tolerance: {}m\n", paths.len(), config.tolerance_meters);

    let start = Instant::now();
    let naive = count_overlaps(&paths, &config);
    println!("Naive:    {:>4} pairs in {:?}", naive.overlapping_pairs(), start.elapsed());

    let start = Instant::now();
    let indexed = count_overlaps_indexed(&paths, &config);
    println!("R-tree:   {:>4} pairs in {:?}", indexed.overlapping_pairs(), start.elapsed());

    let start = Instant::now();
    let parallel = count_overlaps_parallel(&paths, &config);
    println!("Parallel: {:>4} pairs in {:?}", parallel.overlapping_pairs(), start.elapsed());

    assert_eq!(naive, indexed);
    assert_eq!(naive, parallel);

    let busiest = naive.iter().max_by_key(|(_, count)| *count);
    if let Some((id, count)) = busiest {
        println!("\nMost overlapped path: {} ({} neighbours)", id, count);
    }
}
