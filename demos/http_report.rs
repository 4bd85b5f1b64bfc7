//! Build a danger map report from a running admin backend.
//!
//! Run with: cargo run --example http_report --features http -- [BASE_URL] [CATEGORY] [DANGER_LEVEL]
//!
//! Defaults to `http://localhost:3001` with both filters set to "all".

use danger_paths::{run_report_blocking, EngineConfig, FilterCriteria, HttpConfig};
use std::time::Instant;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let http = HttpConfig {
        base_url: args.first().cloned().unwrap_or_else(|| HttpConfig::default().base_url),
        ..HttpConfig::default()
    };
    let category = args.get(1).map_or("all", String::as_str);
    let danger_level = args.get(2).map_or("all", String::as_str);

    let criteria = FilterCriteria::parse(category, danger_level);

    println!("Fetching complaints from {}", http.base_url);
    let start = Instant::now();

    match run_report_blocking(http, EngineConfig::default(), &criteria) {
        Ok(report) => {
            println!(
                "{} paths shown, {} dropped, {:.2}s\n",
                report.records.len(),
                report.diagnostics.len(),
                start.elapsed().as_secs_f64()
            );
            match serde_json::to_string_pretty(&report.records) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to encode report: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Report failed: {}", e);
            std::process::exit(1);
        }
    }
}
