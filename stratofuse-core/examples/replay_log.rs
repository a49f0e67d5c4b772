//! Replay a recorded flight log through the estimator
//!
//! ```text
//! cargo run --example replay_log -- flight.csv estimates.csv [--json]
//! ```

use std::env;
use std::process;

use stratofuse_core::replay::{replay_file, OutputFormat, ReplayConfig};
use stratofuse_core::EstimatorConfig;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: replay_log <input.csv> <output> [--json]");
        process::exit(2);
    }

    let format = if args.iter().any(|a| a == "--json") {
        OutputFormat::JsonLines
    } else {
        OutputFormat::Csv
    };

    // Sample tuning from the bench logs; calibrate per vehicle
    let estimator = EstimatorConfig::new(8.0, 8.0, 8.0, 0.1);
    let config = ReplayConfig::default()
        .with_estimator(estimator)
        .with_format(format);

    match replay_file(&args[0], &args[1], &config) {
        Ok(stats) => println!(
            "{} rows read, {} written, {} skipped",
            stats.rows_read, stats.rows_written, stats.rows_skipped
        ),
        Err(e) => {
            eprintln!("replay failed: {}", e);
            process::exit(1);
        }
    }
}
