//! File-backed replay tests

#![cfg(all(test, feature = "std"))]

#[macro_use]
mod common;

use std::fmt::Write as _;
use std::fs;

use stratofuse_core::replay::{
    replay_file, ColumnLayout, OutputFormat, ReplayConfig, ReplayError, ReplayRecord, CSV_HEADER,
};

/// Flight-log row in the default 21-column layout
fn log_row(time: u32, altitude: f32, accel: [f32; 3], mag: [f32; 3], gyro: [f32; 3]) -> String {
    let mut cols = vec![String::from("0"); 21];
    cols[1] = time.to_string();
    cols[7] = altitude.to_string();
    for i in 0..3 {
        cols[12 + i] = accel[i].to_string();
        cols[15 + i] = mag[i].to_string();
        cols[18 + i] = gyro[i].to_string();
    }
    cols.join(",")
}

fn pad_log(rows: usize) -> String {
    let mut log = String::from("idx,time,a,b,c,d,e,alt,f,g,h,i,ax,ay,az,mx,my,mz,gx,gy,gz\n");
    for i in 1..=rows as u32 {
        writeln!(log, "{}", log_row(i * 20, 0.0, [0.0, 0.0, 9.81], [1.0, 0.0, 0.0], [0.0; 3])).unwrap();
    }
    log
}

#[test]
fn replays_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pad.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, pad_log(100)).unwrap();

    let stats = replay_file(&input, &output, &ReplayConfig::default()).unwrap();
    assert_eq!(stats.rows_read, 100);
    assert_eq!(stats.rows_written, 100);
    assert_eq!(stats.rows_skipped, 0);

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));

    let last: Vec<f32> = lines
        .last()
        .unwrap()
        .split(',')
        .map(|f| f.parse().unwrap())
        .collect();
    assert_eq!(last.len(), 7);
    assert_eq!(last[0], 2000.0);
    // Sitting on the pad: altitude, velocity and attitude stay at zero
    for value in &last[1..] {
        assert_within_tolerance!(*value, 0.0, 1e-3);
    }
}

#[test]
fn replays_json_lines_with_custom_layout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.csv");
    let output = dir.path().join("out.jsonl");

    // time, alt, ax, ay, az, mx, my, mz, gx, gy, gz
    let mut log = String::new();
    for i in 1..=10u32 {
        writeln!(log, "{},12.0,0,0,9.81,1,0,0,0,0,0", i * 10).unwrap();
    }
    fs::write(&input, log).unwrap();

    let layout = ColumnLayout {
        time: 0,
        altitude: 1,
        accel: [2, 3, 4],
        mag: [5, 6, 7],
        gyro: [8, 9, 10],
    };
    let config = ReplayConfig::default()
        .with_columns(layout)
        .with_header_lines(0)
        .with_format(OutputFormat::JsonLines);

    let stats = replay_file(&input, &output, &config).unwrap();
    assert_eq!(stats.rows_written, 10);

    let text = fs::read_to_string(&output).unwrap();
    let records: Vec<ReplayRecord> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0].time_ms, 10);
    assert_eq!(records[9].time_ms, 100);
    // Barometer at 12 m pulls the altitude up from zero
    assert!(records[9].altitude > records[0].altitude);
}

#[test]
fn skips_and_counts_bad_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.csv");
    let output = dir.path().join("out.csv");

    let mut log = pad_log(5);
    log.push_str("truncated,row\n");
    writeln!(log, "{}", log_row(120, 0.0, [0.0, 0.0, 9.81], [1.0, 0.0, 0.0], [0.0; 3]).replace("9.81", "nan?")).unwrap();
    fs::write(&input, log).unwrap();

    let stats = replay_file(&input, &output, &ReplayConfig::default()).unwrap();
    assert_eq!(stats.rows_read, 7);
    assert_eq!(stats.rows_written, 5);
    assert_eq!(stats.rows_skipped, 2);
}

#[test]
fn missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = replay_file(
        dir.path().join("absent.csv"),
        dir.path().join("out.csv"),
        &ReplayConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReplayError::Io(_)));
}
