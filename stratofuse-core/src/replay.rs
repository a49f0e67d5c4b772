//! Flight Log Replay
//!
//! Runs recorded sensor logs through an [`Estimator`] offline, for filter
//! tuning and regression plots.
//!
//! ## Input
//!
//! Comma-separated rows, one sample per line. Column positions are
//! configurable through [`ColumnLayout`]; the default matches the flight
//! computer's log format (zero-based):
//!
//! | Column | Field                  |
//! |--------|------------------------|
//! | 1      | time (ms)              |
//! | 7      | barometric altitude (m)|
//! | 12–14  | accel x, y, z          |
//! | 15–17  | mag x, y, z            |
//! | 18–20  | gyro x, y, z           |
//!
//! The first line is a header and is skipped. Blank lines are ignored. The
//! time baseline is seeded with `0` before the first row, so the first `dt`
//! is the first timestamp itself.
//!
//! ## Output
//!
//! - [`OutputFormat::Csv`]:
//!   `Time (ms),Altitude,Vertical Velocity,Vertical Acceleration,Yaw,Pitch,Roll`
//! - [`OutputFormat::JsonLines`]: one [`ReplayRecord`] object per line
//!
//! ## Malformed rows
//!
//! A row with too few columns or an unparsable number is logged, counted in
//! [`ReplayStats::rows_skipped`] and skipped. With
//! [`ReplayConfig::with_strict`] the first bad row aborts the replay instead.
//!
//! ```rust,no_run
//! use stratofuse_core::replay::{replay_file, OutputFormat, ReplayConfig};
//!
//! let config = ReplayConfig::default().with_format(OutputFormat::JsonLines);
//! let stats = replay_file("tf2.csv", "estimates.jsonl", &config)?;
//! println!("{} rows, {} skipped", stats.rows_written, stats.rows_skipped);
//! # Ok::<(), stratofuse_core::replay::ReplayError>(())
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::errors::ConfigError;
use crate::estimator::{Estimator, EstimatorConfig, FilterEstimates};
use crate::fusion::matrix::Vector3;
use crate::time::Timestamp;

/// Columns read from each row; a [`ColumnLayout`] may not reach past this
pub const MAX_COLUMNS: usize = 64;

/// CSV output header
pub const CSV_HEADER: &str =
    "Time (ms),Altitude,Vertical Velocity,Vertical Acceleration,Yaw,Pitch,Roll";

/// Replay failures
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Reading the log or writing the output failed
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// Estimator parameters were rejected
    #[error("Invalid estimator configuration: {0}")]
    Config(ConfigError),

    /// A field could not be parsed as a number (strict mode)
    #[error("Line {line}: column {column} is not a number")]
    Parse {
        /// One-based line number in the input
        line: usize,
        /// Zero-based column index
        column: usize,
    },

    /// A row ended before a required column (strict mode)
    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    MissingColumns {
        /// One-based line number in the input
        line: usize,
        /// Columns the layout needs
        expected: usize,
        /// Columns present
        found: usize,
    },

    /// The column layout addresses fields past [`MAX_COLUMNS`]
    #[error("Column layout needs {required} columns, at most {max} are supported")]
    LayoutTooWide {
        /// Columns the layout needs
        required: usize,
        /// Widest supported row
        max: usize,
    },

    /// JSON encoding of an output record failed
    #[error("JSON encoding failed: {0}")]
    Json(serde_json::Error),
}

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        ReplayError::Io(err)
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(err: serde_json::Error) -> Self {
        ReplayError::Json(err)
    }
}

impl From<ConfigError> for ReplayError {
    fn from(err: ConfigError) -> Self {
        ReplayError::Config(err)
    }
}

/// Zero-based column positions in the input log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Timestamp (ms)
    pub time: usize,
    /// Barometric altitude (m)
    pub altitude: usize,
    /// Accelerometer x, y, z
    pub accel: [usize; 3],
    /// Magnetometer x, y, z
    pub mag: [usize; 3],
    /// Gyroscope x, y, z
    pub gyro: [usize; 3],
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            time: 1,
            altitude: 7,
            accel: [12, 13, 14],
            mag: [15, 16, 17],
            gyro: [18, 19, 20],
        }
    }
}

impl ColumnLayout {
    /// Number of columns a row needs to cover every field
    pub fn required_columns(&self) -> usize {
        let vectors = self.accel.iter().chain(&self.mag).chain(&self.gyro);
        vectors.fold(self.time.max(self.altitude), |acc, &c| acc.max(c)) + 1
    }
}

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Comma-separated with a header row
    #[default]
    Csv,
    /// One JSON object per line
    JsonLines,
}

/// Replay settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Estimator tuning
    pub estimator: EstimatorConfig,
    /// Input column positions
    pub columns: ColumnLayout,
    /// Header lines to skip
    pub header_lines: usize,
    /// Output encoding
    pub format: OutputFormat,
    /// Abort on the first malformed row
    pub strict: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            columns: ColumnLayout::default(),
            header_lines: 1,
            format: OutputFormat::Csv,
            strict: false,
        }
    }
}

impl ReplayConfig {
    /// Set estimator tuning
    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    /// Set input column positions
    pub fn with_columns(mut self, columns: ColumnLayout) -> Self {
        self.columns = columns;
        self
    }

    /// Set number of header lines to skip
    pub fn with_header_lines(mut self, lines: usize) -> Self {
        self.header_lines = lines;
        self
    }

    /// Set output encoding
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Abort on malformed rows instead of skipping them
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Replay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Data lines seen (header and blank lines excluded)
    pub rows_read: usize,
    /// Estimates written
    pub rows_written: usize,
    /// Malformed rows skipped
    pub rows_skipped: usize,
}

/// One JSON Lines output record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Input timestamp (ms)
    pub time_ms: Timestamp,
    /// Altitude (m)
    pub altitude: f32,
    /// Vertical velocity (m/s)
    pub vertical_velocity: f32,
    /// Vertical acceleration (m/s²)
    pub vertical_accel: f32,
    /// Yaw (rad)
    pub yaw: f32,
    /// Pitch (rad)
    pub pitch: f32,
    /// Roll (rad)
    pub roll: f32,
}

impl ReplayRecord {
    fn new(time_ms: Timestamp, estimates: &FilterEstimates) -> Self {
        Self {
            time_ms,
            altitude: estimates.altitude,
            vertical_velocity: estimates.vertical_velocity,
            vertical_accel: estimates.vertical_accel,
            yaw: estimates.yaw,
            pitch: estimates.pitch,
            roll: estimates.roll,
        }
    }
}

/// One parsed input row
#[derive(Debug, Clone, Copy, PartialEq)]
struct LogSample {
    time: Timestamp,
    altitude: f32,
    accel: Vector3,
    mag: Vector3,
    gyro: Vector3,
}

/// Replay a log from `input`, writing estimates to `output`
pub fn replay<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    config: &ReplayConfig,
) -> Result<ReplayStats, ReplayError> {
    let required = config.columns.required_columns();
    if required > MAX_COLUMNS {
        return Err(ReplayError::LayoutTooWide { required, max: MAX_COLUMNS });
    }

    let mut estimator = Estimator::from_config(config.estimator)?;
    let mut stats = ReplayStats::default();
    let mut seeded = false;

    if config.format == OutputFormat::Csv {
        writeln!(output, "{}", CSV_HEADER)?;
    }

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if idx < config.header_lines || line.trim().is_empty() {
            continue;
        }
        stats.rows_read += 1;

        let sample = match parse_row(&line, idx + 1, &config.columns) {
            Ok(sample) => sample,
            Err(_err) if !config.strict => {
                log_warn!("Skipping row: {}", _err);
                stats.rows_skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        if !seeded {
            estimator.set_init_time(0);
            seeded = true;
        }

        let estimates = estimator.estimate(
            &sample.accel,
            &sample.gyro,
            &sample.mag,
            sample.altitude,
            sample.time,
        );
        write_record(&mut output, config.format, sample.time, &estimates)?;
        stats.rows_written += 1;
    }

    output.flush()?;
    log_debug!(
        "Replay finished: {} read, {} written, {} skipped",
        stats.rows_read,
        stats.rows_written,
        stats.rows_skipped
    );
    Ok(stats)
}

/// Replay the log at `input_path` into a new file at `output_path`
pub fn replay_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    config: &ReplayConfig,
) -> Result<ReplayStats, ReplayError> {
    let input = BufReader::new(File::open(input_path)?);
    let output = BufWriter::new(File::create(output_path)?);
    replay(input, output, config)
}

fn write_record<W: Write>(
    output: &mut W,
    format: OutputFormat,
    time: Timestamp,
    estimates: &FilterEstimates,
) -> Result<(), ReplayError> {
    match format {
        OutputFormat::Csv => writeln!(
            output,
            "{},{},{},{},{},{},{}",
            time,
            estimates.altitude,
            estimates.vertical_velocity,
            estimates.vertical_accel,
            estimates.yaw,
            estimates.pitch,
            estimates.roll
        )?,
        OutputFormat::JsonLines => {
            let json = serde_json::to_string(&ReplayRecord::new(time, estimates))?;
            writeln!(output, "{}", json)?;
        }
    }
    Ok(())
}

fn parse_row(line: &str, line_no: usize, layout: &ColumnLayout) -> Result<LogSample, ReplayError> {
    let fields: heapless::Vec<&str, MAX_COLUMNS> =
        line.split(',').take(MAX_COLUMNS).map(str::trim).collect();

    let expected = layout.required_columns();
    if fields.len() < expected {
        return Err(ReplayError::MissingColumns { line: line_no, expected, found: fields.len() });
    }

    let number = |column: usize| -> Result<f32, ReplayError> {
        fields[column]
            .parse::<f32>()
            .map_err(|_| ReplayError::Parse { line: line_no, column })
    };
    let vector = |columns: &[usize; 3]| -> Result<Vector3, ReplayError> {
        Ok([number(columns[0])?, number(columns[1])?, number(columns[2])?])
    };

    let time = fields[layout.time]
        .parse::<Timestamp>()
        .map_err(|_| ReplayError::Parse { line: line_no, column: layout.time })?;

    Ok(LogSample {
        time,
        altitude: number(layout.altitude)?,
        accel: vector(&layout.accel)?,
        mag: vector(&layout.mag)?,
        gyro: vector(&layout.gyro)?,
    })
}
