//! Common test utilities for integration tests
//!
//! This module provides:
//! - Tolerance assertion for f32 results
//! - Deterministic RNG for noisy sensor streams
//! - Synthetic IMU/baro sample generators for simple trajectories

#![allow(dead_code)]

use stratofuse_core::constants::physics::{DEFAULT_REFERENCE_FIELD, GRAVITY_EARTH_FRAME};
use stratofuse_core::fusion::matrix::Vector3;
use stratofuse_core::{Quaternion, SensorFrame, Timestamp};

macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let diff = ($actual - $expected).abs();
        if diff > $tolerance {
            panic!(
                "Value {} not within tolerance {} of expected {} (diff: {})",
                $actual, $tolerance, $expected, diff
            );
        }
    };
}

/// Deterministic random number generator for tests
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        // Xorshift
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16777216.0
    }

    pub fn gen_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    pub fn jitter(&mut self, v: &Vector3, amplitude: f32) -> Vector3 {
        [
            v[0] + self.gen_range(-amplitude, amplitude),
            v[1] + self.gen_range(-amplitude, amplitude),
            v[2] + self.gen_range(-amplitude, amplitude),
        ]
    }
}

/// Frame a stationary vehicle at `attitude` would produce
pub fn stationary_frame(attitude: &Quaternion, baro_altitude: f32, timestamp: Timestamp) -> SensorFrame {
    SensorFrame {
        accel: attitude.rotate_inverse(&GRAVITY_EARTH_FRAME),
        gyro: [0.0; 3],
        mag: attitude.rotate_inverse(&DEFAULT_REFERENCE_FIELD),
        baro_altitude,
        timestamp,
    }
}

/// `count` frames at `period_ms` spacing starting one period after `start`
pub fn stationary_series(
    attitude: &Quaternion,
    baro_altitude: f32,
    start: Timestamp,
    period_ms: u32,
    count: usize,
) -> Vec<SensorFrame> {
    (1..=count as u32)
        .map(|i| stationary_frame(attitude, baro_altitude, start + i * period_ms))
        .collect()
}

/// Level vehicle climbing at constant acceleration `accel` (m/s²), with
/// barometer readings following the true trajectory
pub fn constant_climb(accel: f32, period_ms: u32, count: usize) -> Vec<SensorFrame> {
    let dt = period_ms as f32 / 1000.0;
    (1..=count)
        .map(|i| {
            let t = i as f32 * dt;
            SensorFrame {
                accel: [0.0, 0.0, GRAVITY_EARTH_FRAME[2] + accel],
                gyro: [0.0; 3],
                mag: DEFAULT_REFERENCE_FIELD,
                baro_altitude: 0.5 * accel * t * t,
                timestamp: i as u32 * period_ms,
            }
        })
        .collect()
}
