//! Vertical-Channel Complementary Filter
//!
//! ## Overview
//!
//! Fuses barometric altitude (trusted at low frequency) with the
//! gravity-compensated vertical acceleration (trusted at high frequency) into
//! altitude and vertical velocity, without full Kalman machinery.
//!
//! ## Filter Equations
//!
//! With `e = baro_altitude - prev_altitude` and `a` the vertical acceleration:
//!
//! ```text
//! altitude = prev_altitude + dt·(prev_velocity + (k₀ + k₁·dt/2)·e) + a·dt²/2
//! velocity = prev_velocity + dt·(k₁·e + a)
//!
//! k₀ = sqrt(2·σ_accel/σ_baro)
//! k₁ = σ_accel/σ_baro
//! ```
//!
//! The gains are fixed at construction.
//!
//! ## Zero-Velocity Update
//!
//! Integrated acceleration drifts. When the last [`ZUPT_WINDOW_SIZE`]
//! acceleration magnitudes, including the current one, are all under the
//! configured threshold the vehicle is judged stationary and the velocity
//! output is forced to exactly zero.

use libm::sqrtf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::MagnitudeWindow;
use crate::constants::fusion::ZUPT_WINDOW_SIZE;

/// Output of one vertical-channel step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VerticalEstimate {
    /// Altitude (m)
    pub altitude: f32,
    /// Vertical velocity (m/s), positive up
    pub vertical_velocity: f32,
}

/// Second-order complementary filter with ZUPT gating
#[derive(Debug, Clone)]
pub struct ComplementaryFilter {
    /// `[k₀, k₁]`
    gain: [f32; 2],
    accel_threshold: f32,
    zupt: MagnitudeWindow<ZUPT_WINDOW_SIZE>,
}

impl ComplementaryFilter {
    /// Derive gains from the accelerometer and barometer noise scales
    pub fn new(sigma_accel: f32, sigma_baro: f32, accel_threshold: f32) -> Self {
        let ratio = sigma_accel / sigma_baro;
        Self {
            gain: [sqrtf(2.0 * ratio), ratio],
            accel_threshold,
            zupt: MagnitudeWindow::new(),
        }
    }

    /// Filter gains `[k₀, k₁]`
    pub fn gains(&self) -> [f32; 2] {
        self.gain
    }

    /// ZUPT threshold (same units as the acceleration input)
    pub fn accel_threshold(&self) -> f32 {
        self.accel_threshold
    }

    /// Recent acceleration magnitudes
    pub fn zupt_window(&self) -> &MagnitudeWindow<ZUPT_WINDOW_SIZE> {
        &self.zupt
    }

    /// Advance altitude and vertical velocity by `dt` seconds
    pub fn estimate(
        &mut self,
        baro_altitude: f32,
        prev_altitude: f32,
        prev_velocity: f32,
        vertical_accel: f32,
        dt: f32,
    ) -> VerticalEstimate {
        let [k0, k1] = self.gain;
        let error = baro_altitude - prev_altitude;

        let altitude = prev_altitude
            + dt * (prev_velocity + (k0 + k1 * dt / 2.0) * error)
            + vertical_accel * dt * dt / 2.0;
        let velocity = prev_velocity + dt * (k1 * error + vertical_accel);

        VerticalEstimate {
            altitude,
            vertical_velocity: self.apply_zupt(vertical_accel, velocity),
        }
    }

    /// Record `accel` in the window, then return `0.0` if the whole window is
    /// under threshold and `velocity` otherwise
    pub fn apply_zupt(&mut self, accel: f32, velocity: f32) -> f32 {
        self.zupt.push(accel);
        if self.zupt.all_below(self.accel_threshold) {
            0.0
        } else {
            velocity
        }
    }
}
