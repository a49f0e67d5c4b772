//! Per-Sample Flight State Estimator
//!
//! ## Overview
//!
//! [`Estimator`] owns one [`AttitudeEkf`] and one [`ComplementaryFilter`] plus
//! the bookkeeping carried between calls. Each call to
//! [`Estimator::estimate`] runs:
//!
//! ```text
//! 1. dt = (timestamp - previous_timestamp) / 1000
//! 2. ekf.predict(gyro, dt)
//! 3. ekf.update_accel(accel); ekf.update_mag(mag)
//! 4. vertical_accel = ekf.vertical_accel(accel); attitude = ekf.attitude()
//! 5. complementary.estimate(baro, prev_alt, prev_vel, prev_vertical_accel, dt)
//! 6. store altitude, velocity, vertical_accel and timestamp for next cycle
//! ```
//!
//! Step 5 feeds the vertical acceleration computed on the *previous* cycle
//! into the vertical channel, while the freshly computed value is reported in
//! the output. This one-cycle lag is deliberate and pinned by tests.
//!
//! ## Usage Example
//!
//! ```rust
//! use stratofuse_core::Estimator;
//!
//! let mut estimator = Estimator::new(8.0, 8.0, 8.0, 0.1);
//! estimator.set_init_time(0);
//!
//! let out = estimator.estimate(&[0.0, 0.0, 9.81], &[0.0; 3], &[1.0, 0.0, 0.0], 0.0, 20);
//! assert!(out.yaw.abs() < 1e-3);
//! assert!(out.altitude.abs() < 1e-3);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::fusion::{
    DEFAULT_ACCEL_THRESHOLD, DEFAULT_INITIAL_COVARIANCE, DEFAULT_MAG_NOISE,
    DEFAULT_SIGMA_ACCEL, DEFAULT_SIGMA_BARO, DEFAULT_SIGMA_GYRO,
};
use crate::constants::physics::DEFAULT_REFERENCE_FIELD;
use crate::errors::{ConfigError, ConfigResult};
use crate::fusion::matrix::{length, Vector3};
use crate::fusion::{AttitudeEkf, ComplementaryFilter, EkfConfig, EulerAngles, Quaternion};
use crate::snapshot::SensorFrame;
use crate::time::{elapsed_seconds, Timestamp};

/// Result of one estimation cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterEstimates {
    /// Heading (rad)
    pub yaw: f32,
    /// Pitch (rad)
    pub pitch: f32,
    /// Roll (rad)
    pub roll: f32,
    /// Fused altitude (m)
    pub altitude: f32,
    /// Fused vertical velocity (m/s)
    pub vertical_velocity: f32,
    /// Non-gravitational vertical acceleration this cycle (m/s²)
    pub vertical_accel: f32,
}

impl FilterEstimates {
    /// Attitude part as Euler angles
    pub fn attitude(&self) -> EulerAngles {
        EulerAngles { yaw: self.yaw, pitch: self.pitch, roll: self.roll }
    }
}

/// Estimator tuning
///
/// The defaults copy a sample configuration that sets all three noise
/// scales to the same value even though they describe different physical
/// channels. Treat them as placeholders and calibrate per vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimatorConfig {
    /// Gyroscope noise scale (rad/s)
    pub sigma_gyro: f32,
    /// Accelerometer noise scale
    pub sigma_accel: f32,
    /// Barometer noise scale (m)
    pub sigma_baro: f32,
    /// ZUPT gate, same units as the accelerometer
    pub accel_threshold: f32,
    /// Magnetometer noise standard deviation
    pub mag_noise: f32,
    /// Initial attitude covariance diagonal
    pub initial_covariance: f32,
    /// Earth-frame reference magnetic field
    pub reference_field: Vector3,
    /// Starting attitude
    pub initial_attitude: Quaternion,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sigma_gyro: DEFAULT_SIGMA_GYRO,
            sigma_accel: DEFAULT_SIGMA_ACCEL,
            sigma_baro: DEFAULT_SIGMA_BARO,
            accel_threshold: DEFAULT_ACCEL_THRESHOLD,
            mag_noise: DEFAULT_MAG_NOISE,
            initial_covariance: DEFAULT_INITIAL_COVARIANCE,
            reference_field: DEFAULT_REFERENCE_FIELD,
            initial_attitude: Quaternion::IDENTITY,
        }
    }
}

impl EstimatorConfig {
    /// Config with the four primary parameters and default EKF tuning
    pub fn new(sigma_gyro: f32, sigma_accel: f32, sigma_baro: f32, accel_threshold: f32) -> Self {
        Self {
            sigma_gyro,
            sigma_accel,
            sigma_baro,
            accel_threshold,
            ..Self::default()
        }
    }

    /// Set gyroscope noise scale
    pub fn with_sigma_gyro(mut self, sigma: f32) -> Self {
        self.sigma_gyro = sigma;
        self
    }

    /// Set accelerometer noise scale
    pub fn with_sigma_accel(mut self, sigma: f32) -> Self {
        self.sigma_accel = sigma;
        self
    }

    /// Set barometer noise scale
    pub fn with_sigma_baro(mut self, sigma: f32) -> Self {
        self.sigma_baro = sigma;
        self
    }

    /// Set ZUPT threshold
    pub fn with_accel_threshold(mut self, threshold: f32) -> Self {
        self.accel_threshold = threshold;
        self
    }

    /// Set magnetometer noise standard deviation
    pub fn with_mag_noise(mut self, sigma: f32) -> Self {
        self.mag_noise = sigma;
        self
    }

    /// Set initial attitude covariance diagonal
    pub fn with_initial_covariance(mut self, variance: f32) -> Self {
        self.initial_covariance = variance;
        self
    }

    /// Set reference magnetic field
    pub fn with_reference_field(mut self, field: Vector3) -> Self {
        self.reference_field = field;
        self
    }

    /// Set starting attitude
    pub fn with_initial_attitude(mut self, attitude: Quaternion) -> Self {
        self.initial_attitude = attitude;
        self
    }

    /// Check every parameter
    ///
    /// Noise scales and the initial covariance must be finite and positive,
    /// the threshold finite and non-negative, and the reference field finite
    /// and non-zero.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_positive("sigma_gyro", self.sigma_gyro)?;
        ConfigError::check_positive("sigma_accel", self.sigma_accel)?;
        ConfigError::check_positive("sigma_baro", self.sigma_baro)?;
        ConfigError::check_non_negative("accel_threshold", self.accel_threshold)?;
        ConfigError::check_positive("mag_noise", self.mag_noise)?;
        ConfigError::check_positive("initial_covariance", self.initial_covariance)?;

        if self.reference_field.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NotFinite { parameter: "reference_field" });
        }
        if length(&self.reference_field) == 0.0 {
            return Err(ConfigError::ZeroReferenceField);
        }
        Ok(())
    }

    /// Attitude filter part of the configuration
    pub fn ekf_config(&self) -> EkfConfig {
        EkfConfig::default()
            .with_gyro_noise(self.sigma_gyro)
            .with_accel_noise(self.sigma_accel)
            .with_mag_noise(self.mag_noise)
            .with_initial_covariance(self.initial_covariance)
            .with_reference_field(self.reference_field)
            .with_initial_attitude(self.initial_attitude)
    }
}

/// Attitude + vertical-channel estimator
///
/// Not internally synchronized: feed it from a single task.
#[derive(Debug, Clone)]
pub struct Estimator {
    ekf: AttitudeEkf,
    complementary: ComplementaryFilter,
    previous_timestamp: Timestamp,
    time_seeded: bool,
    prev_altitude: f32,
    prev_velocity: f32,
    prev_vertical_accel: f32,
}

impl Estimator {
    /// Build from the four primary parameters
    ///
    /// No validation happens here. Use [`Estimator::from_config`] to have the
    /// parameters checked.
    pub fn new(sigma_gyro: f32, sigma_accel: f32, sigma_baro: f32, accel_threshold: f32) -> Self {
        Self::build(&EstimatorConfig::new(sigma_gyro, sigma_accel, sigma_baro, accel_threshold))
    }

    /// Validate `config` and build
    pub fn from_config(config: EstimatorConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(&config))
    }

    fn build(config: &EstimatorConfig) -> Self {
        Self {
            ekf: AttitudeEkf::with_config(config.ekf_config()),
            complementary: ComplementaryFilter::new(
                config.sigma_accel,
                config.sigma_baro,
                config.accel_threshold,
            ),
            previous_timestamp: 0,
            time_seeded: false,
            prev_altitude: 0.0,
            prev_velocity: 0.0,
            prev_vertical_accel: 0.0,
        }
    }

    /// Seed the timestamp baseline; call once before the first sample
    pub fn set_init_time(&mut self, timestamp: Timestamp) {
        self.previous_timestamp = timestamp;
        self.time_seeded = true;
    }

    /// Run one estimation cycle
    pub fn estimate(
        &mut self,
        accel: &Vector3,
        gyro: &Vector3,
        mag: &Vector3,
        baro_altitude: f32,
        timestamp: Timestamp,
    ) -> FilterEstimates {
        if !self.time_seeded {
            log_warn!(
                "estimate called before set_init_time, dt measured from {} ms",
                self.previous_timestamp
            );
            self.time_seeded = true;
        }

        let dt = elapsed_seconds(timestamp, self.previous_timestamp);

        self.ekf.predict(gyro, dt);
        self.ekf.update_accel(accel);
        self.ekf.update_mag(mag);

        let vertical_accel = self.ekf.vertical_accel(accel);
        let attitude = self.ekf.attitude();

        let vertical = self.complementary.estimate(
            baro_altitude,
            self.prev_altitude,
            self.prev_velocity,
            self.prev_vertical_accel,
            dt,
        );

        self.prev_altitude = vertical.altitude;
        self.prev_velocity = vertical.vertical_velocity;
        self.prev_vertical_accel = vertical_accel;
        self.previous_timestamp = timestamp;

        log_trace!(
            "t={} dt={} alt={} vel={} az={}",
            timestamp,
            dt,
            vertical.altitude,
            vertical.vertical_velocity,
            vertical_accel
        );

        FilterEstimates {
            yaw: attitude.yaw,
            pitch: attitude.pitch,
            roll: attitude.roll,
            altitude: vertical.altitude,
            vertical_velocity: vertical.vertical_velocity,
            vertical_accel,
        }
    }

    /// Run one cycle from a sensor snapshot frame
    pub fn estimate_frame(&mut self, frame: &SensorFrame) -> FilterEstimates {
        self.estimate(
            &frame.accel,
            &frame.gyro,
            &frame.mag,
            frame.baro_altitude,
            frame.timestamp,
        )
    }

    /// Attitude filter
    pub fn ekf(&self) -> &AttitudeEkf {
        &self.ekf
    }

    /// Vertical-channel filter
    pub fn complementary(&self) -> &ComplementaryFilter {
        &self.complementary
    }

    /// Timestamp of the last processed sample (or the seeded baseline)
    pub fn previous_timestamp(&self) -> Timestamp {
        self.previous_timestamp
    }
}
