//! Constants for StratoFuse Core
//!
//! Centralized numeric constants used by the estimator. Every value is
//! documented with its units and where it comes from.
//!
//! ## Organization
//!
//! - **Physics**: Gravity and reference-field defaults
//! - **Fusion**: Numerical guards, window sizes and default noise scales
//! - **Time**: Unit conversions for the millisecond timestamp base

/// Physical constants used by the measurement models.
pub mod physics;

/// Filter tuning defaults and numerical guards.
pub mod fusion;

/// Time unit conversions.
pub mod time;

pub use physics::{STANDARD_GRAVITY_M_S2, GRAVITY_EARTH_FRAME, DEFAULT_REFERENCE_FIELD};

pub use fusion::{
    JACOBIAN_EPSILON, SINGULARITY_THRESHOLD, QUATERNION_NORM_FLOOR,
    QUATERNION_NORM_TOLERANCE, DEFAULT_INITIAL_COVARIANCE, DEFAULT_MAG_NOISE,
    ZUPT_WINDOW_SIZE, DEFAULT_SIGMA_GYRO, DEFAULT_SIGMA_ACCEL,
    DEFAULT_SIGMA_BARO, DEFAULT_ACCEL_THRESHOLD,
};

pub use time::{MS_PER_SECOND, MS_PER_SECOND_F32};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_exports_match_submodules() {
        assert_eq!(GRAVITY_EARTH_FRAME, physics::GRAVITY_EARTH_FRAME);
        assert_eq!(QUATERNION_NORM_TOLERANCE, fusion::QUATERNION_NORM_TOLERANCE);
        assert_eq!(DEFAULT_INITIAL_COVARIANCE, fusion::DEFAULT_INITIAL_COVARIANCE);
        assert_eq!(DEFAULT_MAG_NOISE, fusion::DEFAULT_MAG_NOISE);
        assert_eq!(MS_PER_SECOND_F32, MS_PER_SECOND as f32);
    }
}
