//! Fusion Algorithm Constants
//!
//! Numerical guards for the attitude EKF and kernel, plus the default
//! noise scales used when the caller does not supply calibrated ones.

// ===== NUMERICAL GUARDS =====

/// Finite-difference step used to linearize the measurement models.
///
/// Each quaternion component is perturbed by this amount and the rotated
/// reference vector re-evaluated. Small enough to stay in the linear region,
/// large enough to survive f32 cancellation around unit-norm quaternions.
///
/// Source: flight software tuning
pub const JACOBIAN_EPSILON: f32 = 1e-5;

/// Determinant magnitude below which a 3x3 matrix is treated as singular.
///
/// `invert3x3` refuses to produce an inverse below this threshold, which makes
/// the EKF skip the correction and keep its predicted state.
pub const SINGULARITY_THRESHOLD: f32 = 1e-12;

/// Quaternion norm below which renormalization falls back to identity.
pub const QUATERNION_NORM_FLOOR: f32 = 1e-12;

/// Tolerance on the quaternion norm after any filter mutation.
pub const QUATERNION_NORM_TOLERANCE: f32 = 1e-5;

// ===== EKF DEFAULTS =====

/// Initial covariance diagonal for the quaternion state.
///
/// Moderate uncertainty so the first corrections can pull the attitude
/// without the gain collapsing to zero.
pub const DEFAULT_INITIAL_COVARIANCE: f32 = 0.1;

/// Default magnetometer noise standard deviation (device units).
pub const DEFAULT_MAG_NOISE: f32 = 0.5;

// ===== COMPLEMENTARY FILTER =====

/// Number of samples in the zero-velocity-update window.
///
/// At a 50 Hz estimation rate this covers ~0.64 s of stillness before the
/// vertical velocity is clamped to zero.
pub const ZUPT_WINDOW_SIZE: usize = 32;

// ===== SAMPLE CONFIGURATION =====
//
// The source configuration uses the same value for all three noise scales even
// though they describe different physical channels. They are placeholders
// until the sensors are characterized, not calibrated values.

/// Gyroscope noise scale (rad/s). Uncalibrated placeholder.
pub const DEFAULT_SIGMA_GYRO: f32 = 8.0;

/// Accelerometer noise scale (m/s²). Uncalibrated placeholder.
pub const DEFAULT_SIGMA_ACCEL: f32 = 8.0;

/// Barometric altitude noise scale (m). Uncalibrated placeholder.
pub const DEFAULT_SIGMA_BARO: f32 = 8.0;

/// Zero-velocity-update acceleration threshold (m/s²).
pub const DEFAULT_ACCEL_THRESHOLD: f32 = 0.1;
