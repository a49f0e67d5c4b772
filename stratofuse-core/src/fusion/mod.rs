//! Sensor Fusion for Attitude and Vertical Kinematics
//!
//! ## Overview
//!
//! Two filters share the work of turning raw IMU and barometer samples into a
//! flight state:
//!
//! ```text
//! gyro ──────────┐
//! accel ─────────┼─→ AttitudeEkf ──→ quaternion ──→ yaw / pitch / roll
//! mag ───────────┘        │
//!                         └─→ vertical accel ─┐
//! baro altitude ──────────────────────────────┴─→ ComplementaryFilter ─→ altitude
//!                                                                      └→ vertical velocity
//! ```
//!
//! ### Attitude EKF
//!
//! Quaternion state with a 4x4 covariance. Gyroscope rates drive the
//! prediction; accelerometer (gravity) and magnetometer (reference field)
//! readings correct it through finite-difference Jacobians. See
//! [`attitude`].
//!
//! ### Complementary Filter
//!
//! Lightweight second-order fusion of barometric altitude with the
//! gravity-compensated vertical acceleration, plus a zero-velocity update
//! that clamps velocity while the vehicle sits still. See [`complementary`].
//!
//! ## Memory Model
//!
//! Everything is fixed size and lives inline in the owning struct:
//! ```text
//! AttitudeEkf:
//! ├── Quaternion:            4 × 4 bytes
//! ├── P, Q:                  2 × 16 × 4 bytes
//! ├── H_a, H_m:              2 × 12 × 4 bytes
//! ├── R_a, R_m:              2 × 9 × 4 bytes
//! └── B_E, gyro noise:       4 × 4 bytes
//! ComplementaryFilter:
//! └── ZUPT window:           32 × 4 bytes (+ gains, threshold, index)
//! ```
//!
//! ## Numerical Safeguards
//!
//! - **Quaternion renormalization** after every mutation, identity on collapse
//! - **Singularity guard** on the innovation covariance inverse
//! - **Symmetric enforcement** of the covariance after each correction

pub mod attitude;
pub mod complementary;
pub mod matrix;
pub mod quaternion;

// Re-export main types
pub use attitude::{AttitudeEkf, CorrectionStatus, EkfConfig, EkfState};
pub use complementary::{ComplementaryFilter, VerticalEstimate};
pub use quaternion::{EulerAngles, Quaternion};

use thiserror_no_std::Error;

/// Result type for fusion internals
pub type FusionResult<T> = Result<T, FusionError>;

/// Numeric failures inside the filters
///
/// These never reach the per-sample API. The EKF turns them into a skipped
/// correction or an identity reset.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FusionError {
    /// Matrix inversion refused: determinant too close to zero
    #[error("Singular matrix (determinant {determinant})")]
    SingularMatrix {
        /// Determinant that failed the threshold
        determinant: f32,
    },
    /// Quaternion norm collapsed below the renormalization floor
    #[error("Degenerate quaternion")]
    DegenerateQuaternion,
}

#[cfg(feature = "defmt")]
impl defmt::Format for FusionError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::SingularMatrix { determinant } =>
                defmt::write!(fmt, "Singular matrix (det {})", determinant),
            Self::DegenerateQuaternion =>
                defmt::write!(fmt, "Degenerate quaternion"),
        }
    }
}
