//! Flight state estimation for StratoFuse
//!
//! Turns accelerometer, gyroscope, magnetometer and barometer samples into
//! attitude and vertical kinematics, once per sample, on small flight
//! computers.
//!
//! Key constraints:
//! - No heap allocation, all state in fixed-size arrays
//! - Bounded work per call, never blocks
//! - Every call returns an estimate; numeric trouble is absorbed locally
//!
//! ```no_run
//! use stratofuse_core::{Estimator, EstimatorConfig};
//!
//! let config = EstimatorConfig::new(0.05, 0.5, 1.5, 0.1);
//! let mut estimator = Estimator::from_config(config).unwrap();
//! estimator.set_init_time(0);
//!
//! // Each sample tick
//! let out = estimator.estimate(&[0.0, 0.0, 9.81], &[0.0; 3], &[1.0, 0.0, 0.0], 0.0, 20);
//! let _ = (out.yaw, out.altitude, out.vertical_velocity);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod buffer;
pub mod constants;
pub mod errors;
pub mod estimator;
pub mod fusion;
pub mod snapshot;
pub mod time;

#[cfg(feature = "std")]
pub mod replay;

// Public API
pub use errors::{ConfigError, ConfigResult};
pub use estimator::{Estimator, EstimatorConfig, FilterEstimates};
pub use fusion::{
    AttitudeEkf,
    ComplementaryFilter,
    CorrectionStatus,
    EulerAngles,
    FusionError,
    Quaternion,
};
pub use snapshot::{SensorFrame, SensorSnapshot};
pub use time::Timestamp;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
