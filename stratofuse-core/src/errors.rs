//! Error Types for Estimator Configuration
//!
//! ## Design Philosophy
//!
//! The per-sample estimation path never fails: numeric trouble inside the
//! filters is handled locally (a correction is skipped, a degenerate
//! quaternion is reset) so every call produces a result. Errors therefore
//! only exist at the edges of the crate:
//!
//! 1. **Construction**: noise scales and thresholds are checked once, when the
//!    caller builds an [`Estimator`](crate::Estimator) from a config.
//! 2. **Kernel internals**: [`FusionError`](crate::fusion::FusionError) reports
//!    a singular matrix to the EKF, which absorbs it.
//! 3. **Replay** (std only): file and parse failures while replaying logs.
//!
//! Like the rest of the crate, errors are small `Copy` values carrying only
//! inline data and `&'static str` so they can be returned on embedded targets
//! without allocation.
//!
//! ## Example
//!
//! ```rust
//! use stratofuse_core::{ConfigError, Estimator, EstimatorConfig};
//!
//! let config = EstimatorConfig::default().with_sigma_baro(0.0);
//! match Estimator::from_config(config) {
//!     Err(ConfigError::NonPositive { parameter, .. }) => assert_eq!(parameter, "sigma_baro"),
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors detected before the estimator is built
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Parameter is NaN or infinite
    #[error("Parameter {parameter} is not a finite number")]
    NotFinite {
        /// Name of the offending parameter
        parameter: &'static str,
    },

    /// Parameter must be strictly positive
    #[error("Parameter {parameter} must be > 0, got {value}")]
    NonPositive {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Value that was supplied
        value: f32,
    },

    /// Parameter must not be negative
    #[error("Parameter {parameter} must be >= 0, got {value}")]
    Negative {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Value that was supplied
        value: f32,
    },

    /// Reference magnetic field has zero length and cannot constrain heading
    #[error("Reference field must be non-zero")]
    ZeroReferenceField,
}

impl ConfigError {
    /// Check that a noise scale is finite and strictly positive
    pub fn check_positive(parameter: &'static str, value: f32) -> ConfigResult<()> {
        if !value.is_finite() {
            return Err(ConfigError::NotFinite { parameter });
        }
        if value <= 0.0 {
            return Err(ConfigError::NonPositive { parameter, value });
        }
        Ok(())
    }

    /// Check that a threshold is finite and not negative
    pub fn check_non_negative(parameter: &'static str, value: f32) -> ConfigResult<()> {
        if !value.is_finite() {
            return Err(ConfigError::NotFinite { parameter });
        }
        if value < 0.0 {
            return Err(ConfigError::Negative { parameter, value });
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotFinite { parameter } =>
                defmt::write!(fmt, "{} not finite", parameter),
            Self::NonPositive { parameter, value } =>
                defmt::write!(fmt, "{} must be > 0, got {}", parameter, value),
            Self::Negative { parameter, value } =>
                defmt::write!(fmt, "{} must be >= 0, got {}", parameter, value),
            Self::ZeroReferenceField =>
                defmt::write!(fmt, "Zero reference field"),
        }
    }
}
