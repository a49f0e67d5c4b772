//! Time-Related Constants
//!
//! Timestamps handed to the estimator are unsigned milliseconds from a
//! monotonic tick counter; filter math runs in seconds.

/// Milliseconds per second.
pub const MS_PER_SECOND: u32 = 1000;

/// Milliseconds per second as a float, for `dt` conversion.
pub const MS_PER_SECOND_F32: f32 = MS_PER_SECOND as f32;
