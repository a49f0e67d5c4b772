//! Time base for the estimator
//!
//! Samples are stamped by a monotonic millisecond tick counter (the flight
//! computer's boot timer). The counter is 32 bits wide and wraps after ~49
//! days; differences are taken with wrapping arithmetic so a wrap between two
//! samples still yields the right interval.

use crate::constants::time::MS_PER_SECOND_F32;

/// Timestamp in milliseconds since device boot
pub type Timestamp = u32;

/// Interval between two timestamps in seconds
///
/// `now` is expected to be at or after `previous`. Non-monotonic stamps are a
/// driver-layer fault and produce a huge interval rather than a panic.
#[inline]
pub fn elapsed_seconds(now: Timestamp, previous: Timestamp) -> f32 {
    now.wrapping_sub(previous) as f32 / MS_PER_SECOND_F32
}
