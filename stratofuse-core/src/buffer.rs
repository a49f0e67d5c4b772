//! Fixed-Size Ring Buffer for the Zero-Velocity Window
//!
//! ## Overview
//!
//! The vertical channel decides whether the vehicle is stationary by looking
//! at the last `N` vertical-acceleration magnitudes. This module provides the
//! ring buffer that holds them. Size is a compile-time constant, storage is an
//! inline array, and every operation is O(1) except the O(N) scan.
//!
//! ## Zero-initialized window
//!
//! Unlike a history buffer that grows from empty, the window starts *full of
//! zeros*. A freshly powered vehicle sitting on the pad is therefore judged
//! stationary from the very first sample whose magnitude is under threshold,
//! instead of waiting `N` samples for the window to fill.
//!
//! ```text
//! MagnitudeWindow<4> after pushing 0.5, 0.2:
//! ┌─────┬─────┬─────┬─────┐
//! │ 0.5 │ 0.2 │ 0.0 │ 0.0 │
//! └─────┴─────┴─────┴─────┘
//!                ↑
//!                └── write_pos = 2 (oldest slot, next to be overwritten)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use stratofuse_core::buffer::MagnitudeWindow;
//!
//! let mut window: MagnitudeWindow<4> = MagnitudeWindow::new();
//! window.push(-0.05);
//! assert!(window.all_below(0.1));
//!
//! window.push(0.3);
//! assert!(!window.all_below(0.1));
//! ```
//!
//! ## Thread Safety
//!
//! Not synchronized. The window is owned by one complementary filter, which is
//! owned by one estimator driven from a single task.

use libm::fabsf;

/// Ring buffer of absolute values with wrap-around overwrite
#[derive(Debug, Clone)]
pub struct MagnitudeWindow<const N: usize> {
    /// Stored magnitudes, all `>= 0`
    data: [f32; N],
    /// Index where the next write will occur, always `< N`
    write_pos: usize,
}

impl<const N: usize> MagnitudeWindow<N> {
    /// Creates a window filled with zeros
    pub const fn new() -> Self {
        Self {
            data: [0.0; N],
            write_pos: 0,
        }
    }

    /// Records `|value|`, overwriting the oldest slot
    pub fn push(&mut self, value: f32) {
        if N == 0 {
            return;
        }
        self.data[self.write_pos] = fabsf(value);
        self.write_pos = (self.write_pos + 1) % N;
    }

    /// Window capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Index of the slot the next `push` overwrites
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Most recently pushed magnitude
    pub fn last(&self) -> Option<f32> {
        if N == 0 {
            return None;
        }
        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        Some(self.data[idx])
    }

    /// `true` when every stored magnitude is strictly below `threshold`
    pub fn all_below(&self, threshold: f32) -> bool {
        self.data.iter().all(|&m| m < threshold)
    }

    /// Iterate oldest → newest
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let (newer, older) = self.data.split_at(self.write_pos);
        older.iter().chain(newer.iter()).copied()
    }
}

impl<const N: usize> Default for MagnitudeWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_full_of_zeros() {
        let window: MagnitudeWindow<5> = MagnitudeWindow::new();
        assert_eq!(window.capacity(), 5);
        assert_eq!(window.iter().count(), 5);
        assert!(window.iter().all(|m| m == 0.0));
        assert_eq!(window.last(), Some(0.0));
        assert!(window.all_below(0.1));
    }

    #[test]
    fn stores_magnitudes() {
        let mut window = MagnitudeWindow::<3>::new();
        window.push(-2.5);
        assert_eq!(window.last(), Some(2.5));
    }

    #[test]
    fn circular_overwrite() {
        let mut window = MagnitudeWindow::<3>::new();
        for i in 0..5 {
            window.push(i as f32);
        }

        // 0 and 1 were overwritten
        let values: Vec<f32> = window.iter().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(window.write_pos(), 2);
    }

    #[test]
    fn threshold_is_strict() {
        let mut window = MagnitudeWindow::<2>::new();
        window.push(0.1);
        assert!(!window.all_below(0.1));
        window.push(0.05);
        window.push(0.05);
        assert!(window.all_below(0.1));
    }
}
