//! Physical Constants for StratoFuse
//!
//! Values that describe the world the vehicle flies in rather than the
//! filter that estimates its state.

/// Standard gravity (m/s²).
///
/// Magnitude of the gravity vector the accelerometer model expects at rest,
/// and the amount subtracted from the earth-frame Z axis to recover the
/// non-gravitational vertical acceleration. Earth Z points up, so a vehicle
/// at rest reads `+9.81` on that axis.
///
/// Source: flight software convention (rounded CGPM 9.80665)
pub const STANDARD_GRAVITY_M_S2: f32 = 9.81;

/// Earth-frame gravity vector expressed as a specific-force reading (m/s²).
pub const GRAVITY_EARTH_FRAME: [f32; 3] = [0.0, 0.0, STANDARD_GRAVITY_M_S2];

/// Default reference magnetic field in the earth frame (device units).
///
/// Site and device specific. The default points the field along earth X with
/// unit magnitude, which is what a magnetometer reads after the board has been
/// faced toward the reference heading. Real deployments must measure this on
/// site.
///
/// Source: bench calibration, not a physical constant
pub const DEFAULT_REFERENCE_FIELD: [f32; 3] = [1.0, 0.0, 0.0];
