//! Unit quaternion attitude representation
//!
//! The quaternion `{w, x, y, z}` rotates vectors from the body frame into the
//! earth frame. Earth Z points up. Every constructor and mutator that can
//! change the norm goes through [`Quaternion::normalized`], which falls back to
//! identity when the norm collapses, so a `Quaternion` held by the filter is
//! always unit length to within f32 rounding.
//!
//! ## Euler convention
//!
//! [`Quaternion::to_euler`] returns Tait-Bryan angles in the Z-Y-X (yaw, pitch,
//! roll) sequence. There is no gimbal-lock handling: near pitch = ±90° yaw and
//! roll become ill-defined and may jump. The `asin` argument is clamped to
//! [-1, 1] so rounding cannot produce NaN.

use libm::{asinf, atan2f, cosf, sinf, sqrtf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::fusion::QUATERNION_NORM_FLOOR;
use crate::fusion::matrix::{matvec, Matrix3, Vector3};
use crate::fusion::{FusionError, FusionResult};

/// Yaw / pitch / roll in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EulerAngles {
    /// Rotation about earth Z
    pub yaw: f32,
    /// Rotation about the intermediate Y axis
    pub pitch: f32,
    /// Rotation about body X
    pub roll: f32,
}

/// Attitude quaternion, body → earth
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quaternion {
    /// Scalar part
    pub w: f32,
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Self = Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    /// Build from raw components without normalizing
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Build from `[w, x, y, z]` without normalizing
    pub const fn from_array(q: [f32; 4]) -> Self {
        Self { w: q[0], x: q[1], y: q[2], z: q[3] }
    }

    /// Components as `[w, x, y, z]`
    pub const fn to_array(self) -> [f32; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Rotation of `angle` radians about `axis`
    ///
    /// A zero axis yields identity.
    pub fn from_axis_angle(axis: &Vector3, angle: f32) -> Self {
        let half = 0.5 * angle;
        let s = sinf(half);
        Self::new(cosf(half), axis[0] * s, axis[1] * s, axis[2] * s).normalized()
    }

    /// Euclidean norm of the four components
    pub fn norm(&self) -> f32 {
        sqrtf(self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// Unit-length copy, or identity when the norm is below
    /// [`QUATERNION_NORM_FLOOR`] or not finite
    pub fn normalized(self) -> Self {
        self.try_normalized().unwrap_or(Self::IDENTITY)
    }

    /// Unit-length copy, or [`FusionError::DegenerateQuaternion`]
    pub fn try_normalized(self) -> FusionResult<Self> {
        let norm = self.norm();
        if !norm.is_finite() || norm < QUATERNION_NORM_FLOOR {
            return Err(FusionError::DegenerateQuaternion);
        }
        let inv = 1.0 / norm;
        Ok(Self::new(self.w * inv, self.x * inv, self.y * inv, self.z * inv))
    }

    /// Rotation matrix `R` taking body-frame vectors to the earth frame
    ///
    /// Written in the homogeneous form so it stays meaningful for the slightly
    /// non-unit quaternions produced by finite-difference perturbation.
    pub fn rotation_matrix(&self) -> Matrix3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let (w2, x2, y2, z2) = (w * w, x * x, y * y, z * z);

        [
            [w2 + x2 - y2 - z2, 2.0 * (x * y - w * z), 2.0 * (x * z + w * y)],
            [2.0 * (x * y + w * z), w2 - x2 + y2 - z2, 2.0 * (y * z - w * x)],
            [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), w2 - x2 - y2 + z2],
        ]
    }

    /// Body → earth: `R · v`
    pub fn rotate(&self, v: &Vector3) -> Vector3 {
        let mut out = [0.0; 3];
        matvec(&self.rotation_matrix(), v, &mut out);
        out
    }

    /// Earth → body: `Rᵀ · v`
    pub fn rotate_inverse(&self, v: &Vector3) -> Vector3 {
        let r = self.rotation_matrix();
        [
            r[0][0] * v[0] + r[1][0] * v[1] + r[2][0] * v[2],
            r[0][1] * v[0] + r[1][1] * v[1] + r[2][1] * v[2],
            r[0][2] * v[0] + r[1][2] * v[1] + r[2][2] * v[2],
        ]
    }

    /// Z-Y-X Tait-Bryan angles
    pub fn to_euler(&self) -> EulerAngles {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);

        let roll = atan2f(2.0 * (w * x + y * z), 1.0 - 2.0 * (x * x + y * y));
        let pitch = asinf((2.0 * (w * y - x * z)).clamp(-1.0, 1.0));
        let yaw = atan2f(2.0 * (w * z + x * y), 1.0 - 2.0 * (y * y + z * z));

        EulerAngles { yaw, pitch, roll }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    fn assert_vec_close(a: &Vector3, b: &Vector3, tol: f32) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < tol, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn identity_is_default() {
        assert_eq!(Quaternion::default(), Quaternion::IDENTITY);
        assert_eq!(Quaternion::IDENTITY.norm(), 1.0);
        assert_eq!(Quaternion::IDENTITY.to_euler(), EulerAngles::default());
    }

    #[test]
    fn degenerate_norm_falls_back_to_identity() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(zero.normalized(), Quaternion::IDENTITY);
        assert_eq!(zero.try_normalized(), Err(FusionError::DegenerateQuaternion));

        let nan = Quaternion::new(f32::NAN, 0.0, 0.0, 0.0);
        assert_eq!(nan.normalized(), Quaternion::IDENTITY);
    }

    #[test]
    fn normalizes_to_unit_length() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 2.0).normalized();
        assert!((q.norm() - 1.0).abs() < 1e-6);
        assert!((q.w - q.z).abs() < 1e-7);
    }

    #[test]
    fn yaw_rotation_moves_x_to_y() {
        let q = Quaternion::from_axis_angle(&[0.0, 0.0, 1.0], FRAC_PI_2);
        assert_vec_close(&q.rotate(&[1.0, 0.0, 0.0]), &[0.0, 1.0, 0.0], 1e-6);
        assert_vec_close(&q.rotate_inverse(&[0.0, 1.0, 0.0]), &[1.0, 0.0, 0.0], 1e-6);

        let euler = q.to_euler();
        assert!((euler.yaw - FRAC_PI_2).abs() < 1e-5);
        assert!(euler.pitch.abs() < 1e-6);
        assert!(euler.roll.abs() < 1e-6);
    }

    #[test]
    fn euler_angles_separate_axes() {
        let roll = Quaternion::from_axis_angle(&[1.0, 0.0, 0.0], 0.3).to_euler();
        assert!((roll.roll - 0.3).abs() < 1e-5);
        assert!(roll.yaw.abs() < 1e-6);

        let pitch = Quaternion::from_axis_angle(&[0.0, 1.0, 0.0], -0.4).to_euler();
        assert!((pitch.pitch + 0.4).abs() < 1e-5);
        assert!(pitch.roll.abs() < 1e-6);
    }

    #[test]
    fn inverse_rotation_undoes_rotation() {
        let q = Quaternion::new(0.9, 0.1, -0.3, 0.2).normalized();
        let v = [0.5, -2.0, 9.81];
        assert_vec_close(&q.rotate_inverse(&q.rotate(&v)), &v, 1e-5);
    }

    #[test]
    fn pitch_saturates_instead_of_nan() {
        // Slightly over-unit quaternion pushes the asin argument past 1
        let q = Quaternion::new(0.7072, 0.0, 0.7072, 0.0);
        let euler = q.to_euler();
        assert!(euler.pitch.is_finite());
        assert!((euler.pitch - FRAC_PI_2).abs() < 1e-3);
    }
}
