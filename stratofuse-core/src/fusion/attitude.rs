//! Quaternion Extended Kalman Filter for Attitude
//!
//! ## Overview
//!
//! The state is the body → earth attitude quaternion `x = [w, x, y, z]` with a
//! 4x4 covariance `P`. Each cycle runs one gyroscope-driven prediction
//! followed by two independent vector-observation corrections: the
//! accelerometer against gravity, then the magnetometer against the reference
//! field `B_E`.
//!
//! ### 1. Prediction
//! ```text
//! Ω(g) = ⎡ 0   -gx  -gy  -gz ⎤
//!        ⎢ gx   0    gz  -gy ⎥
//!        ⎢ gy  -gz   0    gx ⎥
//!        ⎣ gz   gy  -gx   0  ⎦
//!
//! F  = I₄ + ½·dt·Ω(g)
//! x' = normalize(F·x)                 forward Euler
//! Q  = (σ_gyro·dt)²·I₄
//! P' = F·P·Fᵀ + Q
//! ```
//! `F` ignores the renormalization step. That is a first-order approximation
//! of the true Jacobian and is kept on purpose.
//!
//! ### 2. Vector correction (accel, then mag)
//! ```text
//! h(x) = R(x)ᵀ·v_earth               expected body-frame reading
//! H    = ∂h/∂x                        forward difference, ε = 1e-5
//! y    = z - h(x)
//! S    = H·P·Hᵀ + R
//! K    = P·Hᵀ·S⁻¹
//! x    = normalize(x + K·y)
//! P    = (I - K·H)·P
//! ```
//! If `S` cannot be inverted the correction is abandoned and the predicted
//! quaternion and covariance are kept unchanged. No error escapes: the caller
//! gets a [`CorrectionStatus`] it is free to ignore.
//!
//! ## Known limitations
//!
//! - `P` is re-symmetrized after each correction but positive
//!   semi-definiteness is not otherwise enforced.
//! - No gyroscope bias state and no magnetic declination correction.
//! - Euler output has no gimbal-lock protection (see [`Quaternion::to_euler`]).
//!
//! ## Usage Example
//!
//! ```rust
//! use stratofuse_core::fusion::{AttitudeEkf, CorrectionStatus};
//!
//! let mut ekf = AttitudeEkf::new(0.05);
//! ekf.predict(&[0.0, 0.0, 0.1], 0.02);
//! assert_eq!(ekf.update_accel(&[0.0, 0.0, 9.81]), CorrectionStatus::Applied);
//! ekf.update_mag(&[1.0, 0.0, 0.0]);
//!
//! let attitude = ekf.attitude();
//! assert!(attitude.yaw > 0.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::fusion::{
    DEFAULT_INITIAL_COVARIANCE, DEFAULT_MAG_NOISE, DEFAULT_SIGMA_ACCEL, DEFAULT_SIGMA_GYRO,
    JACOBIAN_EPSILON,
};
use crate::constants::physics::{
    DEFAULT_REFERENCE_FIELD, GRAVITY_EARTH_FRAME, STANDARD_GRAVITY_M_S2,
};
use crate::fusion::matrix::{
    identity, make_symmetric, matvec, multiply, subtract_vectors, transpose, invert3x3,
    Matrix, Matrix3, Matrix4, Vector, Vector3,
};
use crate::fusion::quaternion::{EulerAngles, Quaternion};
use crate::fusion::FusionResult;

/// Observation Jacobian, 3 measurements x 4 quaternion components
pub type ObservationJacobian = Matrix<3, 4>;

/// Attitude filter configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EkfConfig {
    /// Gyroscope noise scale (rad/s), drives `Q`
    pub gyro_noise: f32,
    /// Accelerometer noise standard deviation, `R_a = σ²·I₃`
    pub accel_noise: f32,
    /// Magnetometer noise standard deviation, `R_m = σ²·I₃`
    pub mag_noise: f32,
    /// Initial covariance diagonal, `P₀ = p·I₄`
    pub initial_covariance: f32,
    /// Reference magnetic field in the earth frame (`B_E`)
    pub reference_field: Vector3,
    /// Starting attitude
    pub initial_attitude: Quaternion,
}

impl Default for EkfConfig {
    fn default() -> Self {
        Self {
            gyro_noise: DEFAULT_SIGMA_GYRO,
            accel_noise: DEFAULT_SIGMA_ACCEL,
            mag_noise: DEFAULT_MAG_NOISE,
            initial_covariance: DEFAULT_INITIAL_COVARIANCE,
            reference_field: DEFAULT_REFERENCE_FIELD,
            initial_attitude: Quaternion::IDENTITY,
        }
    }
}

impl EkfConfig {
    /// Set gyroscope noise scale
    pub fn with_gyro_noise(mut self, sigma: f32) -> Self {
        self.gyro_noise = sigma;
        self
    }

    /// Set accelerometer noise standard deviation
    pub fn with_accel_noise(mut self, sigma: f32) -> Self {
        self.accel_noise = sigma;
        self
    }

    /// Set magnetometer noise standard deviation
    pub fn with_mag_noise(mut self, sigma: f32) -> Self {
        self.mag_noise = sigma;
        self
    }

    /// Set initial covariance diagonal
    pub fn with_initial_covariance(mut self, variance: f32) -> Self {
        self.initial_covariance = variance;
        self
    }

    /// Set reference magnetic field (`B_E`)
    pub fn with_reference_field(mut self, field: Vector3) -> Self {
        self.reference_field = field;
        self
    }

    /// Set starting attitude (normalized on use)
    pub fn with_initial_attitude(mut self, attitude: Quaternion) -> Self {
        self.initial_attitude = attitude;
        self
    }
}

/// Filter matrices carried between calls
#[derive(Debug, Clone, PartialEq)]
pub struct EkfState {
    /// Quaternion covariance `P`
    pub covariance: Matrix4,
    /// Process noise `Q`, rebuilt every prediction
    pub process_noise: Matrix4,
    /// Accelerometer Jacobian `H_a` from the last accel correction
    pub accel_jacobian: ObservationJacobian,
    /// Accelerometer noise `R_a`
    pub accel_noise: Matrix3,
    /// Magnetometer Jacobian `H_m` from the last mag correction
    pub mag_jacobian: ObservationJacobian,
    /// Magnetometer noise `R_m`
    pub mag_noise: Matrix3,
    /// Reference magnetic field `B_E`
    pub reference_field: Vector3,
}

impl EkfState {
    fn from_config(config: &EkfConfig) -> Self {
        Self {
            covariance: scaled_identity(config.initial_covariance),
            process_noise: [[0.0; 4]; 4],
            accel_jacobian: [[0.0; 4]; 3],
            accel_noise: scaled_identity(config.accel_noise * config.accel_noise),
            mag_jacobian: [[0.0; 4]; 3],
            mag_noise: scaled_identity(config.mag_noise * config.mag_noise),
            reference_field: config.reference_field,
        }
    }
}

/// Outcome of a measurement correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionStatus {
    /// State and covariance were corrected
    Applied,
    /// Innovation covariance was singular; predicted state kept
    Skipped,
}

/// Which vector observation a correction uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Gravity,
    Field,
}

/// Quaternion EKF driven by gyro, corrected by accel and mag
#[derive(Debug, Clone)]
pub struct AttitudeEkf {
    quaternion: Quaternion,
    state: EkfState,
    gyro_noise: f32,
}

impl AttitudeEkf {
    /// Filter with default tuning and the given gyroscope noise
    pub fn new(gyro_noise: f32) -> Self {
        Self::with_config(EkfConfig::default().with_gyro_noise(gyro_noise))
    }

    /// Filter from a full configuration
    pub fn with_config(config: EkfConfig) -> Self {
        Self {
            quaternion: config.initial_attitude.normalized(),
            state: EkfState::from_config(&config),
            gyro_noise: config.gyro_noise,
        }
    }

    /// Current attitude quaternion
    pub fn quaternion(&self) -> Quaternion {
        self.quaternion
    }

    /// Current covariance `P`
    pub fn covariance(&self) -> &Matrix4 {
        &self.state.covariance
    }

    /// All filter matrices
    pub fn state(&self) -> &EkfState {
        &self.state
    }

    /// Gyroscope noise scale
    pub fn gyro_noise(&self) -> f32 {
        self.gyro_noise
    }

    /// Propagate attitude and covariance through `dt` seconds of rotation
    pub fn predict(&mut self, gyro: &Vector3, dt: f32) {
        let f = transition_matrix(gyro, dt);

        let mut predicted = [0.0; 4];
        matvec(&f, &self.quaternion.to_array(), &mut predicted);
        self.quaternion = renormalize(Quaternion::from_array(predicted));

        let q = self.gyro_noise * dt;
        self.state.process_noise = scaled_identity(q * q);

        // P = F·P·Fᵀ + Q
        let mut fp = [[0.0; 4]; 4];
        multiply(&f, &self.state.covariance, &mut fp);
        let mut ft = [[0.0; 4]; 4];
        transpose(&f, &mut ft);
        let mut fpft = [[0.0; 4]; 4];
        multiply(&fp, &ft, &mut fpft);
        for i in 0..4 {
            for j in 0..4 {
                self.state.covariance[i][j] = fpft[i][j] + self.state.process_noise[i][j];
            }
        }
    }

    /// Correct attitude with an accelerometer reading
    pub fn update_accel(&mut self, accel: &Vector3) -> CorrectionStatus {
        self.update(Observation::Gravity, accel)
    }

    /// Correct attitude with a magnetometer reading
    pub fn update_mag(&mut self, mag: &Vector3) -> CorrectionStatus {
        self.update(Observation::Field, mag)
    }

    /// Gravity as the accelerometer should read it at the current attitude
    pub fn expected_gravity(&self) -> Vector3 {
        self.quaternion.rotate_inverse(&GRAVITY_EARTH_FRAME)
    }

    /// Reference field as the magnetometer should read it at the current attitude
    pub fn expected_field(&self) -> Vector3 {
        self.quaternion.rotate_inverse(&self.state.reference_field)
    }

    /// Non-gravitational vertical acceleration: earth-frame Z of `accel`
    /// minus standard gravity
    pub fn vertical_accel(&self, accel: &Vector3) -> f32 {
        self.quaternion.rotate(accel)[2] - STANDARD_GRAVITY_M_S2
    }

    /// Current attitude as yaw / pitch / roll
    pub fn attitude(&self) -> EulerAngles {
        self.quaternion.to_euler()
    }

    fn update(&mut self, observation: Observation, measurement: &Vector3) -> CorrectionStatus {
        let reference = match observation {
            Observation::Gravity => GRAVITY_EARTH_FRAME,
            Observation::Field => self.state.reference_field,
        };

        let expected = self.quaternion.rotate_inverse(&reference);
        let innovation = subtract_vectors(measurement, &expected);
        let jacobian = observation_jacobian(&self.quaternion, &reference);

        let (h, r) = match observation {
            Observation::Gravity => {
                self.state.accel_jacobian = jacobian;
                (&self.state.accel_jacobian, &self.state.accel_noise)
            }
            Observation::Field => {
                self.state.mag_jacobian = jacobian;
                (&self.state.mag_jacobian, &self.state.mag_noise)
            }
        };

        match correct(&self.quaternion, &self.state.covariance, h, r, &innovation) {
            Ok((quaternion, covariance)) => {
                self.quaternion = quaternion;
                self.state.covariance = covariance;
                CorrectionStatus::Applied
            }
            Err(_err) => {
                log_debug!("{:?} correction skipped: {:?}", observation, _err);
                CorrectionStatus::Skipped
            }
        }
    }
}

/// `s·I`
fn scaled_identity<const N: usize>(s: f32) -> [[f32; N]; N] {
    let mut m = identity::<N>();
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = s;
    }
    m
}

/// Quaternion rate operator `Ω(g)`, so that `q̇ = ½·Ω(g)·q`
pub fn omega(gyro: &Vector3) -> Matrix4 {
    let [gx, gy, gz] = *gyro;
    [
        [0.0, -gx, -gy, -gz],
        [gx, 0.0, gz, -gy],
        [gy, -gz, 0.0, gx],
        [gz, gy, -gx, 0.0],
    ]
}

/// Linearized transition `F = I₄ + ½·dt·Ω(g)`
pub fn transition_matrix(gyro: &Vector3, dt: f32) -> Matrix4 {
    let om = omega(gyro);
    let half_dt = 0.5 * dt;
    let mut f = identity::<4>();
    for i in 0..4 {
        for j in 0..4 {
            f[i][j] += half_dt * om[i][j];
        }
    }
    f
}

/// Forward-difference Jacobian of `q ↦ R(q)ᵀ·reference`
///
/// Perturbed quaternions are not renormalized; the rotation matrix is written
/// in homogeneous form so the derivative stays well defined.
pub fn observation_jacobian(quaternion: &Quaternion, reference: &Vector3) -> ObservationJacobian {
    let base = quaternion.to_array();
    let h0 = quaternion.rotate_inverse(reference);

    let mut jacobian = [[0.0; 4]; 3];
    for col in 0..4 {
        let mut perturbed = base;
        perturbed[col] += JACOBIAN_EPSILON;
        let h_plus = Quaternion::from_array(perturbed).rotate_inverse(reference);

        for row in 0..3 {
            jacobian[row][col] = (h_plus[row] - h0[row]) / JACOBIAN_EPSILON;
        }
    }
    jacobian
}

/// One Kalman correction. Returns the corrected quaternion and covariance
/// without touching the inputs, so a failure leaves the caller's state intact.
fn correct(
    quaternion: &Quaternion,
    covariance: &Matrix4,
    h: &ObservationJacobian,
    r: &Matrix3,
    innovation: &Vector3,
) -> FusionResult<(Quaternion, Matrix4)> {
    // S = H·P·Hᵀ + R
    let mut hp = [[0.0; 4]; 3];
    multiply(h, covariance, &mut hp);
    let mut ht = [[0.0; 3]; 4];
    transpose(h, &mut ht);
    let mut s = [[0.0; 3]; 3];
    multiply(&hp, &ht, &mut s);
    for i in 0..3 {
        for j in 0..3 {
            s[i][j] += r[i][j];
        }
    }

    let mut s_inv = [[0.0; 3]; 3];
    invert3x3(&s, &mut s_inv)?;

    // K = P·Hᵀ·S⁻¹
    let mut pht = [[0.0; 3]; 4];
    multiply(covariance, &ht, &mut pht);
    let mut gain = [[0.0; 3]; 4];
    multiply(&pht, &s_inv, &mut gain);

    // x = x + K·y
    let mut correction: Vector<4> = [0.0; 4];
    matvec(&gain, innovation, &mut correction);
    let mut x = quaternion.to_array();
    for (xi, dxi) in x.iter_mut().zip(correction.iter()) {
        *xi += dxi;
    }
    let corrected = renormalize(Quaternion::from_array(x));

    // P = (I - K·H)·P
    let mut kh = [[0.0; 4]; 4];
    multiply(&gain, h, &mut kh);
    let mut i_kh = identity::<4>();
    for i in 0..4 {
        for j in 0..4 {
            i_kh[i][j] -= kh[i][j];
        }
    }
    let mut updated = [[0.0; 4]; 4];
    multiply(&i_kh, covariance, &mut updated);
    make_symmetric(&mut updated);

    Ok((corrected, updated))
}

/// Normalize, resetting to identity (and saying so) on degeneracy
fn renormalize(q: Quaternion) -> Quaternion {
    match q.try_normalized() {
        Ok(unit) => unit,
        Err(_err) => {
            log_warn!("{} {:?}, resetting to identity", _err, q);
            Quaternion::IDENTITY
        }
    }
}
