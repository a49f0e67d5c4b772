//! Property tests for filter invariants

#![cfg(test)]

use proptest::prelude::*;

use stratofuse_core::constants::fusion::{QUATERNION_NORM_TOLERANCE, ZUPT_WINDOW_SIZE};
use stratofuse_core::fusion::matrix::{determinant3x3, invert3x3, multiply, Matrix3};
use stratofuse_core::{AttitudeEkf, ComplementaryFilter, Quaternion};

fn vector(range: f32) -> impl Strategy<Value = [f32; 3]> {
    [-range..range, -range..range, -range..range]
}

proptest! {
    #[test]
    fn quaternion_stays_unit(
        steps in prop::collection::vec(
            (vector(5.0), vector(30.0), vector(2.0), 0.001f32..0.1),
            1..60,
        ),
        gyro_noise in 0.001f32..10.0,
    ) {
        let mut ekf = AttitudeEkf::new(gyro_noise);
        for (gyro, accel, mag, dt) in steps {
            ekf.predict(&gyro, dt);
            prop_assert!((ekf.quaternion().norm() - 1.0).abs() < QUATERNION_NORM_TOLERANCE);
            ekf.update_accel(&accel);
            prop_assert!((ekf.quaternion().norm() - 1.0).abs() < QUATERNION_NORM_TOLERANCE);
            ekf.update_mag(&mag);
            prop_assert!((ekf.quaternion().norm() - 1.0).abs() < QUATERNION_NORM_TOLERANCE);
        }
    }

    #[test]
    fn euler_output_is_finite(w in -1.0f32..1.0, x in -1.0f32..1.0, y in -1.0f32..1.0, z in -1.0f32..1.0) {
        let euler = Quaternion::new(w, x, y, z).normalized().to_euler();
        prop_assert!(euler.yaw.is_finite() && euler.pitch.is_finite() && euler.roll.is_finite());
    }

    #[test]
    fn quiet_window_forces_zero_velocity(
        samples in prop::collection::vec(-0.099f32..0.099, ZUPT_WINDOW_SIZE),
        velocity in -50.0f32..50.0,
    ) {
        let mut cf = ComplementaryFilter::new(8.0, 8.0, 0.1);
        let mut last = velocity;
        for a in samples {
            last = cf.apply_zupt(a, velocity);
        }
        prop_assert_eq!(last, 0.0);
    }

    #[test]
    fn one_loud_sample_passes_velocity(
        position in 0..ZUPT_WINDOW_SIZE,
        loud in 0.1f32..100.0,
        negative in any::<bool>(),
        velocity in -50.0f32..50.0,
    ) {
        let mut cf = ComplementaryFilter::new(8.0, 8.0, 0.1);
        let loud = if negative { -loud } else { loud };
        let mut last = 0.0;
        for i in 0..ZUPT_WINDOW_SIZE {
            let a = if i == position { loud } else { 0.0 };
            last = cf.apply_zupt(a, velocity);
        }
        prop_assert_eq!(last, velocity);
    }

    #[test]
    fn complementary_fixed_point(
        altitude in -500.0f32..5000.0,
        dt in 0.001f32..0.5,
        sigma_accel in 0.1f32..10.0,
        sigma_baro in 0.1f32..10.0,
    ) {
        let mut cf = ComplementaryFilter::new(sigma_accel, sigma_baro, 0.1);
        let out = cf.estimate(altitude, altitude, 0.0, 0.0, dt);
        prop_assert_eq!(out.altitude, altitude);
        prop_assert_eq!(out.vertical_velocity, 0.0);
    }

    #[test]
    fn inverse_is_inverse(m in [vector(10.0), vector(10.0), vector(10.0)]) {
        let m: Matrix3 = m;
        prop_assume!(determinant3x3(&m).abs() > 10.0);

        let mut inv = [[0.0; 3]; 3];
        invert3x3(&m, &mut inv).unwrap();
        let mut product = [[0.0; 3]; 3];
        multiply(&m, &inv, &mut product);

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                prop_assert!((product[i][j] - expected).abs() < 1e-3);
            }
        }
    }
}
