//! Quaternion to roll/pitch/yaw decomposition.
//!
//! Aerospace convention: yaw about Z, then pitch about Y, then roll about X
//! (intrinsic Z-Y'-X''). All angles in radians unless stated otherwise.

use crate::types::Quaternion;
use std::f64::consts::FRAC_PI_2;

/// Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn to_degrees(self) -> Self {
        Self {
            roll: rad_to_deg(self.roll),
            pitch: rad_to_deg(self.pitch),
            yaw: rad_to_deg(self.yaw),
        }
    }
}

/// Decompose a quaternion into roll, pitch and yaw.
///
/// The input is normalized first. A zero-length quaternion has no defined
/// orientation; callers must reject those before getting here.
pub fn to_euler(q: Quaternion) -> EulerAngles {
    let q = q.normalize();
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);

    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    // Rounding can push |sinp| slightly past 1 near the poles.
    let sinp = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
    let pitch = sinp.asin();

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    EulerAngles { roll, pitch, yaw }
}

/// Compose a unit quaternion from roll, pitch and yaw (inverse of [`to_euler`]).
pub fn from_euler(angles: EulerAngles) -> Quaternion {
    let (sr, cr) = (angles.roll * 0.5).sin_cos();
    let (sp, cp) = (angles.pitch * 0.5).sin_cos();
    let (sy, cy) = (angles.yaw * 0.5).sin_cos();

    Quaternion::from_xyzw(
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    )
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * (180.0 / std::f64::consts::PI)
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

/// Whether `pitch` sits close enough to ±90° that yaw and roll are no longer
/// independent.
pub fn near_gimbal_lock(pitch: f64, tolerance: f64) -> bool {
    (pitch.abs() - FRAC_PI_2).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;

    fn assert_angles_close(a: EulerAngles, b: EulerAngles) {
        assert!((a.roll - b.roll).abs() < TOL, "roll {} vs {}", a.roll, b.roll);
        assert!((a.pitch - b.pitch).abs() < TOL, "pitch {} vs {}", a.pitch, b.pitch);
        assert!((a.yaw - b.yaw).abs() < TOL, "yaw {} vs {}", a.yaw, b.yaw);
    }

    #[test]
    fn identity_has_no_rotation() {
        let e = to_euler(Quaternion::IDENTITY);
        assert_angles_close(e, EulerAngles::default());
    }

    #[test]
    fn single_axis_rotations() {
        let angle = 0.7;
        let yaw_only = to_euler(Quaternion::from_rotation_z(angle));
        assert_angles_close(yaw_only, EulerAngles::new(0.0, 0.0, angle));

        let pitch_only = to_euler(Quaternion::from_rotation_y(angle));
        assert_angles_close(pitch_only, EulerAngles::new(0.0, angle, 0.0));

        let roll_only = to_euler(Quaternion::from_rotation_x(angle));
        assert_angles_close(roll_only, EulerAngles::new(angle, 0.0, 0.0));
    }

    #[test]
    fn matches_glam_zyx_composition() {
        let q = Quaternion::from_euler(glam::EulerRot::ZYX, 1.1, -0.4, 0.25);
        assert_angles_close(to_euler(q), EulerAngles::new(0.25, -0.4, 1.1));
        let ours = from_euler(EulerAngles::new(0.25, -0.4, 1.1));
        assert!(ours.dot(q).abs() > 1.0 - 1e-9);
    }

    #[test]
    fn round_trip_away_from_gimbal_lock() {
        let rolls = [-3.0, -1.2, 0.0, 0.4, 2.9];
        let pitches = [-1.5, -0.8, 0.0, 0.3, 1.4];
        let yaws = [-3.1, -0.5, 0.0, 1.0, 3.0];

        for &roll in &rolls {
            for &pitch in &pitches {
                for &yaw in &yaws {
                    let angles = EulerAngles::new(roll, pitch, yaw);
                    let q = from_euler(angles);
                    assert_angles_close(to_euler(q), angles);
                }
            }
        }
    }

    #[test]
    fn gimbal_lock_reports_pitch_only() {
        // At pitch = ±90° yaw and roll collapse into one degree of freedom,
        // so only pitch is compared.
        for pitch in [FRAC_PI_2, -FRAC_PI_2] {
            let q = from_euler(EulerAngles::new(0.3, pitch, 0.5));
            let e = to_euler(q);

            assert!(near_gimbal_lock(e.pitch, 1e-3));
            assert!((e.pitch - pitch).abs() < 1e-3);
            assert!(e.roll.is_finite() && e.yaw.is_finite());
        }
    }

    #[test]
    fn pitch_clamps_instead_of_nan() {
        // Slightly over-unit sin(pitch) after rounding.
        let c = std::f64::consts::FRAC_1_SQRT_2 + 1e-12;
        let q = Quaternion::from_xyzw(0.0, c, 0.0, c);
        let e = to_euler(q);
        assert!(e.pitch.is_finite());
        assert!((e.pitch - FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn non_unit_input_is_normalized() {
        let q = Quaternion::from_rotation_z(0.9);
        let scaled = Quaternion::from_xyzw(q.x * 3.0, q.y * 3.0, q.z * 3.0, q.w * 3.0);
        assert_angles_close(to_euler(scaled), to_euler(q));
    }

    #[test]
    fn pure_function() {
        let q = Quaternion::from_xyzw(0.1, -0.2, 0.3, 0.9);
        assert_eq!(to_euler(q), to_euler(q));
    }

    #[test]
    fn degree_conversion() {
        assert!((rad_to_deg(std::f64::consts::PI) - 180.0).abs() < 1e-12);
        assert!((deg_to_rad(90.0) - FRAC_PI_2).abs() < 1e-12);
        let e = EulerAngles::new(FRAC_PI_2, 0.0, -std::f64::consts::PI).to_degrees();
        assert!((e.roll - 90.0).abs() < 1e-12);
        assert!((e.yaw + 180.0).abs() < 1e-12);
    }
}
