//! Math utilities and types
//!
//! Thin aliases over nalgebra so scene data and wire payloads share one
//! vocabulary for positions, rotations and scales.

pub use nalgebra::{Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Largest deviation from unit length accepted without renormalizing
pub const UNIT_QUAT_EPSILON: f32 = 1e-4;

/// Check that every lane of a vector is a finite number
pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Build a rotation from raw quaternion lanes.
///
/// Lanes that already describe a unit quaternion are kept bit-exact; anything
/// further than [`UNIT_QUAT_EPSILON`] from unit length is renormalized. Returns
/// `None` for non-finite lanes or a zero-length quaternion.
pub fn quat_from_lanes(x: f32, y: f32, z: f32, w: f32) -> Option<Quat> {
    let raw = Quaternion::new(w, x, y, z);
    if !raw.coords.iter().all(|c| c.is_finite()) {
        return None;
    }
    let norm = raw.norm();
    if norm <= f32::EPSILON {
        return None;
    }
    if (norm - 1.0).abs() <= UNIT_QUAT_EPSILON {
        Some(Unit::new_unchecked(raw))
    } else {
        Some(Unit::new_normalize(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_quaternion_is_kept_exact() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let q = quat_from_lanes(0.0, half, 0.0, half).expect("valid rotation");
        assert_eq!(q.i, 0.0);
        assert_eq!(q.j, half);
        assert_eq!(q.w, half);
    }

    #[test]
    fn scaled_quaternion_is_normalized() {
        let q = quat_from_lanes(0.0, 0.0, 0.0, 2.0).expect("valid rotation");
        assert_eq!(q.w, 1.0);
    }

    #[test]
    fn degenerate_lanes_are_rejected() {
        assert!(quat_from_lanes(0.0, 0.0, 0.0, 0.0).is_none());
        assert!(quat_from_lanes(f32::NAN, 0.0, 0.0, 1.0).is_none());
        assert!(!is_finite_vec3(&Vec3::new(0.0, f32::INFINITY, 0.0)));
    }
}
