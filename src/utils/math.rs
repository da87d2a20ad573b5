//! Additional math helpers layered on top of `glam`.
//!
//! All helpers treat near-zero vectors as degenerate and return a neutral
//! value instead of propagating `NaN`.

use glam::{Quat, Vec3};

/// Squared length under which a vector counts as degenerate.
pub const DEGENERATE_EPSILON: f32 = 1e-12;

/// Unit direction of `v`, or `None` when `v` is (nearly) zero.
pub fn direction(v: Vec3) -> Option<Vec3> {
    let len_sq = v.length_squared();
    if len_sq <= DEGENERATE_EPSILON || !len_sq.is_finite() {
        return None;
    }
    Some(v / len_sq.sqrt())
}

/// Component of `v` along `onto`. Zero when `onto` is degenerate.
pub fn project(v: Vec3, onto: Vec3) -> Vec3 {
    let len_sq = onto.length_squared();
    if len_sq <= DEGENERATE_EPSILON {
        return Vec3::ZERO;
    }
    onto * (v.dot(onto) / len_sq)
}

/// Component of `v` orthogonal to `normal`.
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - project(v, normal)
}

/// Unsigned angle between two vectors in radians, `None` if either is degenerate.
pub fn angle_between(a: Vec3, b: Vec3) -> Option<f32> {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom <= DEGENERATE_EPSILON || !denom.is_finite() {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0).acos())
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Identity when either input is degenerate.
pub fn from_to_rotation(from: Vec3, to: Vec3) -> Quat {
    match (direction(from), direction(to)) {
        (Some(from), Some(to)) => Quat::from_rotation_arc(from, to),
        _ => Quat::IDENTITY,
    }
}

/// Rotates `current` onto the direction of `rest` while keeping its length.
pub fn rotate_onto(current: Vec3, rest: Vec3) -> Vec3 {
    match direction(rest) {
        Some(dir) => dir * current.length(),
        None => current,
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Signed volume of the tetrahedron spanned by the origin and a triangle.
pub fn signed_triangle_volume(p1: Vec3, p2: Vec3, p3: Vec3) -> f32 {
    p1.dot(p2.cross(p3)) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_inputs_stay_finite() {
        assert_eq!(direction(Vec3::ZERO), None);
        assert_eq!(project(Vec3::X, Vec3::ZERO), Vec3::ZERO);
        assert_eq!(angle_between(Vec3::ZERO, Vec3::Y), None);
        assert_eq!(from_to_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);
    }

    #[test]
    fn projection_splits_vector() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let along = project(v, Vec3::Y * 4.0);
        let across = project_on_plane(v, Vec3::Y);
        assert!((along - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
        assert!((across - Vec3::new(1.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn right_angle_is_measured() {
        let angle = angle_between(Vec3::X, Vec3::Z * 3.0).unwrap();
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn rotate_onto_keeps_length() {
        let rotated = rotate_onto(Vec3::new(0.0, 2.0, 0.0), Vec3::X * 0.1);
        assert!((rotated - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn unit_cube_corner_volume() {
        let v = signed_triangle_volume(Vec3::X, Vec3::Y, Vec3::Z);
        assert!((v - 1.0 / 6.0).abs() < 1e-6);
    }
}
