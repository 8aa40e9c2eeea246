//! Additional math helpers layered on top of `glam`.

use glam::{Quat, Vec3};

/// Drops the depth component; contact normals live in the XY plane.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// Rotates `v` about +Z by `degrees`.
pub fn rotate_z_degrees(v: Vec3, degrees: f32) -> Vec3 {
    if degrees == 0.0 {
        return v;
    }
    Quat::from_rotation_z(degrees.to_radians()) * v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        assert_relative_eq!(rotate_z_degrees(Vec3::X, 90.0), Vec3::Y, epsilon = 1e-6);
        assert_relative_eq!(rotate_z_degrees(Vec3::X, -90.0), -Vec3::Y, epsilon = 1e-6);
        assert_eq!(rotate_z_degrees(Vec3::X, 0.0), Vec3::X);
    }

    #[test]
    fn flatten_keeps_the_plane() {
        assert_eq!(flatten(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 0.0));
    }
}
