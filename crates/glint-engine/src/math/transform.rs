use glam::{Mat4, Quat, Vec3};

/// Model matrix for a unit primitive: `T(x, y) · Rz(rot) · S(sx, sy)`.
///
/// `rot` is in radians. A zero rotation skips the rotation factor.
pub fn model_transform(x: f32, y: f32, sx: f32, sy: f32, rot: f32) -> Mat4 {
    let translate = Mat4::from_translation(Vec3::new(x, y, 0.0));
    let scale = Mat4::from_scale(Vec3::new(sx, sy, 1.0));
    if rot == 0.0 {
        translate * scale
    } else {
        translate * Mat4::from_quat(Quat::from_rotation_z(rot)) * scale
    }
}

/// Orthographic projection covering `[-aspect, aspect] × [-1, 1]`.
///
/// A degenerate viewport falls back to an aspect ratio of one.
pub fn ortho_projection(width: u32, height: u32) -> Mat4 {
    let aspect = if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    };
    Mat4::orthographic_rh(-aspect, aspect, -1.0, 1.0, -1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn zero_rotation_matches_full_product() {
        let fast = model_transform(0.3, -0.2, 0.5, 0.25, 0.0);
        let full = Mat4::from_translation(Vec3::new(0.3, -0.2, 0.0))
            * Mat4::from_quat(Quat::from_rotation_z(0.0))
            * Mat4::from_scale(Vec3::new(0.5, 0.25, 1.0));
        assert!(fast.abs_diff_eq(full, 1e-7));
    }

    #[test]
    fn rotation_applies_after_scale() {
        let m = model_transform(0.0, 0.0, 2.0, 1.0, std::f32::consts::FRAC_PI_2);
        let p = m * Vec4::new(0.5, 0.0, 0.0, 1.0);
        assert!((p.x).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn projection_maps_aspect_edges_to_ndc() {
        let proj = ortho_projection(800, 400);
        let right = proj * Vec4::new(2.0, 1.0, 0.0, 1.0);
        assert!((right.x - 1.0).abs() < 1e-6);
        assert!((right.y - 1.0).abs() < 1e-6);
    }
}
