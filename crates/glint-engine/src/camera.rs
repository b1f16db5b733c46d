//! 2D camera.

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::cache::Cached;

/// Orthographic 2D camera.
///
/// The view matrix is cached and rebuilt on the first read after a mutation.
#[derive(Debug, Clone)]
pub struct Camera2d {
    position: Vec2,
    rotation: f32,
    zoom: f32,
    view: Cached<Mat4>,
}

impl Camera2d {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            zoom: 1.0,
            view: Cached::new(Mat4::IDENTITY),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// True when the next `view_matrix` call recomputes.
    pub fn needs_update(&self) -> bool {
        !self.view.is_valid()
    }

    /// `T(-position) · Rz(-rotation) · S(zoom, zoom, 1)`.
    pub fn view_matrix(&mut self) -> Mat4 {
        let (position, rotation, zoom) = (self.position, self.rotation, self.zoom);
        *self.view.get_or_update(|view| {
            *view = Mat4::from_translation(Vec3::new(-position.x, -position.y, 0.0))
                * Mat4::from_quat(Quat::from_rotation_z(-rotation))
                * Mat4::from_scale(Vec3::new(zoom, zoom, 1.0));
        })
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.view.invalidate();
    }

    pub fn move_by(&mut self, offset: Vec2) {
        self.position += offset;
        self.view.invalidate();
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
        self.view.invalidate();
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom *= factor;
        self.view.invalidate();
    }

    /// Radians.
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.view.invalidate();
    }

    pub fn rotate(&mut self, delta: f32) {
        self.rotation += delta;
        self.view.invalidate();
    }
}

impl Default for Camera2d {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn view_is_cached_until_mutated() {
        let mut cam = Camera2d::new();
        assert!(cam.needs_update());

        let a = cam.view_matrix();
        assert!(!cam.needs_update());
        let b = cam.view_matrix();
        assert_eq!(a.to_cols_array(), b.to_cols_array());
        assert_eq!(a, Mat4::IDENTITY);

        cam.move_by(Vec2::new(1.0, 2.0));
        assert!(cam.needs_update());
        let p = cam.view_matrix() * Vec4::new(1.0, 2.0, 0.0, 1.0);
        assert!(p.truncate().truncate().abs_diff_eq(Vec2::ZERO, 1e-6));
    }

    #[test]
    fn zoom_scales_world_points() {
        let mut cam = Camera2d::new();
        cam.set_zoom(2.0);
        cam.zoom_by(1.5);
        assert_eq!(cam.zoom(), 3.0);

        let p = cam.view_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn rotation_turns_opposite_to_camera() {
        let mut cam = Camera2d::new();
        cam.set_rotation(std::f32::consts::FRAC_PI_4);
        cam.rotate(std::f32::consts::FRAC_PI_4);

        let p = cam.view_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y + 1.0).abs() < 1e-6);
    }
}
