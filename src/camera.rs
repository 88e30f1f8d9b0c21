//! Fixed perspective camera looking down -Z.

use glam::{Mat4, Vec3};

use crate::math::deg_to_rad;

/// Perspective camera placed on the Z axis, looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Width / height of the viewport.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the origin along +Z.
    pub distance: f32,
}

impl Camera {
    /// Default scene camera: 50 degree FOV, z = 300.
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y: 50.0,
            aspect,
            near: 0.1,
            far: 2000.0,
            distance: 300.0,
        }
    }

    /// World position of the camera.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(deg_to_rad(self.fov_y), self.aspect, self.near, self.far)
    }

    /// Combined projection * view.
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Visible `(width, height)` of the plane through the origin.
    ///
    /// Both extents are floored to whole world units. The width is taken
    /// from the unfloored height.
    pub fn view_size(&self) -> (f32, f32) {
        let height = self.distance * deg_to_rad(self.fov_y / 2.0).tan() * 2.0;
        ((height * self.aspect).floor(), height.floor())
    }

    /// Update the aspect ratio after a resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}
