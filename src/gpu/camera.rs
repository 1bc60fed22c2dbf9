//! Fixed perspective camera.

use glam::{Mat4, Vec3};

/// Narrow-angle camera looking at the scene from far away.
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Eye position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
}

impl Camera {
    /// Create the scene's default camera.
    pub fn new() -> Self {
        Self {
            fov_degrees: 9.0,
            near: 1.0,
            far: 50000.0,
            position: Vec3::new(0.0, 700.0, 7000.0),
            target: Vec3::ZERO,
        }
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection for a surface of the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_screen_centre() {
        let camera = Camera::new();
        let clip = camera.projection(16.0 / 9.0) * camera.view_matrix() * glam::Vec4::W;
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
