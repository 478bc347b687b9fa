//! Camera state and per-frame parameters.
//!
//! The pipeline itself never looks at camera internals; it consumes a
//! `FrameParams` block (eye state + combined projection-view transform +
//! scale factors) supplied fresh each frame. `Camera` is the collaborator
//! that produces such a block from a conventional eye/target/up setup.

use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A perspective look-at camera.
///
/// Serde-derived so a camera pose can be loaded from a JSON file by the
/// CLI (`--camera-json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Camera {
    /// Eye position in world space
    pub eye: Vector3<f32>,

    /// Look-at target in world space
    pub target: Vector3<f32>,

    /// Up vector (need not be unit length)
    pub up: Vector3<f32>,

    /// Vertical field of view in radians
    pub fov_y: f32,

    /// Near clip plane distance
    pub near: f32,

    /// Far clip plane distance
    pub far: f32,
}

impl Camera {
    /// Create a camera with a 60° vertical field of view and default clip
    /// planes, looking from `eye` toward `target` with +Y up.
    pub fn look_at(eye: Vector3<f32>, target: Vector3<f32>) -> Self {
        Self {
            eye,
            target,
            up: Vector3::new(0.0, 1.0, 0.0),
            fov_y: 60.0f32.to_radians(),
            near: 0.1,
            far: 500.0,
        }
    }

    /// Combined projection-view matrix for a viewport of the given size.
    pub fn proj_view(&self, width: u32, height: u32) -> Matrix4<f32> {
        let aspect = width as f32 / height as f32;
        let proj = Perspective3::new(aspect, self.fov_y, self.near, self.far);
        let view = Matrix4::look_at_rh(
            &Point3::from(self.eye),
            &Point3::from(self.target),
            &self.up,
        );
        proj.to_homogeneous() * view
    }

    /// Unit view direction (eye toward target).
    pub fn view_direction(&self) -> Vector3<f32> {
        (self.target - self.eye).normalize()
    }

    /// Assemble the per-frame parameter block consumed by the pipeline.
    pub fn frame_params(
        &self,
        width: u32,
        height: u32,
        radius_scale: f32,
        scaling: f32,
    ) -> FrameParams {
        FrameParams {
            eye_pos: self.eye,
            eye_dir: self.view_direction(),
            proj_view: self.proj_view(width, height),
            radius_scale,
            scaling,
        }
    }
}

/// Per-frame parameters for the splatting pipeline.
///
/// Supplied fresh each frame; the pipeline holds no camera state between
/// frames. For any visible splat, `radius * radius_scale * scaling` must be
/// positive - that is the producer's invariant, not re-checked per pixel.
#[derive(Clone, Debug)]
pub struct FrameParams {
    /// Eye position in world space
    pub eye_pos: Vector3<f32>,

    /// Unit view direction of the eye
    pub eye_dir: Vector3<f32>,

    /// Combined projection * view transform
    pub proj_view: Matrix4<f32>,

    /// Multiplier applied to every splat radius
    pub radius_scale: f32,

    /// Global scene scale applied to radii and positions alike
    pub scaling: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_target_projects_to_viewport_center() {
        let camera = Camera::look_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros());
        let pv = camera.proj_view(640, 480);

        let clip = pv * Vector3::zeros().push(1.0);
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        assert_relative_eq!(ndc_x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc_y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_view_direction_is_unit() {
        let camera = Camera::look_at(Vector3::new(1.0, 2.0, 3.0), Vector3::new(-4.0, 0.0, 2.0));
        assert_relative_eq!(camera.view_direction().norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_point_behind_camera_has_negative_w() {
        let camera = Camera::look_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros());
        let pv = camera.proj_view(640, 480);
        let clip = pv * Vector3::new(0.0, 0.0, 10.0).push(1.0);
        assert!(clip.w < 0.0);
    }
}
