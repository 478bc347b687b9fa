//! GPU-friendly data types for splat rendering.
//!
//! These types are uploaded directly to GPU buffers:
//! - Flat memory layout (no pointers)
//! - 16-byte alignment per vec4
//! - bytemuck Pod + Zeroable traits

use crate::core::{FrameParams, Splat};

/// Per-instance splat attributes, matching the shader's instance buffer:
/// position+radius, normal (top 3 used), color (top 3 used).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SplatGPU {
    /// World position (x, y, z) and radius in w
    pub pos_radius: [f32; 4],

    /// Unit normal (x, y, z, padding)
    pub normal: [f32; 4],

    /// Linear base color (r, g, b, padding)
    pub color: [f32; 4],
}

impl SplatGPU {
    /// Convert from CPU splat to GPU instance format.
    pub fn from_splat(s: &Splat) -> Self {
        Self {
            pos_radius: [s.position.x, s.position.y, s.position.z, s.radius],
            normal: [s.normal.x, s.normal.y, s.normal.z, 0.0],
            color: [s.color.x, s.color.y, s.color.z, 0.0],
        }
    }
}

/// Frame uniform block for the splat shader.
///
/// Layout must match `FrameUniforms` in `shaders.rs`: mat4x4 (64 bytes),
/// two vec4s, then one 16-byte scalar block.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameGPU {
    /// Combined projection-view matrix, stored as columns
    /// (WGSL mat4x4 is column-major).
    pub proj_view: [[f32; 4]; 4],

    /// Eye position (x, y, z, padding)
    pub eye_pos: [f32; 4],

    /// Eye view direction (x, y, z, padding)
    pub eye_dir: [f32; 4],

    /// Multiplier applied to every splat radius
    pub radius_scale: f32,

    /// Global scene scale
    pub scaling: f32,

    /// 1 during the depth pre-pass (enables the half-radius extrusion)
    pub depth_prepass: u32,

    pub _pad: u32,
}

impl FrameGPU {
    /// Convert frame parameters to the uniform layout.
    pub fn from_frame(frame: &FrameParams, depth_prepass: bool) -> Self {
        let m = &frame.proj_view;
        let mut proj_view = [[0.0f32; 4]; 4];
        for (col, out) in proj_view.iter_mut().enumerate() {
            for (row, v) in out.iter_mut().enumerate() {
                *v = m[(row, col)];
            }
        }
        Self {
            proj_view,
            eye_pos: [frame.eye_pos.x, frame.eye_pos.y, frame.eye_pos.z, 0.0],
            eye_dir: [frame.eye_dir.x, frame.eye_dir.y, frame.eye_dir.z, 0.0],
            radius_scale: frame.radius_scale,
            scaling: frame.scaling,
            depth_prepass: u32::from(depth_prepass),
            _pad: 0,
        }
    }
}

/// Uniforms for the resolve pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ResolveGPU {
    /// Eye view direction (x, y, z, padding)
    pub eye_dir: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Camera;
    use nalgebra::Vector3;

    #[test]
    fn test_frame_gpu_stores_columns() {
        let frame = Camera::look_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros())
            .frame_params(64, 64, 1.0, 1.0);
        let gpu = FrameGPU::from_frame(&frame, false);
        for col in 0..4 {
            for row in 0..4 {
                assert_eq!(gpu.proj_view[col][row], frame.proj_view[(row, col)]);
            }
        }
        assert_eq!(gpu.depth_prepass, 0);
        assert_eq!(FrameGPU::from_frame(&frame, true).depth_prepass, 1);
    }

    #[test]
    fn test_splat_gpu_packing() {
        let s = Splat::new(
            Vector3::new(1.0, 2.0, 3.0),
            0.25,
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.5, 0.6, 0.7),
        );
        let gpu = SplatGPU::from_splat(&s);
        assert_eq!(gpu.pos_radius, [1.0, 2.0, 3.0, 0.25]);
        assert_eq!(gpu.normal, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(gpu.color, [0.5, 0.6, 0.7, 0.0]);
    }
}
