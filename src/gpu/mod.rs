//! GPU acceleration (feature-gated).
//!
//! This module renders the splatting pipeline with wgpu. Only available
//! when compiled with --features gpu.
//!
//! Architecture:
//! - `context` - wgpu device/queue initialization
//! - `buffers` - GPU buffer management and texture readback
//! - `types` - Pod instance/uniform layouts
//! - `shaders` - WGSL shader modules
//! - `renderer` - the three-pass renderer

#[cfg(feature = "gpu")]
mod buffers;
#[cfg(feature = "gpu")]
mod context;
#[cfg(feature = "gpu")]
mod renderer;
#[cfg(feature = "gpu")]
mod shaders;
#[cfg(feature = "gpu")]
mod types;

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use renderer::GpuRenderer;
#[cfg(feature = "gpu")]
pub use types::{FrameGPU, SplatGPU};

#[cfg(not(feature = "gpu"))]
pub struct GpuRenderer;

#[cfg(not(feature = "gpu"))]
impl GpuRenderer {
    pub fn new() -> Result<Self, String> {
        Err("GPU support not enabled. Compile with --features gpu".to_string())
    }
}
