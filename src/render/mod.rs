//! Splatting pipeline (CPU implementation).
//!
//! Three passes per frame, each fully completing before the next:
//! - Depth pre-pass: footprint depths into the depth target
//! - Accumulation: additive premultiplied color + weighted normals,
//!   depth-gated by the pre-pass
//! - Resolve: un-premultiply, light, gamma-encode
//!
//! The GPU path in `crate::gpu` mirrors this structure with three render
//! passes; this module is the reference the GPU output is compared against.

pub mod footprint;
pub mod pipeline;
pub mod resolve;
pub mod targets;

// Re-export
pub use pipeline::SplatPipeline;
pub use targets::{AccumulationTargets, DepthTarget};
