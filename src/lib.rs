//! # surfel-rs: Surfel Splatting in Rust
//!
//! This crate renders clouds of oriented disc-shaped "surfel" splats
//! (position, radius, normal, color) as shaded, anti-aliased circular
//! footprints. Overlapping footprints are composited with order-insensitive
//! additive accumulation and resolved into a lit, gamma-correct image.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - `core`: Fundamental data structures (splats, cameras, math utilities)
//! - `io`: File I/O (PLY load/save)
//! - `render`: The splatting pipeline (CPU)
//! - `gpu`: GPU acceleration via wgpu (feature-gated)
//!
//! ## Pipeline
//!
//! Each frame runs three passes in strict order:
//!
//! 1. **Depth pre-pass**: footprints rasterized write-only into a depth
//!    buffer, extruded away from the eye by half a radius so the shaded
//!    footprints that follow are not self-occluded.
//! 2. **Accumulation**: Gaussian-falloff footprints add premultiplied
//!    color+opacity and weighted normals into two float targets, gated by
//!    the pre-pass depth. Pure addition, so draw order is immaterial.
//! 3. **Resolve**: un-premultiply, reconstruct a surface normal, apply a
//!    fixed two-light model, sRGB-encode.

// Core data structures and math
pub mod core;

// I/O operations (PLY)
pub mod io;

// Splatting pipeline (CPU)
pub mod render;

// GPU acceleration (optional)
pub mod gpu;

// Re-export commonly used types at crate root for convenience
pub use crate::core::{Camera, FrameParams, Splat, SplatCloud};
pub use crate::io::LoadError;
pub use crate::render::SplatPipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
