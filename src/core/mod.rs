//! Core data structures and mathematical operations.
//!
//! This module contains the fundamental types used throughout the system:
//! - `Splat`: oriented disc primitive (position, radius, normal, color)
//! - `Camera` / `FrameParams`: per-frame view state
//! - Math utilities: Rodrigues rotations, normal alignment
//! - Color: sRGB transfer functions
//!
//! All types here are "pure data" - no I/O, no rendering logic.

mod camera;
pub mod color;
pub mod math;
mod splat;

// Re-export public types
pub use camera::{Camera, FrameParams};
pub use math::{align_to_normal, rotation_matrix, QUAD_NORMAL};
pub use splat::{Splat, SplatCloud};
