//! I/O operations for loading and saving splat data.
//!
//! Splat clouds travel as PLY files with one vertex element per splat:
//! position, radius, normal, and color. Both ASCII and binary
//! little-endian bodies are supported.

mod ply;

// Re-export public types and functions
pub use ply::{load_ply, save_ply, save_ply_binary, LoadError};
