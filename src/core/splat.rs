//! Splat representation and cloud data structure.
//!
//! A splat is an oriented disc representing a local surface patch:
//! - Position (disc center)
//! - Radius (positive scalar; the disc is circular, not elliptical)
//! - Normal (unit vector; the producer is expected to pre-normalize)
//! - Color (linear RGB)
//!
//! Splats are immutable during a frame; the renderer never mutates them.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// An oriented disc-shaped splat.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Splat {
    /// Disc center in world space
    pub position: Vector3<f32>,

    /// Disc radius (must be positive for a visible splat)
    pub radius: f32,

    /// Unit surface normal. Assumed pre-normalized by the producer;
    /// the renderer re-normalizes defensively when orienting the quad.
    pub normal: Vector3<f32>,

    /// Base color in linear RGB
    pub color: Vector3<f32>,
}

impl Splat {
    /// Create a new splat with given parameters.
    pub fn new(position: Vector3<f32>, radius: f32, normal: Vector3<f32>, color: Vector3<f32>) -> Self {
        Self {
            position,
            radius,
            normal,
            color,
        }
    }

    /// True if every component is finite and the radius is positive.
    ///
    /// The pipeline filters splats that fail this before rasterization so a
    /// single bad record cannot poison the depth or accumulation targets.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.normal.iter().all(|v| v.is_finite())
            && self.color.iter().all(|v| v.is_finite())
            && self.radius.is_finite()
            && self.radius > 0.0
    }
}

/// A collection of splats.
///
/// Array-of-Structs layout for simplicity; the GPU path repacks into a
/// flat instance buffer on upload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SplatCloud {
    pub splats: Vec<Splat>,
}

impl SplatCloud {
    /// Create a new empty splat cloud.
    pub fn new() -> Self {
        Self { splats: Vec::new() }
    }

    /// Create a cloud from a vector of splats.
    pub fn from_splats(splats: Vec<Splat>) -> Self {
        Self { splats }
    }

    /// Number of splats in the cloud.
    pub fn len(&self) -> usize {
        self.splats.len()
    }

    /// Check if the cloud is empty.
    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }

    /// Add a splat to the cloud.
    pub fn push(&mut self, splat: Splat) {
        self.splats.push(splat);
    }

    /// Get a reference to the splats.
    pub fn as_slice(&self) -> &[Splat] {
        &self.splats
    }

    /// Axis-aligned bounding box of the splat centers, or `None` if empty.
    ///
    /// Useful for framing a camera around a freshly loaded cloud.
    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let mut iter = self.splats.iter().filter(|s| s.is_finite());
        let first = iter.next()?;
        let mut min = first.position;
        let mut max = first.position;
        for s in iter {
            min = min.inf(&s.position);
            max = max.sup(&s.position);
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finite_rejects_bad_splats() {
        let good = Splat::new(
            Vector3::new(0.0, 0.0, 0.0),
            0.5,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
        );
        assert!(good.is_finite());

        let mut nan_pos = good.clone();
        nan_pos.position.x = f32::NAN;
        assert!(!nan_pos.is_finite());

        let mut zero_radius = good.clone();
        zero_radius.radius = 0.0;
        assert!(!zero_radius.is_finite());

        let mut neg_radius = good;
        neg_radius.radius = -1.0;
        assert!(!neg_radius.is_finite());
    }

    #[test]
    fn test_bounds() {
        let mut cloud = SplatCloud::new();
        assert!(cloud.bounds().is_none());

        cloud.push(Splat::new(
            Vector3::new(-1.0, 0.0, 2.0),
            0.1,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.5, 0.5, 0.5),
        ));
        cloud.push(Splat::new(
            Vector3::new(3.0, -2.0, 1.0),
            0.1,
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.5, 0.5, 0.5),
        ));

        let (min, max) = cloud.bounds().unwrap();
        assert_eq!(min, Vector3::new(-1.0, -2.0, 1.0));
        assert_eq!(max, Vector3::new(3.0, 0.0, 2.0));
    }
}
