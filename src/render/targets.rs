//! Accumulation and depth targets.
//!
//! The original fixed-function setup (additive blending, depth test against
//! a pre-pass buffer) is modeled explicitly:
//!
//! - The accumulation targets expose only `add_*` operations. Addition is
//!   commutative and associative, so the order splats are rasterized in
//!   cannot affect the result beyond float rounding.
//! - The depth target exposes `test_write` (pre-pass: keep the nearest
//!   depth) and `test` (accumulation: accept samples at or in front of the
//!   pre-pass depth).
//!
//! Both must be cleared before every frame; `SplatPipeline` does this at
//! the top of `render`.

use nalgebra::Vector3;

/// Two per-pixel floating-point accumulation targets:
/// - color: sum of (color·opacity, opacity) - premultiplied alpha
/// - normal: sum of normal·opacity
#[derive(Clone, Debug)]
pub struct AccumulationTargets {
    width: u32,
    height: u32,
    color: Vec<[f32; 4]>,
    normal: Vec<[f32; 3]>,
}

impl AccumulationTargets {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![[0.0; 4]; len],
            normal: vec![[0.0; 3]; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every pixel to zero. Must run before each frame's
    /// accumulation pass.
    pub fn clear(&mut self) {
        self.color.fill([0.0; 4]);
        self.normal.fill([0.0; 3]);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Add one footprint sample: premultiplied color + opacity into the
    /// color target, weighted normal into the normal target.
    #[inline]
    pub fn add_sample(&mut self, x: u32, y: u32, color: Vector3<f32>, opacity: f32, normal: Vector3<f32>) {
        let idx = self.index(x, y);
        let c = &mut self.color[idx];
        c[0] += color.x * opacity;
        c[1] += color.y * opacity;
        c[2] += color.z * opacity;
        c[3] += opacity;
        let n = &mut self.normal[idx];
        n[0] += normal.x * opacity;
        n[1] += normal.y * opacity;
        n[2] += normal.z * opacity;
    }

    /// Accumulated (color·opacity, opacity) at a pixel.
    #[inline]
    pub fn color_at(&self, x: u32, y: u32) -> [f32; 4] {
        self.color[self.index(x, y)]
    }

    /// Accumulated normal·opacity at a pixel.
    #[inline]
    pub fn normal_at(&self, x: u32, y: u32) -> [f32; 3] {
        self.normal[self.index(x, y)]
    }
}

/// A depth buffer cleared to +∞ each frame.
///
/// Depth values are NDC z after perspective divide (smaller = nearer with
/// a right-handed look-at and standard perspective projection).
#[derive(Clone, Debug)]
pub struct DepthTarget {
    width: u32,
    height: u32,
    depth: Vec<f32>,
}

impl DepthTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: vec![f32::INFINITY; (width as usize) * (height as usize)],
        }
    }

    pub fn clear(&mut self) {
        self.depth.fill(f32::INFINITY);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Pre-pass: keep the nearest depth (test Less, write on).
    #[inline]
    pub fn test_write(&mut self, x: u32, y: u32, depth: f32) {
        let idx = self.index(x, y);
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
        }
    }

    /// Accumulation gate: accept samples at or in front of the pre-pass
    /// depth (test LessEqual, write off).
    #[inline]
    pub fn test(&self, x: u32, y: u32, depth: f32) -> bool {
        depth <= self.depth[self.index(x, y)]
    }

    #[inline]
    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sample_is_additive() {
        let mut targets = AccumulationTargets::new(4, 4);
        let n = Vector3::new(0.0, 0.0, 1.0);
        targets.add_sample(1, 2, Vector3::new(1.0, 0.0, 0.0), 0.5, n);
        targets.add_sample(1, 2, Vector3::new(0.0, 1.0, 0.0), 0.25, n);

        let c = targets.color_at(1, 2);
        assert_eq!(c, [0.5, 0.25, 0.0, 0.75]);
        let nm = targets.normal_at(1, 2);
        assert_eq!(nm, [0.0, 0.0, 0.75]);

        targets.clear();
        assert_eq!(targets.color_at(1, 2), [0.0; 4]);
    }

    #[test]
    fn test_depth_pre_pass_keeps_nearest() {
        let mut depth = DepthTarget::new(2, 2);
        depth.test_write(0, 0, 0.8);
        depth.test_write(0, 0, 0.3);
        depth.test_write(0, 0, 0.5);
        assert_eq!(depth.depth_at(0, 0), 0.3);

        // LessEqual gate: equal passes, greater fails.
        assert!(depth.test(0, 0, 0.3));
        assert!(depth.test(0, 0, 0.1));
        assert!(!depth.test(0, 0, 0.300001));

        // Untouched pixels accept anything finite.
        assert!(depth.test(1, 1, 1e9));
    }
}
