//! Resolve & lighting pass.
//!
//! Converts the accumulation targets into the displayed image:
//! - zero accumulated opacity ⇒ flat background, no lighting
//! - otherwise un-premultiply, reconstruct the shading normal from the
//!   weighted-normal sum, apply the fixed two-light model, sRGB-encode
//!
//! The reconstructed normal is an opacity-weighted average of contributing
//! splat normals. That is an intentional approximation - overlapping
//! surfaces with opposing normals blur into each other - but it is what
//! makes order-insensitive accumulation possible.

use crate::core::color::linear_f32_to_srgb_u8;
use crate::render::targets::AccumulationTargets;
use image::{Rgb, RgbImage};
use nalgebra::Vector3;

/// Flat background (linear) where nothing accumulated.
pub const BACKGROUND: f32 = 0.02;

/// Ambient base intensity.
const AMBIENT: f32 = 0.25;

/// Key light direction (normalized in `key_light`).
const KEY_LIGHT: [f32; 3] = [0.5, 0.5, 1.0];

/// Fill light direction, weighted at half the key's diffuse.
const FILL_LIGHT: [f32; 3] = [-0.5, 0.25, -0.5];

/// Specular exponent for the key light.
const SPECULAR_EXPONENT: i32 = 40;

fn key_light() -> Vector3<f32> {
    Vector3::from(KEY_LIGHT).normalize()
}

fn fill_light() -> Vector3<f32> {
    Vector3::from(FILL_LIGHT).normalize()
}

/// Resolve a single pixel to a lit linear color.
///
/// `color` is the accumulated (color·opacity, opacity), `normal` the
/// accumulated normal·opacity, `eye_dir` the unit view direction of the
/// eye. Gamma encoding happens at image write time, not here.
pub fn resolve_pixel(color: [f32; 4], normal: [f32; 3], eye_dir: &Vector3<f32>) -> Vector3<f32> {
    let alpha = color[3];
    if alpha == 0.0 {
        return Vector3::new(BACKGROUND, BACKGROUND, BACKGROUND);
    }

    // Un-premultiply; the weighted normal is divided by alpha too before
    // normalization, matching the accumulation convention.
    let mut rgb = Vector3::new(color[0], color[1], color[2]) / alpha;
    let n = (Vector3::from(normal) / alpha).normalize();

    let mut intensity = AMBIENT;

    let key = key_light();
    let n_dot_key = key.dot(&n);
    if n_dot_key > 0.0 {
        intensity += n_dot_key;
        // Blinn-Phong specular against the inverted eye direction.
        let h = ((-eye_dir).normalize() + key).normalize();
        let n_dot_h = h.dot(&n);
        if n_dot_h > 0.0 {
            intensity += n_dot_h.powi(SPECULAR_EXPONENT);
        }
    }

    let fill = fill_light();
    let n_dot_fill = fill.dot(&n);
    if n_dot_fill > 0.0 {
        intensity += n_dot_fill * 0.5;
    }

    rgb *= intensity;
    rgb
}

/// Full-screen resolve: accumulation targets in, display image out.
///
/// Output alpha is conceptually 1 everywhere; the image is plain RGB.
pub fn resolve(targets: &AccumulationTargets, eye_dir: &Vector3<f32>) -> RgbImage {
    let mut img = RgbImage::new(targets.width(), targets.height());
    for y in 0..targets.height() {
        for x in 0..targets.width() {
            let lit = resolve_pixel(targets.color_at(x, y), targets.normal_at(x, y), eye_dir);
            img.put_pixel(
                x,
                y,
                Rgb([
                    linear_f32_to_srgb_u8(lit.x),
                    linear_f32_to_srgb_u8(lit.y),
                    linear_f32_to_srgb_u8(lit.z),
                ]),
            );
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_alpha_yields_background() {
        let eye_dir = Vector3::new(0.0, 0.0, -1.0);
        let rgb = resolve_pixel([0.0; 4], [0.0; 3], &eye_dir);
        assert_eq!(rgb, Vector3::new(0.02, 0.02, 0.02));
    }

    #[test]
    fn test_unpremultiply_is_weighted_average() {
        // Two splats, alpha 0.3 red and 0.1 blue, accumulated at a pixel.
        // Un-premultiplied color must be the opacity-weighted average.
        let a1 = 0.3f32;
        let a2 = 0.1f32;
        let color = [a1 * 1.0, 0.0, a2 * 1.0, a1 + a2];
        // Normal facing the fill light only, so intensity is easy to check.
        let normal = [0.0, 0.0, -(a1 + a2)];
        let eye_dir = Vector3::new(0.0, 0.0, -1.0);

        let rgb = resolve_pixel(color, normal, &eye_dir);

        // Key light dot is negative for n = (0,0,-1); fill contributes
        // 0.5 * dot(normalize(-0.5,0.25,-0.5), (0,0,-1)).
        let fill_dot = Vector3::new(-0.5, 0.25, -0.5).normalize().z * -1.0;
        let intensity = 0.25 + 0.5 * fill_dot;

        assert_relative_eq!(rgb.x, (a1 / (a1 + a2)) * intensity, epsilon = 1e-5);
        assert_relative_eq!(rgb.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rgb.z, (a2 / (a1 + a2)) * intensity, epsilon = 1e-5);
    }

    #[test]
    fn test_key_light_adds_diffuse_and_specular() {
        // Normal straight at the key light: diffuse = 1, and the half
        // vector math must stay finite.
        let key = Vector3::new(0.5, 0.5, 1.0).normalize();
        let eye_dir = Vector3::new(0.0, 0.0, -1.0);
        let rgb = resolve_pixel(
            [0.5, 0.5, 0.5, 0.5],
            [key.x * 0.5, key.y * 0.5, key.z * 0.5],
            &eye_dir,
        );
        // intensity >= ambient + full diffuse
        assert!(rgb.x >= 1.25 - 1e-5);
        assert!(rgb.x.is_finite());
    }

    #[test]
    fn test_resolve_image_background() {
        let targets = AccumulationTargets::new(3, 2);
        let img = resolve(&targets, &Vector3::new(0.0, 0.0, -1.0));
        let expected = linear_f32_to_srgb_u8(BACKGROUND);
        for p in img.pixels() {
            assert_eq!(p.0, [expected, expected, expected]);
        }
    }
}
