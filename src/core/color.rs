//! Color space conversion utilities
//!
//! Single source of truth for all sRGB↔linear conversions. Uses the
//! official sRGB transfer function (not a gamma 2.2 approximation).
//!
//! All accumulation and lighting happens in **linear RGB**. The resolve
//! pass converts to sRGB as the very last step before display.
//!
//! **Linear to sRGB**:
//! - if linear <= 0.0031308: sRGB = 12.92 * linear
//! - if linear > 0.0031308: sRGB = 1.055 * linear ^ (1/2.4) - 0.055
//!
//! **sRGB to Linear**:
//! - if sRGB <= 0.04045: linear = sRGB / 12.92
//! - if sRGB > 0.04045: linear = ((sRGB + 0.055) / 1.055) ^ 2.4

/// Convert a linear f32 channel to sRGB f32 (both nominally 0.0-1.0).
///
/// This is the gamma encode applied per channel by the resolve pass.
/// Input is not clamped; out-of-range lit colors encode monotonically.
pub fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.0031308 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert an sRGB f32 channel to linear f32.
pub fn srgb_to_linear(cs: f32) -> f32 {
    if cs <= 0.04045 {
        cs / 12.92
    } else {
        ((cs + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert sRGB u8 (0-255) to linear f32 (0.0-1.0).
///
/// Used when loading 8-bit splat colors from disk.
pub fn srgb_u8_to_linear_f32(u: u8) -> f32 {
    srgb_to_linear((u as f32) / 255.0)
}

/// Convert linear f32 (0.0-1.0) to sRGB u8 (0-255).
///
/// Used when quantizing resolved pixels into the output image.
pub fn linear_f32_to_srgb_u8(x: f32) -> u8 {
    let cs = linear_to_srgb(x.clamp(0.0, 1.0));
    (cs * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(linear_f32_to_srgb_u8(0.0), 0);
        assert_eq!(linear_f32_to_srgb_u8(1.0), 255);
    }

    #[test]
    fn test_continuous_at_breakpoint() {
        let below = linear_to_srgb(0.0031308 - 1e-7);
        let above = linear_to_srgb(0.0031308 + 1e-7);
        assert!((above - below).abs() < 1e-4);
    }

    #[test]
    fn test_monotonically_increasing() {
        let mut prev = linear_to_srgb(0.0);
        for i in 1..=1000 {
            let x = i as f32 / 1000.0;
            let cur = linear_to_srgb(x);
            assert!(cur > prev, "not monotone at {}", x);
            prev = cur;
        }
    }

    #[test]
    fn test_u8_roundtrip() {
        for val in [0u8, 32, 64, 128, 192, 255] {
            let linear = srgb_u8_to_linear_f32(val);
            let back = linear_f32_to_srgb_u8(linear);
            assert_eq!(back, val, "Roundtrip failed for {}", val);
        }
    }

    #[test]
    fn test_not_simple_gamma_2_2() {
        // sRGB has a linear segment at low values; make sure we are not
        // silently using x^(1/2.2).
        let linear = srgb_u8_to_linear_f32(128);
        let gamma_2_2 = (128.0f32 / 255.0).powf(2.2);
        assert!((linear - gamma_2_2).abs() > 0.001);
    }
}
