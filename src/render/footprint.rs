//! The circular Gaussian footprint kernel.
//!
//! A splat quad carries UV coordinates spanning [-1,1]²; the footprint is
//! the circle inscribed in that quad. What a GPU fragment shader would
//! express as `discard` is a pure function here: samples outside the circle
//! return `None`, samples inside return the Gaussian opacity.

/// Peak opacity: the standard-normal amplitude 1/√(2π).
pub const AMPLITUDE: f32 = 0.398_942_28;

/// Falloff steepness. At 2.5 the kernel has decayed to ~4.4% of its peak
/// at the unit-circle edge, so the cutoff there is visually seamless.
pub const FALLOFF: f32 = 2.5;

/// Quad corner positions (XY) and, equivalently, their UV coordinates.
/// Wound counter-clockwise; triangulated as (0,1,2) and (0,2,3).
pub const QUAD_CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// Evaluate the footprint at distance `len = |uv|` from the splat center.
///
/// Returns `None` outside the unit circle (no contribution to any target,
/// depth included), otherwise the Gaussian opacity
///
/// opacity = 1/√(2π) · exp(-(2.5·len)² / 2)
pub fn footprint_opacity(len: f32) -> Option<f32> {
    if len > 1.0 {
        return None;
    }
    let x = FALLOFF * len;
    Some(AMPLITUDE * (-0.5 * x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_peak_opacity_at_center() {
        // 1/sqrt(2*pi) ≈ 0.39894
        let o = footprint_opacity(0.0).unwrap();
        assert_relative_eq!(o, 0.39894, epsilon = 1e-5);
    }

    #[test]
    fn test_opacity_at_unit_circle_edge() {
        // 0.39894 * exp(-3.125) ≈ 0.01756
        let o = footprint_opacity(1.0).unwrap();
        assert_relative_eq!(o, 0.01756, epsilon = 1e-5);
    }

    #[test]
    fn test_no_contribution_outside_circle() {
        assert!(footprint_opacity(1.0 + 1e-6).is_none());
        assert!(footprint_opacity(1.5).is_none());
        assert!(footprint_opacity(f32::INFINITY).is_none());
    }

    #[test]
    fn test_monotone_decreasing_inside() {
        let mut prev = footprint_opacity(0.0).unwrap();
        for i in 1..=100 {
            let len = i as f32 / 100.0;
            let cur = footprint_opacity(len).unwrap();
            assert!(cur < prev);
            prev = cur;
        }
    }
}
