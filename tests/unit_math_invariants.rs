//! Unit tests for core math invariants and small, deterministic examples.
//!
//! Each test checks a property the splatting pipeline relies on, with
//! simple numbers you can verify by hand.

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};
use surfel_rs::core::color::linear_to_srgb;
use surfel_rs::core::{align_to_normal, rotation_matrix, QUAD_NORMAL};
use surfel_rs::render::footprint::{footprint_opacity, AMPLITUDE, QUAD_CORNERS};

#[test]
fn test_canonical_normal_gives_identity_rotation() {
    let r = align_to_normal(&Vector3::new(0.0, 0.0, 1.0));
    assert_relative_eq!(r, Matrix3::identity(), epsilon = 1e-6);

    // With identity rotation, a splat quad's corners are just the base
    // corners scaled and translated.
    let radius = 0.5f32;
    let radius_scale = 2.0f32;
    let scaling = 3.0f32;
    let center = Vector3::new(1.0, -2.0, 0.5);
    let scaled_radius = radius * radius_scale * scaling;
    for corner in QUAD_CORNERS {
        let base = Vector3::new(corner[0], corner[1], 0.0);
        let world = r * (base * scaled_radius) + center * scaling;
        assert_relative_eq!(world, base * scaled_radius + center * scaling, epsilon = 1e-6);
    }
}

#[test]
fn test_antiparallel_normal_is_guarded() {
    // Regression test: the unguarded construction normalizes a zero-length
    // cross product for normal = (0,0,-1).
    let r = align_to_normal(&Vector3::new(0.0, 0.0, -1.0));
    assert!(
        r.iter().all(|v| v.is_finite()),
        "rotation for anti-parallel normal must not contain NaN"
    );
    let mapped = r * QUAD_NORMAL;
    assert_relative_eq!(mapped, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
}

#[test]
fn test_nearly_antiparallel_normals_stay_finite() {
    for eps in [1e-8f32, 1e-7, 1e-6, 1e-4] {
        let n = Vector3::new(eps, 0.0, -1.0).normalize();
        let r = align_to_normal(&n);
        assert!(r.iter().all(|v| v.is_finite()), "NaN at eps = {}", eps);
        let mapped = r * QUAD_NORMAL;
        assert_relative_eq!(mapped.z, n.z, epsilon = 1e-3);
    }
}

#[test]
fn test_rodrigues_rotation_preserves_lengths() {
    let axis = Vector3::new(0.2, -0.5, 0.8).normalize();
    let r = rotation_matrix(&axis, 0.73);
    let v = Vector3::new(1.0, 2.0, 3.0);
    assert_relative_eq!((r * v).norm(), v.norm(), epsilon = 1e-5);
    assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-5);
}

#[test]
fn test_footprint_peak_value() {
    // opacity(len=0) = 1/sqrt(2*pi) ≈ 0.39894
    let o = footprint_opacity(0.0).expect("center is inside the footprint");
    assert_relative_eq!(o, 0.39894, epsilon = 1e-5);
    assert_relative_eq!(o, AMPLITUDE, epsilon = 1e-7);
}

#[test]
fn test_footprint_edge_value() {
    // opacity(len=1) = 0.39894 * exp(-3.125) ≈ 0.01756
    let o = footprint_opacity(1.0).expect("unit circle edge is inside");
    assert_relative_eq!(o, 0.01756, epsilon = 1e-5);
}

#[test]
fn test_footprint_outside_circle_contributes_nothing() {
    assert!(footprint_opacity(1.0001).is_none());
    assert!(footprint_opacity(std::f32::consts::SQRT_2).is_none()); // quad corner
}

#[test]
fn test_gamma_encode_endpoints_and_monotonicity() {
    assert_eq!(linear_to_srgb(0.0), 0.0);
    assert_relative_eq!(linear_to_srgb(1.0), 1.0, epsilon = 1e-6);

    let mut prev = 0.0f32;
    for i in 1..=256 {
        let x = i as f32 / 256.0;
        let cur = linear_to_srgb(x);
        assert!(cur > prev);
        prev = cur;
    }
}

#[test]
fn test_gamma_encode_continuous_at_threshold() {
    let t = 0.0031308f32;
    let below = linear_to_srgb(t - 1e-7);
    let above = linear_to_srgb(t + 1e-7);
    assert!((above - below).abs() < 1e-4);
}
