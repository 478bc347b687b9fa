//! Renderer edge case tests
//!
//! Tests for edge cases in the splatting pipeline, particularly:
//! - NaN/Inf handling in splat parameters
//! - Empty splat lists
//! - Splats behind the camera
//! - Very small images

use nalgebra::Vector3;
use surfel_rs::core::color::linear_f32_to_srgb_u8;
use surfel_rs::core::{Camera, Splat};
use surfel_rs::render::resolve::BACKGROUND;
use surfel_rs::render::SplatPipeline;

fn test_frame(width: u32, height: u32) -> surfel_rs::core::FrameParams {
    Camera::look_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros())
        .frame_params(width, height, 1.0, 1.0)
}

fn valid_splat(position: Vector3<f32>) -> Splat {
    Splat::new(
        position,
        0.5,
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.5, 0.5, 0.5),
    )
}

fn background_pixel() -> [u8; 3] {
    let v = linear_f32_to_srgb_u8(BACKGROUND);
    [v, v, v]
}

#[test]
fn test_empty_splat_list_renders_background() {
    let mut pipeline = SplatPipeline::new(50, 50);
    let img = pipeline.render(&[], &test_frame(50, 50));
    assert_eq!(img.dimensions(), (50, 50));
    for p in img.pixels() {
        assert_eq!(p.0, background_pixel());
    }
}

#[test]
fn test_nan_position_splat_is_filtered() {
    let mut splat = valid_splat(Vector3::zeros());
    splat.position.x = f32::NAN;

    // Should not panic, and the bad splat must not contribute.
    let mut pipeline = SplatPipeline::new(50, 50);
    let img = pipeline.render(&[splat], &test_frame(50, 50));
    for p in img.pixels() {
        assert_eq!(p.0, background_pixel());
    }
}

#[test]
fn test_inf_position_splat_is_filtered() {
    let mut splat = valid_splat(Vector3::zeros());
    splat.position.z = f32::INFINITY;

    let mut pipeline = SplatPipeline::new(50, 50);
    let img = pipeline.render(&[splat], &test_frame(50, 50));
    for p in img.pixels() {
        assert_eq!(p.0, background_pixel());
    }
}

#[test]
fn test_non_positive_radius_splat_is_filtered() {
    let mut zero = valid_splat(Vector3::zeros());
    zero.radius = 0.0;
    let mut negative = valid_splat(Vector3::zeros());
    negative.radius = -0.25;

    let mut pipeline = SplatPipeline::new(50, 50);
    let img = pipeline.render(&[zero, negative], &test_frame(50, 50));
    for p in img.pixels() {
        assert_eq!(p.0, background_pixel());
    }
}

#[test]
fn test_splat_behind_camera_is_culled() {
    // Eye is at z = 5 looking toward the origin; z = 10 is behind it.
    let splat = valid_splat(Vector3::new(0.0, 0.0, 10.0));

    let mut pipeline = SplatPipeline::new(50, 50);
    let img = pipeline.render(&[splat], &test_frame(50, 50));
    for p in img.pixels() {
        assert_eq!(p.0, background_pixel());
    }
}

#[test]
fn test_one_by_one_image() {
    let splat = valid_splat(Vector3::zeros());
    let mut pipeline = SplatPipeline::new(1, 1);
    let img = pipeline.render(&[splat], &test_frame(1, 1));
    assert_eq!(img.dimensions(), (1, 1));
    // The centered splat covers the single pixel.
    assert_ne!(img.get_pixel(0, 0).0, background_pixel());
}

#[test]
fn test_away_facing_splat_still_renders() {
    // Normal pointing away from the eye: the anti-parallel alignment
    // fallback runs and the footprint still accumulates (back faces are
    // not culled).
    let mut splat = valid_splat(Vector3::zeros());
    splat.normal = Vector3::new(0.0, 0.0, -1.0);

    let mut pipeline = SplatPipeline::new(51, 51);
    let img = pipeline.render(&[splat], &test_frame(51, 51));
    assert_ne!(img.get_pixel(25, 25).0, background_pixel());
    let alpha = pipeline.targets().color_at(25, 25)[3];
    assert!(alpha > 0.0 && alpha.is_finite());
}

#[test]
fn test_mixed_good_and_bad_splats() {
    let good = valid_splat(Vector3::zeros());
    let mut bad = valid_splat(Vector3::zeros());
    bad.normal = Vector3::new(f32::NAN, 0.0, 0.0);

    let mut pipeline = SplatPipeline::new(51, 51);
    let img = pipeline.render(&[bad, good], &test_frame(51, 51));
    // The good splat still renders.
    assert_ne!(img.get_pixel(25, 25).0, background_pixel());
}
