//! The splatting pipeline: orientation/projection, rasterization, and the
//! three-pass frame sequence.
//!
//! Each splat becomes a quad oriented to its normal, scaled by
//! `radius · radius_scale · scaling`, and positioned at
//! `center · scaling`. The quad is projected by the combined
//! projection-view transform and rasterized twice:
//!
//! 1. Depth pre-pass: the quad is extruded along the per-splat view
//!    direction by half the scaled radius before projection, producing a
//!    shell slightly behind the shaded footprint. Footprint samples write
//!    depth only.
//! 2. Accumulation: footprint samples at or in front of the pre-pass depth
//!    add premultiplied color+opacity and weighted normal into the
//!    accumulation targets.
//!
//! The resolve pass then turns the targets into the display image. The
//! passes are plain sequential method calls; each completes before the
//! next reads its output, which is the entire inter-pass ordering contract.

use crate::core::{align_to_normal, FrameParams, Splat};
use crate::render::footprint::{footprint_opacity, QUAD_CORNERS};
use crate::render::resolve;
use crate::render::targets::{AccumulationTargets, DepthTarget};
use image::RgbImage;
use nalgebra::{Vector2, Vector3};

/// Clip-space w below which a quad corner counts as behind the near plane.
/// A splat with any such corner is culled for the frame rather than
/// partially clipped.
const MIN_CLIP_W: f32 = 1e-6;

/// Twice-the-area threshold below which a screen triangle is edge-on and
/// skipped.
const MIN_TRIANGLE_AREA: f32 = 1e-12;

/// Which pass a quad is being projected for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassMode {
    DepthPrepass,
    Shading,
}

/// A quad corner after projection to the viewport.
#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    /// Pixel coordinates (x right, y down)
    x: f32,
    y: f32,
    /// NDC depth after perspective divide
    depth: f32,
    /// 1/w, interpolated for perspective-correct UV
    inv_w: f32,
    /// UV pre-divided by w
    uv_over_w: Vector2<f32>,
}

/// CPU splatting pipeline.
///
/// Owns the render targets (the "host" responsibility of allocating and
/// resizing them); the per-frame state is cleared at the top of `render`,
/// so frames never carry state over.
pub struct SplatPipeline {
    targets: AccumulationTargets,
    depth: DepthTarget,
}

impl SplatPipeline {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            targets: AccumulationTargets::new(width, height),
            depth: DepthTarget::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.targets.width()
    }

    pub fn height(&self) -> u32 {
        self.targets.height()
    }

    /// Reallocate the targets for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.targets = AccumulationTargets::new(width, height);
        self.depth = DepthTarget::new(width, height);
    }

    /// Render one frame: pre-pass, accumulation, resolve.
    pub fn render(&mut self, splats: &[Splat], frame: &FrameParams) -> RgbImage {
        self.targets.clear();
        self.depth.clear();

        // Filter out non-finite splats so one bad record cannot produce
        // NaN depths or poison the accumulation sums.
        let visible: Vec<&Splat> = splats.iter().filter(|s| s.is_finite()).collect();
        let filtered = splats.len() - visible.len();
        if filtered > 0 {
            eprintln!(
                "[surfel-rs] filtered {} splats with non-finite or non-positive parameters",
                filtered
            );
        }

        self.depth_prepass(&visible, frame);
        self.accumulate(&visible, frame);
        resolve::resolve(&self.targets, &frame.eye_dir)
    }

    /// The accumulation targets after the last `render` call.
    pub fn targets(&self) -> &AccumulationTargets {
        &self.targets
    }

    /// The pre-pass depth target after the last `render` call.
    pub fn depth_target(&self) -> &DepthTarget {
        &self.depth
    }

    fn depth_prepass(&mut self, splats: &[&Splat], frame: &FrameParams) {
        let (w, h) = (self.width(), self.height());
        for splat in splats {
            let Some(quad) = project_quad(splat, frame, PassMode::DepthPrepass, w, h) else {
                continue;
            };
            let depth = &mut self.depth;
            rasterize_quad(&quad, w, h, |x, y, d, uv| {
                // The footprint cutoff applies to the pre-pass as well:
                // outside the circle there is no contribution, depth included.
                if footprint_opacity(uv.norm()).is_some() {
                    depth.test_write(x, y, d);
                }
            });
        }
    }

    fn accumulate(&mut self, splats: &[&Splat], frame: &FrameParams) {
        let (w, h) = (self.width(), self.height());
        for splat in splats {
            let Some(quad) = project_quad(splat, frame, PassMode::Shading, w, h) else {
                continue;
            };
            // Normal and color are flat (per-splat), only UV interpolates.
            let normal = splat.normal.normalize();
            let color = splat.color;
            let depth = &self.depth;
            let targets = &mut self.targets;
            rasterize_quad(&quad, w, h, |x, y, d, uv| {
                if !depth.test(x, y, d) {
                    return;
                }
                if let Some(opacity) = footprint_opacity(uv.norm()) {
                    targets.add_sample(x, y, color, opacity, normal);
                }
            });
        }
    }
}

/// Orient, scale, extrude (pre-pass only) and project a splat quad.
///
/// Returns `None` when the splat is culled: any corner behind the near
/// plane, or a degenerate scaled radius.
fn project_quad(
    splat: &Splat,
    frame: &FrameParams,
    mode: PassMode,
    width: u32,
    height: u32,
) -> Option<[ScreenVertex; 4]> {
    let scaled_radius = splat.radius * frame.radius_scale * frame.scaling;
    if !(scaled_radius > 0.0) || !scaled_radius.is_finite() {
        return None;
    }

    let rot = align_to_normal(&splat.normal);
    let center = splat.position * frame.scaling;

    let mut out = [ScreenVertex {
        x: 0.0,
        y: 0.0,
        depth: 0.0,
        inv_w: 0.0,
        uv_over_w: Vector2::zeros(),
    }; 4];

    for (i, corner) in QUAD_CORNERS.iter().enumerate() {
        let local = Vector3::new(corner[0], corner[1], 0.0) * scaled_radius;
        let mut world = rot * local + center;

        if mode == PassMode::DepthPrepass {
            // Push the pre-pass shell half a radius away from the eye so
            // the shaded footprint at the splat plane passes its own gate.
            let view_dir = (world - frame.eye_pos).normalize();
            world += view_dir * scaled_radius * 0.5;
        }

        let clip = frame.proj_view * world.push(1.0);
        if clip.w <= MIN_CLIP_W {
            return None;
        }
        let inv_w = 1.0 / clip.w;
        let ndc_x = clip.x * inv_w;
        let ndc_y = clip.y * inv_w;
        let ndc_z = clip.z * inv_w;

        out[i] = ScreenVertex {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth: ndc_z,
            inv_w,
            uv_over_w: Vector2::new(corner[0], corner[1]) * inv_w,
        };
    }

    Some(out)
}

/// Signed edge function: twice the area of triangle (a, b, p).
#[inline]
fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Rasterize a projected quad, invoking `sample(x, y, depth, uv)` exactly
/// once per covered pixel.
///
/// The quad is split along the v0-v2 diagonal; coverage is decided with
/// the four quad edges and the diagonal only selects which triangle
/// interpolates, so pixels on the diagonal are not visited twice. UV is
/// perspective-correct (interpolates uv/w and 1/w); depth interpolates
/// linearly in screen space, as a rasterization unit would.
fn rasterize_quad<F>(quad: &[ScreenVertex; 4], width: u32, height: u32, mut sample: F)
where
    F: FnMut(u32, u32, f32, Vector2<f32>),
{
    let [v0, v1, v2, v3] = quad;

    // Orientation of the projected quad (it may flip when the splat faces
    // away from the eye; back faces still render, as in the original).
    let quad_area = edge(v0, v1, v2.x, v2.y) + edge(v0, v2, v3.x, v3.y);
    let sign = if quad_area >= 0.0 { 1.0 } else { -1.0 };

    let min_x = v0.x.min(v1.x).min(v2.x).min(v3.x);
    let max_x = v0.x.max(v1.x).max(v2.x).max(v3.x);
    let min_y = v0.y.min(v1.y).min(v2.y).min(v3.y);
    let max_y = v0.y.max(v1.y).max(v2.y).max(v3.y);
    if max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32 {
        return;
    }

    let x_start = min_x.floor().max(0.0) as u32;
    let x_end = (max_x.ceil() as i64).min(width as i64 - 1) as u32;
    let y_start = min_y.floor().max(0.0) as u32;
    let y_end = (max_y.ceil() as i64).min(height as i64 - 1) as u32;

    for py in y_start..=y_end {
        let sy = py as f32 + 0.5;
        for px in x_start..=x_end {
            let sx = px as f32 + 0.5;

            // Convex coverage test against all four quad edges.
            if sign * edge(v0, v1, sx, sy) < 0.0
                || sign * edge(v1, v2, sx, sy) < 0.0
                || sign * edge(v2, v3, sx, sy) < 0.0
                || sign * edge(v3, v0, sx, sy) < 0.0
            {
                continue;
            }

            // Diagonal picks the interpolation triangle; the on-diagonal
            // case goes to (v0, v1, v2).
            let (a, b, c) = if sign * edge(v0, v2, sx, sy) <= 0.0 {
                (v0, v1, v2)
            } else {
                (v0, v2, v3)
            };

            let area = edge(a, b, c.x, c.y);
            if area.abs() < MIN_TRIANGLE_AREA {
                continue;
            }
            let inv_area = 1.0 / area;
            let b0 = edge(b, c, sx, sy) * inv_area;
            let b1 = edge(c, a, sx, sy) * inv_area;
            let b2 = edge(a, b, sx, sy) * inv_area;

            let inv_w = b0 * a.inv_w + b1 * b.inv_w + b2 * c.inv_w;
            if inv_w <= 0.0 {
                continue;
            }
            let uv = (b0 * a.uv_over_w + b1 * b.uv_over_w + b2 * c.uv_over_w) / inv_w;
            let depth = b0 * a.depth + b1 * b.depth + b2 * c.depth;

            sample(px, py, depth, uv);
        }
    }
}
