//! WGSL shader modules.
//!
//! Two modules cover the three passes:
//! - `SPLAT_SHADER`: quad orientation/projection vertex stage plus two
//!   fragment entry points (depth-only pre-pass, dual-target accumulation)
//! - `RESOLVE_SHADER`: fullscreen resolve & lighting

use wgpu::{Device, ShaderModule};

/// Splat vertex/fragment shader shared by the pre-pass and accumulation
/// pipelines. The pre-pass pipeline uses `fs_prepass` (no color targets);
/// the accumulation pipeline uses `fs_accumulate` with additive blending
/// into the two accumulation targets.
pub const SPLAT_SHADER: &str = r#"
struct FrameUniforms {
    proj_view: mat4x4<f32>,
    eye_pos: vec4<f32>,
    eye_dir: vec4<f32>,
    radius_scale: f32,
    scaling: f32,
    depth_prepass: u32,
    _pad: u32,
}

@group(0) @binding(0) var<uniform> frame: FrameUniforms;

struct VertexIn {
    // Quad corner in [-1,1]^2; doubles as the footprint UV.
    @location(0) corner: vec2<f32>,
    // Per-instance splat attributes.
    @location(1) pos_radius: vec4<f32>,
    @location(2) normal: vec4<f32>,
    @location(3) color: vec4<f32>,
}

struct VertexOut {
    @builtin(position) clip_pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) normal: vec3<f32>,
    @location(2) @interpolate(flat) color: vec3<f32>,
}

// Rodrigues axis-angle rotation (columns).
fn rotation_matrix(a: vec3<f32>, angle: f32) -> mat3x3<f32> {
    let c = cos(angle);
    let sub_c = 1.0 - c;
    let s = sin(angle);
    return mat3x3<f32>(
        vec3<f32>(c + a.x * a.x * sub_c,
            a.y * a.x * sub_c + a.z * s,
            a.z * a.x * sub_c - a.y * s),
        vec3<f32>(a.x * a.y * sub_c - a.z * s,
            c + a.y * a.y * sub_c,
            a.z * a.y * sub_c + a.x * s),
        vec3<f32>(a.x * a.z * sub_c + a.y * s,
            a.y * a.z * sub_c - a.x * s,
            c + a.z * a.z * sub_c));
}

// Rotation mapping the canonical quad normal (0,0,1) onto n.
// The anti-parallel case has a zero cross product; fall back to a
// half-turn about +X.
fn align_to_normal(n: vec3<f32>) -> mat3x3<f32> {
    let quad_normal = vec3<f32>(0.0, 0.0, 1.0);
    let d = clamp(dot(quad_normal, n), -1.0, 1.0);
    if (d >= 1.0 - 1e-6) {
        return mat3x3<f32>(
            vec3<f32>(1.0, 0.0, 0.0),
            vec3<f32>(0.0, 1.0, 0.0),
            vec3<f32>(0.0, 0.0, 1.0));
    }
    if (d <= -1.0 + 1e-6) {
        return rotation_matrix(vec3<f32>(1.0, 0.0, 0.0), 3.14159265358979);
    }
    return rotation_matrix(normalize(cross(quad_normal, n)), acos(d));
}

@vertex
fn vs_main(in: VertexIn) -> VertexOut {
    let scaled_radius = in.pos_radius.w * frame.radius_scale * frame.scaling;
    let n = normalize(in.normal.xyz);
    let rot = align_to_normal(n);

    var world = rot * (vec3<f32>(in.corner, 0.0) * scaled_radius)
        + in.pos_radius.xyz * frame.scaling;
    if (frame.depth_prepass != 0u) {
        // Forward-shifted shell: half a radius away from the eye so the
        // shaded footprint is not culled by its own pre-pass depth.
        let view_dir = normalize(world - frame.eye_pos.xyz);
        world += view_dir * scaled_radius * 0.5;
    }

    var out: VertexOut;
    out.clip_pos = frame.proj_view * vec4<f32>(world, 1.0);
    out.uv = in.corner;
    out.normal = n;
    out.color = in.color.xyz;
    return out;
}

@fragment
fn fs_prepass(in: VertexOut) {
    // Depth only; the footprint circle still gates coverage.
    if (length(in.uv) > 1.0) {
        discard;
    }
}

struct AccumOut {
    @location(0) color: vec4<f32>,
    @location(1) normal: vec4<f32>,
}

@fragment
fn fs_accumulate(in: VertexOut) -> AccumOut {
    let len = length(in.uv);
    if (len > 1.0) {
        discard;
    }
    // Gaussian footprint: standard-normal peak, falloff factor 2.5.
    let opacity = 0.3989422804014327 * exp(-0.5 * pow(len * 2.5, 2.0));

    var out: AccumOut;
    out.color = vec4<f32>(in.color * opacity, opacity);
    out.normal = vec4<f32>(in.normal * opacity, 0.0);
    return out;
}
"#;

/// Fullscreen resolve & lighting shader.
pub const RESOLVE_SHADER: &str = r#"
struct ResolveUniforms {
    eye_dir: vec4<f32>,
}

@group(0) @binding(0) var splat_colors: texture_2d<f32>;
@group(0) @binding(1) var splat_normals: texture_2d<f32>;
@group(0) @binding(2) var<uniform> resolve: ResolveUniforms;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
    var pos = array<vec2<f32>, 4>(
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(1.0, -1.0));
    return vec4<f32>(pos[idx], 0.5, 1.0);
}

fn linear_to_srgb(x: f32) -> f32 {
    if (x <= 0.0031308) {
        return 12.92 * x;
    }
    return 1.055 * pow(x, 1.0 / 2.4) - 0.055;
}

@fragment
fn fs_resolve(@builtin(position) frag_pos: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = vec2<i32>(frag_pos.xy);
    let accum = textureLoad(splat_colors, uv, 0);
    let alpha = accum.a;

    var rgb = vec3<f32>(0.02);
    if (alpha != 0.0) {
        rgb = accum.rgb / alpha;
        let normal = normalize(textureLoad(splat_normals, uv, 0).xyz / alpha);

        let light_dir = normalize(vec3<f32>(0.5, 0.5, 1.0));
        let light_dir2 = normalize(vec3<f32>(-0.5, 0.25, -0.5));
        var intensity = 0.25;

        let ndotl = dot(light_dir, normal);
        if (ndotl > 0.0) {
            intensity += ndotl;
            let h = normalize(normalize(-resolve.eye_dir.xyz) + light_dir);
            let ndoth = dot(h, normal);
            if (ndoth > 0.0) {
                intensity += pow(ndoth, 40.0);
            }
        }
        let ndotl2 = dot(light_dir2, normal);
        if (ndotl2 > 0.0) {
            intensity += ndotl2 * 0.5;
        }
        rgb *= intensity;
    }

    return vec4<f32>(
        linear_to_srgb(rgb.r),
        linear_to_srgb(rgb.g),
        linear_to_srgb(rgb.b),
        1.0);
}
"#;

/// Create the splat shader module (pre-pass + accumulation entry points).
pub fn create_splat_shader(device: &Device) -> ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Splat Shader"),
        source: wgpu::ShaderSource::Wgsl(SPLAT_SHADER.into()),
    })
}

/// Create the resolve shader module.
pub fn create_resolve_shader(device: &Device) -> ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Resolve Shader"),
        source: wgpu::ShaderSource::Wgsl(RESOLVE_SHADER.into()),
    })
}
