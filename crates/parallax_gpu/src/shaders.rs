//! WGSL programs of the three layers
//!
//! Every layer program is the shared prelude followed by a per-role body.
//! All three bind the same group layout:
//!
//! | binding | resource                                  |
//! |---------|-------------------------------------------|
//! | 0       | `LayerUniforms`                           |
//! | 1       | sampler                                   |
//! | 2       | color                                     |
//! | 3       | own depth                                 |
//! | 4       | depth of the next layer drawn after       |
//! | 5       | depth of the layer after that             |
//! | 6       | alpha mask                                |
//!
//! Slots a role does not use are bound to a white placeholder.

use crate::error::{RendererError, Result};
use parallax_core::LayerRole;

/// Declarations shared by every layer program
pub const COMMON: &str = r#"
// ============================================================================
// Parallax layer prelude
// ============================================================================

struct LayerUniforms {
    mvp: mat4x4<f32>,
    world: mat4x4<f32>,
    view_dir: mat4x4<f32>,
    sphere_center: vec4<f32>,
    eye_position: vec4<f32>,
    head_position: vec4<f32>,
    tint: vec4<f32>,
    // x: desaturation, y: tint enabled, z: epsilon, w: depth scale
    params: vec4<f32>,
    // x: offset, y: steepness, z: midpoint
    curve: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u: LayerUniforms;
@group(0) @binding(1) var layer_sampler: sampler;
@group(0) @binding(2) var color_tex: texture_2d<f32>;
@group(0) @binding(3) var depth_own: texture_2d<f32>;
@group(0) @binding(4) var depth_next: texture_2d<f32>;
@group(0) @binding(5) var depth_last: texture_2d<f32>;
@group(0) @binding(6) var alpha_tex: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

// Vertex stage has no derivatives: always sample level 0
fn sample_depth(tex: texture_2d<f32>, uv: vec2<f32>) -> f32 {
    return textureSampleLevel(tex, layer_sampler, uv, 0.0).r;
}

// Jump encoding
fn jump(d: f32) -> f32 {
    return u.params.w / (d + u.params.z);
}

fn desaturate(rgb: vec3<f32>) -> vec3<f32> {
    let gray = vec3<f32>(dot(vec3<f32>(0.2126, 0.7152, 0.0722), rgb));
    return mix(rgb, gray, vec3<f32>(u.params.x));
}

fn apply_tint(rgb: vec3<f32>) -> vec3<f32> {
    if (u.params.y == 0.0) {
        return rgb;
    }
    return mix(rgb, u.tint.rgb, vec3<f32>(0.5));
}
"#;

/// Inpainted background: nearest of all three depth maps, opaque
pub const BACKGROUND_BODY: &str = r#"
struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let d = min(
        min(sample_depth(depth_own, in.uv), sample_depth(depth_next, in.uv)),
        sample_depth(depth_last, in.uv),
    );
    let warped = vec4<f32>(in.position * jump(d), 1.0);

    var out: VertexOutput;
    out.clip = u.mvp * warped;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let rgb = textureSample(color_tex, layer_sampler, in.uv).rgb;
    return vec4<f32>(apply_tint(desaturate(rgb)), 1.0);
}
"#;

/// Extrapolated midground: nearest of its own and the video depth,
/// half-strength desaturation, alpha from its mask
pub const MIDGROUND_BODY: &str = r#"
struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let d = min(sample_depth(depth_own, in.uv), sample_depth(depth_next, in.uv));
    let warped = vec4<f32>(in.position * jump(d), 1.0);

    var out: VertexOutput;
    out.clip = u.mvp * warped;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let rgb = textureSample(color_tex, layer_sampler, in.uv).rgb;
    let mask = textureSample(alpha_tex, layer_sampler, in.uv).r;
    let desaturated = mix(rgb, desaturate(rgb), vec3<f32>(0.5));
    return vec4<f32>(apply_tint(desaturated), mask);
}
"#;

/// Video foreground: own depth only, alpha faded toward opaque near the
/// sphere center
pub const FOREGROUND_BODY: &str = r#"
struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) world_pos: vec3<f32>,
    @location(2) view_dir: vec3<f32>,
    @location(3) curr_view_dir: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let d = sample_depth(depth_own, in.uv);
    let warped = vec4<f32>(in.position * jump(d), 1.0);
    let world_pos = (u.world * warped).xyz;

    var out: VertexOutput;
    out.clip = u.mvp * warped;
    out.uv = in.uv;
    out.world_pos = world_pos;
    out.view_dir = normalize(u.sphere_center.xyz - world_pos);
    out.curr_view_dir = normalize(u.eye_position.xyz - world_pos);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // x is not part of the distance and z counts twice
    let dy = u.head_position.y - u.sphere_center.y;
    let dz = u.head_position.z - u.sphere_center.z;
    let dist = u.curve.x + sqrt(dy * dy + dz * dz + dz * dz);
    let s = 1.0 / (1.0 + exp(-u.curve.y * (dist - u.curve.z)));

    let rgb = textureSample(color_tex, layer_sampler, in.uv).rgb;
    let raw = textureSample(alpha_tex, layer_sampler, in.uv).r;
    let alpha = abs((1.0 - s) * 1.0 + raw * s);
    return vec4<f32>(apply_tint(desaturate(rgb)), alpha);
}
"#;

/// Complete WGSL source of a layer program
pub fn source(role: LayerRole) -> String {
    let body = match role {
        LayerRole::Background => BACKGROUND_BODY,
        LayerRole::Midground => MIDGROUND_BODY,
        LayerRole::Foreground => FOREGROUND_BODY,
    };
    format!("{}\n{}", COMMON, body)
}

/// Parse and validate a layer program without a device
pub fn validate(role: LayerRole) -> Result<naga::Module> {
    let label = format!("{}_layer", role.name());
    let wgsl = source(role);

    let module = naga::front::wgsl::parse_str(&wgsl).map_err(|e| RendererError::Shader {
        label: label.clone(),
        message: e.emit_to_string(&wgsl),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| RendererError::Shader {
        label: label.clone(),
        message: e.emit_to_string(&wgsl),
    })?;

    tracing::debug!("{} program validated", label);
    Ok(module)
}
