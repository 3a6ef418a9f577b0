//! WGSL sources for the two filter programs.
//!
//! Both share the same fullscreen-triangle vertex stage and write their
//! output bottom-up (the framebuffer keeps its bottom-left origin);
//! `readback::correct_origin` restores raster order after readback.

/// Sharpen: per-channel 3x3 convolution, center 5, four orthogonal
/// neighbors -1. Out-of-bounds taps clamp to the edge texel; the result
/// clamps to [0, 1].
pub const SHARPEN: &str = r#"
struct Params {
    width: u32,
    height: u32,
}

@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var<uniform> params: Params;

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
    // Fullscreen triangle: (-1,-1), (3,-1), (-1,3).
    let x = f32(i32(idx & 1u) * 4 - 1);
    let y = f32(i32(idx >> 1u) * 4 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

fn load(p: vec2<i32>) -> vec4<f32> {
    let w = i32(params.width);
    let h = i32(params.height);
    let c = vec2<i32>(clamp(p.x, 0, w - 1), clamp(p.y, 0, h - 1));
    return textureLoad(src_tex, c, 0);
}

@fragment
fn fs_main(@builtin(position) pos: vec4<f32>) -> @location(0) vec4<f32> {
    let h = i32(params.height);
    // Bottom-up write: framebuffer row y holds image row h-1-y.
    let p = vec2<i32>(i32(pos.x), h - 1 - i32(pos.y));

    let center = load(p).rgb;
    let up = load(p + vec2<i32>(0, -1)).rgb;
    let down = load(p + vec2<i32>(0, 1)).rgb;
    let left = load(p + vec2<i32>(-1, 0)).rgb;
    let right = load(p + vec2<i32>(1, 0)).rgb;

    let rgb = clamp(5.0 * center - up - down - left - right, vec3<f32>(0.0), vec3<f32>(1.0));
    return vec4<f32>(rgb, 1.0);
}
"#;

/// Adaptive local contrast stretch: normalizes uneven scan lighting
/// before thresholding. The local mean comes from a sparse 5x5 (stride 2)
/// luminance sample; pixels darker than the mean are pushed down, the
/// rest are lifted. Output is achromatic.
pub const ADAPTIVE_STRETCH: &str = r#"
struct Params {
    width: u32,
    height: u32,
}

@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var<uniform> params: Params;

const LUMA: vec3<f32> = vec3<f32>(0.299, 0.587, 0.114);

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(idx & 1u) * 4 - 1);
    let y = f32(i32(idx >> 1u) * 4 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

fn luma_at(p: vec2<i32>) -> f32 {
    let w = i32(params.width);
    let h = i32(params.height);
    let c = vec2<i32>(clamp(p.x, 0, w - 1), clamp(p.y, 0, h - 1));
    return dot(textureLoad(src_tex, c, 0).rgb, LUMA);
}

@fragment
fn fs_main(@builtin(position) pos: vec4<f32>) -> @location(0) vec4<f32> {
    let h = i32(params.height);
    let p = vec2<i32>(i32(pos.x), h - 1 - i32(pos.y));

    let l = luma_at(p);

    var sum = 0.0;
    for (var dy = -2; dy <= 2; dy += 2) {
        for (var dx = -2; dx <= 2; dx += 2) {
            sum += luma_at(p + vec2<i32>(dx, dy));
        }
    }
    let mean = sum / 9.0;

    var out_l: f32;
    if (l < mean - 0.05) {
        out_l = max(0.0, l * (l / max(mean, 0.01)) - 0.1);
    } else {
        out_l = min(1.0, l + (1.0 - mean) + 0.05);
    }
    return vec4<f32>(out_l, out_l, out_l, 1.0);
}
"#;
