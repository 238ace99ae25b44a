//! WGSL sources for the programs the window layer builds itself.

use super::ProgramSource;

/// Two triangles covering the active viewport, with `uv` in `[0, 1]`
/// (top-left origin).
pub const VIEWPORT_QUAD_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 1.0),
    );
    let c = corners[index];
    var out: VertexOutput;
    out.position = vec4<f32>(c.x * 2.0 - 1.0, 1.0 - c.y * 2.0, 0.0, 1.0);
    out.uv = c;
    return out;
}
"#;

/// Maps a scalar field texture through the window's colormap buffer.
///
/// - `@group(0) @binding(0)`: colormap entries (`array<vec4<f32>>`, storage)
/// - `@group(1) @binding(0)`: scalar field, red channel in `[0, 1]`
pub const COLORMAP_FRAGMENT: &str = r#"
struct FragmentInput {
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<storage, read> colormap: array<vec4<f32>>;
@group(1) @binding(0) var field: texture_2d<f32>;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let dims = textureDimensions(field);
    let texel = min(vec2<u32>(in.uv * vec2<f32>(dims)), dims - vec2<u32>(1u, 1u));
    let value = clamp(textureLoad(field, texel, 0).r, 0.0, 1.0);
    let count = arrayLength(&colormap);
    let index = min(u32(value * f32(count - 1u) + 0.5), count - 1u);
    return colormap[index];
}
"#;

/// Tints an 8-bit coverage bitmap; output is premultiplied.
pub const LABEL_FRAGMENT: &str = r#"
struct FragmentInput {
    @location(0) uv: vec2<f32>,
};

struct LabelStyle {
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> style: LabelStyle;
@group(0) @binding(1) var coverage: texture_2d<f32>;

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let dims = textureDimensions(coverage);
    let texel = min(vec2<u32>(in.uv * vec2<f32>(dims)), dims - vec2<u32>(1u, 1u));
    let a = textureLoad(coverage, texel, 0).r * style.color.a;
    return vec4<f32>(style.color.rgb * a, a);
}
"#;

/// The per-window colormap program.
pub fn colormap_program() -> ProgramSource {
    ProgramSource::new(VIEWPORT_QUAD_VERTEX, COLORMAP_FRAGMENT).with_label("colormap")
}

/// The program used to draw cell titles.
pub fn label_program() -> ProgramSource {
    ProgramSource::new(VIEWPORT_QUAD_VERTEX, LABEL_FRAGMENT).with_label("label")
}
