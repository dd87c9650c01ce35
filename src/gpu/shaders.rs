//! WGSL source for the field pipeline.

/// Pass-through shader for pre-tessellated, clip-space geometry.
///
/// Vertex layout matches [`crate::scene::Vertex`]: `vec2` position at
/// location 0, `vec4` RGBA at location 1. Blending is done by the pipeline.
pub const FIELD_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 0.0, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
