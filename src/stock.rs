//! Built-in stock passthrough pass.
//!
//! Always compiled into slot 0 before any user pass. If this source fails to
//! compile the graphics environment itself is broken; the chain loader treats
//! that as fatal.

/// Combined-source GLSL for the stock pass. Stage selection happens through
/// the `VERTEX` / `FRAGMENT` defines injected by the compiler.
pub(crate) const PASSTHROUGH_SOURCE: &str = r#"#version 450

#ifdef VERTEX
layout(location = 0) in vec4 position;
layout(location = 1) in vec2 tex_coord;
layout(location = 0) out vec2 v_tex;

layout(set = 0, binding = 0) uniform Params {
    vec2 video_size;
    vec2 texture_size;
    vec2 output_size;
    float frame_count;
    float frame_direction;
    mat4 modelViewProj;
} IN;

void main() {
    gl_Position = IN.modelViewProj * position;
    v_tex = tex_coord;
}
#endif

#ifdef FRAGMENT
layout(location = 0) in vec2 v_tex;
layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform Params {
    vec2 video_size;
    vec2 texture_size;
    vec2 output_size;
    float frame_count;
    float frame_direction;
} IN;

layout(set = 1, binding = 0) uniform sampler2D source;

void main() {
    frag_color = texture(source, v_tex);
}
#endif
"#;

/// Diagnostic label for the stock source (it has no file path).
pub(crate) const PASSTHROUGH_LABEL: &str = "stock passthrough";
