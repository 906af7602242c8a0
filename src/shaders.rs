//! GLSL ES shader sources and compilation helpers.
//!
//! All shaders target GLSL ES 3.00, the baseline of an OpenGL ES 3 context.

use glow::HasContext;

use crate::error::{Error, Result};
use crate::format::ShaderFamily;

/// Vertex shader for the flat triangle. Positions are already in clip space.
pub const TRIANGLE_VERTEX_SRC: &str = r"#version 300 es

layout(location = 0) in vec4 a_position;

void main() {
    gl_Position = a_position;
}
";

/// Fragment shader for the flat triangle: opaque red.
pub const TRIANGLE_FRAGMENT_SRC: &str = r"#version 300 es
precision mediump float;

out vec4 frag_color;

void main() {
    frag_color = vec4(1.0, 0.0, 0.0, 1.0);
}
";

/// Vertex shader for the full-screen textured quad.
///
/// # Attributes
///
/// | Location | Name          | Type   | Description                  |
/// |----------|---------------|--------|------------------------------|
/// | `0`      | `a_position`  | `vec3` | Clip-space position          |
/// | `1`      | `a_tex_coord` | `vec2` | Texture coordinate, t=0 top  |
pub const QUAD_VERTEX_SRC: &str = r"#version 300 es

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec2 a_tex_coord;

out vec2 v_tex_coord;

void main() {
    gl_Position = vec4(a_position, 1.0);
    v_tex_coord = a_tex_coord;
}
";

/// Fragment shader for packed RGB / RGBA frames.
///
/// RGB24 textures sample with alpha 1.0, so no special casing is needed.
pub const RGB_FRAGMENT_SRC: &str = r"#version 300 es
precision mediump float;

in vec2 v_tex_coord;

uniform sampler2D u_rgb;

out vec4 frag_color;

void main() {
    frag_color = texture(u_rgb, v_tex_coord);
}
";

/// Fragment shader for bi-planar YUV (NV12, NV24).
///
/// # Uniforms
///
/// | Name           | Type        | Description                        |
/// |----------------|-------------|------------------------------------|
/// | `u_y`          | `sampler2D` | Luma plane, unit 0                 |
/// | `u_uv`         | `sampler2D` | Interleaved chroma plane, unit 1   |
/// | `u_yuv_to_rgb` | `mat3`      | Color matrix, see [`ColorMatrix`]  |
///
/// [`ColorMatrix`]: crate::ColorMatrix
pub const BI_PLANAR_FRAGMENT_SRC: &str = r"#version 300 es
precision mediump float;

in vec2 v_tex_coord;

uniform sampler2D u_y;
uniform sampler2D u_uv;
uniform mat3 u_yuv_to_rgb;

out vec4 frag_color;

void main() {
    vec3 yuv;
    yuv.x = texture(u_y, v_tex_coord).r;
    yuv.yz = texture(u_uv, v_tex_coord).rg - vec2(0.5, 0.5);
    frag_color = vec4(u_yuv_to_rgb * yuv, 1.0);
}
";

/// Fragment shader for planar YUV (I420).
///
/// # Uniforms
///
/// | Name           | Type        | Description              |
/// |----------------|-------------|--------------------------|
/// | `u_y`          | `sampler2D` | Luma plane, unit 0       |
/// | `u_u`          | `sampler2D` | U plane, unit 1          |
/// | `u_v`          | `sampler2D` | V plane, unit 2          |
/// | `u_yuv_to_rgb` | `mat3`      | Color matrix             |
pub const PLANAR_FRAGMENT_SRC: &str = r"#version 300 es
precision mediump float;

in vec2 v_tex_coord;

uniform sampler2D u_y;
uniform sampler2D u_u;
uniform sampler2D u_v;
uniform mat3 u_yuv_to_rgb;

out vec4 frag_color;

void main() {
    vec3 yuv;
    yuv.x = texture(u_y, v_tex_coord).r;
    yuv.y = texture(u_u, v_tex_coord).r - 0.5;
    yuv.z = texture(u_v, v_tex_coord).r - 0.5;
    frag_color = vec4(u_yuv_to_rgb * yuv, 1.0);
}
";

/// Fragment source and sampler names (in texture-unit order) for a family.
#[must_use]
pub fn quad_fragment(family: ShaderFamily) -> (&'static str, &'static [&'static str]) {
    match family {
        ShaderFamily::Packed => (RGB_FRAGMENT_SRC, &["u_rgb"]),
        ShaderFamily::BiPlanar => (BI_PLANAR_FRAGMENT_SRC, &["u_y", "u_uv"]),
        ShaderFamily::Planar => (PLANAR_FRAGMENT_SRC, &["u_y", "u_u", "u_v"]),
    }
}

/// Compile a shader program from vertex and fragment source strings.
///
/// The compiled shader objects are detached and deleted after successful
/// linking, so only the program handle needs to be cleaned up by the caller.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// Returns [`Error::ShaderCompile`] or [`Error::ProgramLink`] carrying the
/// GL info log.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program> {
    let program = unsafe { gl.create_program() }?;

    let vs = match unsafe { compile_shader(gl, glow::VERTEX_SHADER, vertex_src) } {
        Ok(vs) => vs,
        Err(err) => {
            unsafe { gl.delete_program(program) };
            return Err(err);
        }
    };
    let fs = match unsafe { compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) } {
        Ok(fs) => fs,
        Err(err) => {
            unsafe {
                gl.delete_shader(vs);
                gl.delete_program(program);
            }
            return Err(err);
        }
    };

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(Error::ProgramLink(log));
        }

        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
    }

    tracing::debug!("linked shader program");
    Ok(program)
}

/// Compile a single shader stage (vertex or fragment) from source.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader> {
    unsafe {
        let shader = gl.create_shader(shader_type)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            let stage = if shader_type == glow::VERTEX_SHADER {
                "vertex"
            } else {
                "fragment"
            };
            return Err(Error::ShaderCompile { stage, log });
        }

        Ok(shader)
    }
}

/// Look up a uniform that the renderer cannot work without.
///
/// # Safety
///
/// Requires a valid, current OpenGL context and a linked `program`.
pub(crate) unsafe fn uniform(
    gl: &glow::Context,
    program: glow::Program,
    name: &'static str,
) -> Result<glow::UniformLocation> {
    unsafe { gl.get_uniform_location(program, name) }.ok_or(Error::MissingUniform(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_targets_gles3() {
        for src in [
            TRIANGLE_VERTEX_SRC,
            TRIANGLE_FRAGMENT_SRC,
            QUAD_VERTEX_SRC,
            RGB_FRAGMENT_SRC,
            BI_PLANAR_FRAGMENT_SRC,
            PLANAR_FRAGMENT_SRC,
        ] {
            assert!(src.starts_with("#version 300 es\n"));
        }
    }

    #[test]
    fn samplers_are_declared_by_their_fragment_shader() {
        for family in [
            ShaderFamily::Packed,
            ShaderFamily::BiPlanar,
            ShaderFamily::Planar,
        ] {
            let (src, samplers) = quad_fragment(family);
            for name in samplers {
                assert!(
                    src.contains(&format!("uniform sampler2D {name};")),
                    "{name} missing for {family:?}"
                );
            }
        }
    }

    #[test]
    fn yuv_shaders_take_the_color_matrix() {
        assert!(BI_PLANAR_FRAGMENT_SRC.contains("uniform mat3 u_yuv_to_rgb;"));
        assert!(PLANAR_FRAGMENT_SRC.contains("uniform mat3 u_yuv_to_rgb;"));
        assert!(!RGB_FRAGMENT_SRC.contains("u_yuv_to_rgb"));
    }
}
