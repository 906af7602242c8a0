//! The renderers: own GL state, upload frames, and issue draw calls.

use std::sync::Arc;

use glow::HasContext;

use crate::{
    color::ColorMatrix,
    error::Result,
    format::FrameLayout,
    shaders,
    texture::{self, PlaneTextures},
    types::{TexturedVertex, Vertex, QUAD, QUAD_INDICES, TRIANGLE},
};

/// Background color behind everything drawn.
const CLEAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.0];

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const QUAD_INDEX_COUNT: i32 = QUAD_INDICES.len() as i32;

/// Byte stride of `T`, as the `i32` `glVertexAttribPointer` expects.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn stride<T>() -> i32 {
    std::mem::size_of::<T>() as i32
}

/// Size of the GL viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Apply as the GL viewport and clear the color buffer.
    unsafe fn apply_and_clear(self, gl: &glow::Context) {
        let w = i32::try_from(self.width).unwrap_or(i32::MAX);
        let h = i32::try_from(self.height).unwrap_or(i32::MAX);
        let [r, g, b, a] = CLEAR_COLOR;
        unsafe {
            gl.viewport(0, 0, w, h);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }
}

/// Draws a red triangle on a white background.
pub struct TriangleRenderer {
    gl: Arc<glow::Context>,
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
}

impl TriangleRenderer {
    /// Compile the flat-color program and upload the triangle.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current. Call [`destroy`](Self::destroy)
    /// before the context goes away.
    ///
    /// # Errors
    ///
    /// Fails on shader compile/link errors or GL object creation failure.
    pub unsafe fn new(gl: Arc<glow::Context>) -> Result<Self> {
        let mut created = Created::default();
        let result = unsafe { Self::build(&gl, &mut created) };
        if result.is_err() {
            unsafe { created.delete_all(&gl) };
        }
        result
    }

    unsafe fn build(gl: &Arc<glow::Context>, created: &mut Created) -> Result<Self> {
        let program = created.program(unsafe {
            shaders::compile_program(
                gl,
                shaders::TRIANGLE_VERTEX_SRC,
                shaders::TRIANGLE_FRAGMENT_SRC,
            )?
        });

        let (vao, vbo) = unsafe {
            let vao = created.vertex_array(gl.create_vertex_array()?);
            let vbo = created.buffer(gl.create_buffer()?);

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&TRIANGLE),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride::<Vertex>(), 0);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            (vao, vbo)
        };

        Ok(Self {
            gl: Arc::clone(gl),
            program,
            vao,
            vbo,
        })
    }

    /// Clear and draw the triangle into the current framebuffer.
    ///
    /// # Safety
    ///
    /// Requires the creating context to be current.
    pub unsafe fn draw(&self, viewport: Viewport) {
        let gl = &self.gl;
        unsafe {
            viewport.apply_and_clear(gl);
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
    }

    /// Delete every GL object owned by the renderer.
    ///
    /// # Safety
    ///
    /// Must be called exactly once, with the creating context current.
    pub unsafe fn destroy(&self) {
        let gl = &self.gl;
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
        }
    }
}

/// Draws a raw frame stretched over the whole viewport.
///
/// The frame's planes are uploaded to one texture each, and the fragment
/// shader matching the pixel format converts them to RGB.
pub struct QuadRenderer {
    gl: Arc<glow::Context>,
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    textures: PlaneTextures,
}

impl QuadRenderer {
    /// Compile the program for `layout`'s format, set its uniforms, and
    /// upload `first_frame`.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current. Call [`destroy`](Self::destroy)
    /// before the context goes away.
    ///
    /// # Errors
    ///
    /// Fails on shader errors, missing uniforms, GL object creation failure,
    /// or a `first_frame` shorter than one frame.
    pub unsafe fn new(
        gl: Arc<glow::Context>,
        layout: FrameLayout,
        matrix: ColorMatrix,
        first_frame: &[u8],
    ) -> Result<Self> {
        texture::check_len(&layout, first_frame)?;

        let mut created = Created::default();
        let result = unsafe { Self::build(&gl, &mut created, layout, matrix, first_frame) };
        if result.is_err() {
            unsafe { created.delete_all(&gl) };
        }
        result
    }

    unsafe fn build(
        gl: &Arc<glow::Context>,
        created: &mut Created,
        layout: FrameLayout,
        matrix: ColorMatrix,
        first_frame: &[u8],
    ) -> Result<Self> {
        let format = layout.format();
        let (fragment_src, samplers) = shaders::quad_fragment(format.shader_family());
        let program = created.program(unsafe {
            shaders::compile_program(gl, shaders::QUAD_VERTEX_SRC, fragment_src)?
        });

        unsafe {
            gl.use_program(Some(program));
            Self::set_uniforms(gl, program, samplers, format.is_yuv().then_some(matrix))?;
        }

        let (vao, vbo, ebo) = unsafe {
            let vao = created.vertex_array(gl.create_vertex_array()?);
            let vbo = created.buffer(gl.create_buffer()?);
            let ebo = created.buffer(gl.create_buffer()?);

            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_INDICES),
                glow::STATIC_DRAW,
            );

            // location 0: xyz, location 1: st
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride::<TexturedVertex>(), 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(
                1,
                2,
                glow::FLOAT,
                false,
                stride::<TexturedVertex>(),
                stride::<[f32; 3]>(),
            );

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            (vao, vbo, ebo)
        };

        // Last fallible step; cleans up its own textures on failure.
        let textures = unsafe { PlaneTextures::new(gl, layout, first_frame)? };

        tracing::info!(%format, ?matrix, "quad renderer ready");

        Ok(Self {
            gl: Arc::clone(gl),
            program,
            vao,
            vbo,
            ebo,
            textures,
        })
    }

    /// Point each sampler at its texture unit and load the color matrix.
    unsafe fn set_uniforms(
        gl: &glow::Context,
        program: glow::Program,
        samplers: &[&'static str],
        matrix: Option<ColorMatrix>,
    ) -> Result<()> {
        for (unit, name) in (0i32..).zip(samplers) {
            let location = unsafe { shaders::uniform(gl, program, *name)? };
            unsafe { gl.uniform_1_i32(Some(&location), unit) };
        }
        if let Some(matrix) = matrix {
            let location = unsafe { shaders::uniform(gl, program, "u_yuv_to_rgb")? };
            unsafe { gl.uniform_matrix_3_f32_slice(Some(&location), false, &matrix.columns()) };
        }
        Ok(())
    }

    /// Layout of the frames this renderer accepts.
    #[must_use]
    pub fn layout(&self) -> &FrameLayout {
        self.textures.layout()
    }

    /// Replace the displayed frame.
    ///
    /// # Safety
    ///
    /// Requires the creating context to be current.
    ///
    /// # Errors
    ///
    /// Fails when `frame` is shorter than one frame.
    pub unsafe fn upload(&self, frame: &[u8]) -> Result<()> {
        unsafe { self.textures.update(&self.gl, frame) }
    }

    /// Clear and draw the current frame into the bound framebuffer.
    ///
    /// # Safety
    ///
    /// Requires the creating context to be current.
    pub unsafe fn draw(&self, viewport: Viewport) {
        let gl = &self.gl;
        unsafe {
            viewport.apply_and_clear(gl);
            gl.use_program(Some(self.program));
            self.textures.bind(gl);
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(glow::TRIANGLES, QUAD_INDEX_COUNT, glow::UNSIGNED_INT, 0);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
    }

    /// Delete every GL object owned by the renderer.
    ///
    /// # Safety
    ///
    /// Must be called exactly once, with the creating context current.
    pub unsafe fn destroy(&self) {
        let gl = &self.gl;
        unsafe {
            self.textures.destroy(gl);
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
            gl.delete_buffer(self.ebo);
        }
    }
}

/// A GL object owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlObject {
    Program(glow::Program),
    VertexArray(glow::VertexArray),
    Buffer(glow::Buffer),
}

/// Objects a renderer constructor has created so far. If a later step
/// fails they are deleted, newest first.
#[derive(Debug, Default)]
struct Created(Vec<GlObject>);

impl Created {
    fn program(&mut self, program: glow::Program) -> glow::Program {
        self.0.push(GlObject::Program(program));
        program
    }

    fn vertex_array(&mut self, vao: glow::VertexArray) -> glow::VertexArray {
        self.0.push(GlObject::VertexArray(vao));
        vao
    }

    fn buffer(&mut self, buffer: glow::Buffer) -> glow::Buffer {
        self.0.push(GlObject::Buffer(buffer));
        buffer
    }

    fn newest_first(&mut self) -> impl Iterator<Item = GlObject> + '_ {
        self.0.drain(..).rev()
    }

    unsafe fn delete_all(&mut self, gl: &glow::Context) {
        for object in self.newest_first() {
            unsafe {
                match object {
                    GlObject::Program(program) => gl.delete_program(program),
                    GlObject::VertexArray(vao) => gl.delete_vertex_array(vao),
                    GlObject::Buffer(buffer) => gl.delete_buffer(buffer),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    #[test]
    fn strides_match_vertex_layouts() {
        assert_eq!(stride::<Vertex>(), 12);
        assert_eq!(stride::<TexturedVertex>(), 20);
        assert_eq!(stride::<[f32; 3]>(), 12);
    }

    #[test]
    fn quad_is_drawn_as_two_triangles() {
        assert_eq!(QUAD_INDEX_COUNT, 6);
    }

    #[test]
    fn partial_construction_is_released_newest_first() {
        let id = |n| NonZeroU32::new(n).unwrap();
        let mut created = Created::default();
        let program = created.program(glow::NativeProgram(id(1)));
        let vao = created.vertex_array(glow::NativeVertexArray(id(2)));
        let vbo = created.buffer(glow::NativeBuffer(id(3)));
        let ebo = created.buffer(glow::NativeBuffer(id(4)));

        let order: Vec<_> = created.newest_first().collect();
        assert_eq!(
            order,
            [
                GlObject::Buffer(ebo),
                GlObject::Buffer(vbo),
                GlObject::VertexArray(vao),
                GlObject::Program(program),
            ]
        );
        assert_eq!(created.newest_first().count(), 0);
    }
}
