//! One GL texture per frame plane.

use glow::{HasContext, PixelUnpackData};

use crate::error::{Error, Result};
use crate::format::{FrameLayout, Plane};

/// Convert a `u32` dimension to the `i32` GL expects.
///
/// [`FrameLayout::new`] already rejects dimensions above `i32::MAX`.
fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// GL enums are small, so the `i32` casts below never wrap.
#[expect(clippy::cast_possible_wrap)]
pub(crate) const fn gl_enum(value: u32) -> i32 {
    value as i32
}

/// Textures holding the planes of the current frame.
///
/// Plane `i` lives on texture unit `GL_TEXTURE0 + i`.
pub struct PlaneTextures {
    layout: FrameLayout,
    textures: Vec<glow::Texture>,
}

impl PlaneTextures {
    /// Create one texture per plane and upload `frame` into them.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Fails when `frame` is shorter than one frame of `layout`, or when GL
    /// cannot create a texture.
    pub unsafe fn new(gl: &glow::Context, layout: FrameLayout, frame: &[u8]) -> Result<Self> {
        check_len(&layout, frame)?;

        let mut textures = Vec::with_capacity(layout.planes().len());
        unsafe { gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1) };

        for (unit, plane) in (0u32..).zip(layout.planes()) {
            let texture = match unsafe { gl.create_texture() } {
                Ok(texture) => texture,
                Err(err) => {
                    for texture in textures {
                        unsafe { gl.delete_texture(texture) };
                    }
                    return Err(Error::Gl(err));
                }
            };
            unsafe { load_plane(gl, unit, texture, plane, &frame[plane.range()]) };
            textures.push(texture);
        }

        tracing::debug!(
            format = %layout.format(),
            planes = textures.len(),
            "uploaded {}x{} frame",
            layout.width(),
            layout.height()
        );

        Ok(Self { layout, textures })
    }

    /// Layout the textures were created for.
    #[must_use]
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Replace the contents of every plane with those of `frame`.
    ///
    /// # Safety
    ///
    /// Requires the context these textures were created with to be current.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShortInput`] when `frame` is too short.
    pub unsafe fn update(&self, gl: &glow::Context, frame: &[u8]) -> Result<()> {
        check_len(&self.layout, frame)?;

        unsafe { gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1) };
        for (unit, (plane, texture)) in (0u32..).zip(self.layout.planes().iter().zip(&self.textures)) {
            unsafe {
                gl.active_texture(glow::TEXTURE0 + unit);
                gl.bind_texture(glow::TEXTURE_2D, Some(*texture));
                gl.tex_sub_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    0,
                    0,
                    gl_size(plane.width),
                    gl_size(plane.height),
                    plane.gl_format(),
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(Some(&frame[plane.range()])),
                );
            }
        }
        Ok(())
    }

    /// Bind every plane to its texture unit.
    ///
    /// # Safety
    ///
    /// Requires the context these textures were created with to be current.
    pub unsafe fn bind(&self, gl: &glow::Context) {
        for (unit, texture) in (0u32..).zip(&self.textures) {
            unsafe {
                gl.active_texture(glow::TEXTURE0 + unit);
                gl.bind_texture(glow::TEXTURE_2D, Some(*texture));
            }
        }
    }

    /// Delete the textures.
    ///
    /// # Safety
    ///
    /// Must be called once, with the creating context current.
    pub unsafe fn destroy(&self, gl: &glow::Context) {
        for texture in &self.textures {
            unsafe { gl.delete_texture(*texture) };
        }
    }
}

pub(crate) fn check_len(layout: &FrameLayout, frame: &[u8]) -> Result<()> {
    let required = layout.frame_size();
    if frame.len() < required {
        return Err(Error::ShortInput {
            required,
            available: frame.len(),
        });
    }
    Ok(())
}

/// Allocate and fill one plane texture on `unit`.
unsafe fn load_plane(
    gl: &glow::Context,
    unit: u32,
    texture: glow::Texture,
    plane: &Plane,
    pixels: &[u8],
) {
    unsafe {
        gl.active_texture(glow::TEXTURE0 + unit);
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        set_default_tex_params(gl);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            gl_enum(plane.gl_internal_format()),
            gl_size(plane.width),
            gl_size(plane.height),
            0,
            plane.gl_format(),
            glow::UNSIGNED_BYTE,
            PixelUnpackData::Slice(Some(pixels)),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }
}

/// Clamp to edge, linear filtering, no mipmaps.
unsafe fn set_default_tex_params(gl: &glow::Context) {
    unsafe {
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, gl_enum(glow::LINEAR));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, gl_enum(glow::LINEAR));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, gl_enum(glow::CLAMP_TO_EDGE));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, gl_enum(glow::CLAMP_TO_EDGE));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    #[test]
    fn short_frame_rejected_before_touching_gl() {
        let layout = FrameLayout::new(PixelFormat::Nv12, 4, 4).unwrap();
        let err = check_len(&layout, &[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortInput {
                required: 24,
                available: 10
            }
        ));
        assert!(check_len(&layout, &[0; 24]).is_ok());
    }

    #[test]
    fn gl_size_saturates() {
        assert_eq!(gl_size(1080), 1080);
        assert_eq!(gl_size(u32::MAX), i32::MAX);
    }
}
