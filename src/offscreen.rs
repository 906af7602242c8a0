//! Headless conversion: draw one frame into an off-screen framebuffer and
//! read the RGB result back.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use glow::{HasContext, PixelPackData, PixelUnpackData};
use image::{imageops, RgbImage, RgbaImage};

use crate::{
    color::ColorMatrix,
    egl::EglContext,
    error::{Error, Result},
    format::FrameLayout,
    render::{QuadRenderer, Viewport},
    texture::gl_enum,
};

/// How the converted frame is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// PNG image.
    Png,
    /// Headerless packed RGB24, the same layout `play --format rgb24` reads.
    RawRgb24,
}

impl OutputKind {
    /// PNG for a `.png` extension (any case), raw RGB24 otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => Self::Png,
            _ => Self::RawRgb24,
        }
    }
}

/// Convert a single frame to RGB on the GPU.
///
/// Creates its own pbuffer-backed EGL context, so no window system is
/// needed.
///
/// # Errors
///
/// Fails on EGL or GL setup errors or a frame shorter than `layout` needs.
pub fn convert_frame(layout: &FrameLayout, matrix: ColorMatrix, frame: &[u8]) -> Result<RgbImage> {
    let (width, height) = (layout.width(), layout.height());
    let egl = EglContext::headless(width, height)?;
    let gl = Arc::new(unsafe { egl.load_gl() });

    let target = unsafe { RenderTarget::new(&gl, width, height)? };
    let result = unsafe { render_and_read(&gl, &target, layout, matrix, frame) };
    unsafe { target.destroy(&gl) };
    let rgba = result?;

    let rgba = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| Error::Gl("read back fewer pixels than requested".to_owned()))?;
    // GL rows start at the bottom.
    let rgba = imageops::flip_vertical(&rgba);
    Ok(image::DynamicImage::ImageRgba8(rgba).into_rgb8())
}

/// Write a converted frame in the format chosen by `path`'s extension.
///
/// # Errors
///
/// Propagates encoding and I/O errors.
pub fn write_output(image: &RgbImage, path: &Path) -> Result<()> {
    match OutputKind::from_path(path) {
        OutputKind::Png => image.save_with_format(path, image::ImageFormat::Png)?,
        OutputKind::RawRgb24 => fs::write(path, image.as_raw())?,
    }
    tracing::info!(path = %path.display(), "wrote {}x{} frame", image.width(), image.height());
    Ok(())
}

unsafe fn render_and_read(
    gl: &Arc<glow::Context>,
    target: &RenderTarget,
    layout: &FrameLayout,
    matrix: ColorMatrix,
    frame: &[u8],
) -> Result<Vec<u8>> {
    let (width, height) = (layout.width(), layout.height());
    let renderer = unsafe { QuadRenderer::new(Arc::clone(gl), layout.clone(), matrix, frame)? };

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(target.fbo));
        renderer.draw(Viewport { width, height });
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        gl.read_pixels(
            0,
            0,
            target.width,
            target.height,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            PixelPackData::Slice(Some(&mut pixels[..])),
        );
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        renderer.destroy();
    }
    Ok(pixels)
}

/// An RGBA8 texture-backed framebuffer object.
struct RenderTarget {
    fbo: glow::Framebuffer,
    texture: glow::Texture,
    width: i32,
    height: i32,
}

impl RenderTarget {
    unsafe fn new(gl: &glow::Context, width: u32, height: u32) -> Result<Self> {
        let invalid = || Error::InvalidGeometry { width, height };
        let w = i32::try_from(width).map_err(|_| invalid())?;
        let h = i32::try_from(height).map_err(|_| invalid())?;

        unsafe {
            let texture = gl.create_texture()?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                gl_enum(glow::RGBA8),
                w,
                h,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(None),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            let fbo = gl.create_framebuffer()?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            let target = Self {
                fbo,
                texture,
                width: w,
                height: h,
            };
            if status != glow::FRAMEBUFFER_COMPLETE {
                target.destroy(gl);
                return Err(Error::Gl(format!("framebuffer incomplete: {status:#x}")));
            }
            Ok(target)
        }
    }

    unsafe fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_texture(self.texture);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn output_kind_follows_extension() {
        assert_eq!(OutputKind::from_path(Path::new("out.png")), OutputKind::Png);
        assert_eq!(OutputKind::from_path(Path::new("OUT.PNG")), OutputKind::Png);
        assert_eq!(
            OutputKind::from_path(Path::new("frame_1920x1080_RGB24.yuv")),
            OutputKind::RawRgb24
        );
        assert_eq!(OutputKind::from_path(Path::new("frame")), OutputKind::RawRgb24);
    }

    #[test]
    fn raw_output_is_packed_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.rgb");
        let image = RgbImage::from_fn(2, 2, |x, y| image::Rgb([x as u8, y as u8, 9]));
        write_output(&image, &path).unwrap();
        assert_eq!(
            fs::read(&path).unwrap(),
            [0, 0, 9, 1, 0, 9, 0, 1, 9, 1, 1, 9]
        );
    }

    #[test]
    fn png_output_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let image = RgbImage::from_pixel(3, 1, image::Rgb([255, 0, 128]));
        write_output(&image, &path).unwrap();
        let decoded = image::open(&path).unwrap().into_rgb8();
        assert_eq!(decoded, image);
    }
}
