//! Raw frame layouts.
//!
//! A frame file is a sequence of tightly packed frames with no header. Each
//! frame is split into one or more planes, and every plane becomes its own
//! GL texture.

use std::fmt;

use crate::error::{Error, Result};

/// Pixel layout of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed 8-bit R, G, B.
    Rgb24,
    /// Packed 8-bit R, G, B, A.
    Rgba,
    /// Y plane followed by an interleaved half-resolution UV plane (4:2:0).
    Nv12,
    /// Y plane followed by an interleaved full-resolution UV plane (4:4:4).
    Nv24,
    /// Y, U and V planes, chroma at half resolution in both axes (4:2:0).
    I420,
}

/// Which fragment shader a format is sampled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderFamily {
    /// One texture already holding RGB(A).
    Packed,
    /// Luma texture plus one two-channel chroma texture.
    BiPlanar,
    /// Three single-channel textures.
    Planar,
}

impl PixelFormat {
    /// Shader family used to sample this format.
    #[must_use]
    pub fn shader_family(self) -> ShaderFamily {
        match self {
            Self::Rgb24 | Self::Rgba => ShaderFamily::Packed,
            Self::Nv12 | Self::Nv24 => ShaderFamily::BiPlanar,
            Self::I420 => ShaderFamily::Planar,
        }
    }

    /// Whether the frame carries YUV samples that need color conversion.
    #[must_use]
    pub fn is_yuv(self) -> bool {
        self.shader_family() != ShaderFamily::Packed
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rgb24 => "RGB24",
            Self::Rgba => "RGBA",
            Self::Nv12 => "NV12",
            Self::Nv24 => "NV24",
            Self::I420 => "I420",
        })
    }
}

/// One plane of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plane {
    /// Byte offset of the plane from the start of the frame.
    pub offset: usize,
    /// Plane width in texels.
    pub width: u32,
    /// Plane height in texels.
    pub height: u32,
    /// Bytes per texel.
    pub channels: u8,
}

impl Plane {
    /// Size of the plane in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize * usize::from(self.channels)
    }

    /// Always false for planes of a valid layout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Client pixel format passed to `glTexImage2D`.
    #[must_use]
    pub fn gl_format(&self) -> u32 {
        match self.channels {
            1 => glow::RED,
            2 => glow::RG,
            3 => glow::RGB,
            _ => glow::RGBA,
        }
    }

    /// Sized internal format for the texture.
    #[must_use]
    pub fn gl_internal_format(&self) -> u32 {
        match self.channels {
            1 => glow::R8,
            2 => glow::RG8,
            3 => glow::RGB8,
            _ => glow::RGBA8,
        }
    }

    /// Byte range of the plane inside a frame.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }
}

/// Plane layout of a frame of a given format and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: Vec<Plane>,
}

impl FrameLayout {
    /// Compute the layout of a `width` x `height` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeometry`] when either dimension is zero or
    /// does not fit in a GL size.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(Error::InvalidGeometry { width, height });
        }

        let luma = width as usize * height as usize;
        let chroma_w = width.div_ceil(2);
        let chroma_h = height.div_ceil(2);
        let plane = |offset, width, height, channels| Plane {
            offset,
            width,
            height,
            channels,
        };

        let planes = match format {
            PixelFormat::Rgb24 => vec![plane(0, width, height, 3)],
            PixelFormat::Rgba => vec![plane(0, width, height, 4)],
            PixelFormat::Nv24 => vec![plane(0, width, height, 1), plane(luma, width, height, 2)],
            PixelFormat::Nv12 => vec![
                plane(0, width, height, 1),
                plane(luma, chroma_w, chroma_h, 2),
            ],
            PixelFormat::I420 => {
                let chroma = chroma_w as usize * chroma_h as usize;
                vec![
                    plane(0, width, height, 1),
                    plane(luma, chroma_w, chroma_h, 1),
                    plane(luma + chroma, chroma_w, chroma_h, 1),
                ]
            }
        };

        Ok(Self {
            format,
            width,
            height,
            planes,
        })
    }

    /// Pixel format of the frame.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Planes in texture-unit order.
    #[must_use]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Total bytes in one frame.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.planes.iter().map(Plane::len).sum()
    }
}
