//! Error type shared by every part of the crate.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between opening a window and presenting a
/// frame.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `libEGL.so.1` could not be loaded or lacks EGL 1.4 entry points.
    #[error("failed to load libEGL: {0}")]
    EglLoad(String),

    /// An EGL call returned an error.
    #[error("{call} failed: {source}")]
    Egl {
        /// Name of the failing EGL entry point.
        call: &'static str,
        /// Error reported by `eglGetError`.
        #[source]
        source: khronos_egl::Error,
    },

    /// `eglGetDisplay` returned `EGL_NO_DISPLAY`.
    #[error("eglGetDisplay failed")]
    NoDisplay,

    /// No EGL config matches the requested attributes.
    #[error("eglChooseConfig found no matching config")]
    NoConfig,

    /// The window system handed out a handle EGL cannot use here.
    #[error("unsupported window system handle: {0}")]
    UnsupportedHandle(&'static str),

    /// The raw window or display handle could not be obtained.
    #[error(transparent)]
    Handle(#[from] raw_window_handle::HandleError),

    /// The event loop could not be created or run.
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The native window could not be created.
    #[error(transparent)]
    Os(#[from] winit::error::OsError),

    /// A GL object could not be created.
    #[error("GL error: {0}")]
    Gl(String),

    /// A shader stage failed to compile.
    #[error("{stage} shader compile error: {log}")]
    ShaderCompile {
        /// `vertex` or `fragment`.
        stage: &'static str,
        /// GL info log.
        log: String,
    },

    /// The program failed to link.
    #[error("program link error: {0}")]
    ProgramLink(String),

    /// A uniform the renderer relies on is missing from the linked program.
    #[error("uniform {0} missing from shader program")]
    MissingUniform(&'static str),

    /// Width or height is zero or too large for GL.
    #[error("invalid frame geometry {width}x{height}")]
    InvalidGeometry {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The frame source holds fewer bytes than one frame.
    #[error("input holds {available} bytes, one frame needs {required}")]
    ShortInput {
        /// Bytes needed for one frame.
        required: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// A frame index past the end of the input was requested.
    #[error("frame {index} out of range, input holds {count} frames")]
    FrameOutOfRange {
        /// Requested frame.
        index: u64,
        /// Whole frames in the input.
        count: u64,
    },

    /// Reading the frame file failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Encoding the converted image failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Gl(value)
    }
}
