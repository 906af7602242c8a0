//! Render raw RGB and YUV frames on X11 through EGL and OpenGL ES, via
//! [glow].
//!
//! The crate bundles the pieces shared by a few small demos:
//!
//! - [`EglContext`], a thin wrapper owning an EGL display, surface and
//!   OpenGL ES 3 context, either for an X11 window or an off-screen pbuffer.
//! - [`FrameLayout`], describing how packed, planar and bi-planar frames
//!   split into planes, one texture each.
//! - [`QuadRenderer`], which uploads those planes and draws them as a
//!   full-viewport quad. YUV to RGB conversion is a single matrix multiply
//!   in the fragment shader, using a [`ColorMatrix`].
//! - [`TriangleRenderer`], the classic flat red triangle.
//! - [`window::run`], an X11 event loop that draws a [`Scene`] every
//!   iteration, swaps buffers, and logs frames per second.
//!
//! # Safety
//!
//! Renderer constructors and draw calls are `unsafe`: they issue raw GL
//! calls and require the context they were created with to be current.
//!
//! [glow]: https://docs.rs/glow

mod color;
pub mod demo;
mod egl;
mod error;
mod format;
mod fps;
mod frames;
pub mod logging;
pub mod offscreen;
mod render;
mod shaders;
mod texture;
mod types;
pub mod window;

pub use color::ColorMatrix;
pub use egl::EglContext;
pub use error::{Error, Result};
pub use format::{FrameLayout, PixelFormat, Plane, ShaderFamily};
pub use fps::FpsCounter;
pub use frames::FrameReader;
pub use render::{QuadRenderer, TriangleRenderer, Viewport};
pub use window::{Scene, WindowConfig};
