//! Thin EGL wrapper: one display, one surface, one OpenGL ES 3 context.

use std::ffi::c_void;

use glow::HasContext;
use khronos_egl as egl;

use crate::error::{Error, Result};

/// OpenGL ES major version requested from EGL.
const CLIENT_VERSION: egl::Int = 3;

fn egl_err(call: &'static str) -> impl FnOnce(egl::Error) -> Error {
    move |source| Error::Egl { call, source }
}

/// Where the context renders to.
enum Target {
    /// An X11 window.
    Window(egl::NativeWindowType),
    /// An off-screen pbuffer of the given size.
    Pbuffer { width: egl::Int, height: egl::Int },
}

/// An initialized EGL display with a current OpenGL ES context.
///
/// Dropping the context makes nothing current and tears down the surface,
/// the context and the display connection.
pub struct EglContext {
    egl: egl::DynamicInstance<egl::EGL1_4>,
    display: egl::Display,
    surface: egl::Surface,
    context: egl::Context,
}

impl EglContext {
    /// Create a context rendering into a native window.
    ///
    /// # Safety
    ///
    /// `native_display` must be a live Xlib `Display*` and `native_window`
    /// an X11 window on it, both outliving the returned context.
    ///
    /// # Errors
    ///
    /// Fails when libEGL cannot be loaded or any EGL call fails.
    pub unsafe fn for_window(
        native_display: egl::NativeDisplayType,
        native_window: egl::NativeWindowType,
    ) -> Result<Self> {
        unsafe { Self::new(native_display, Target::Window(native_window)) }
    }

    /// Create a context on the default display with an off-screen pbuffer
    /// surface of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Fails when libEGL cannot be loaded or any EGL call fails.
    pub fn headless(width: u32, height: u32) -> Result<Self> {
        let size = |v: u32| egl::Int::try_from(v).map_err(|_| Error::InvalidGeometry { width, height });
        let target = Target::Pbuffer {
            width: size(width)?,
            height: size(height)?,
        };
        // The default display needs no native handle to stay alive.
        unsafe { Self::new(egl::DEFAULT_DISPLAY, target) }
    }

    unsafe fn new(native_display: egl::NativeDisplayType, target: Target) -> Result<Self> {
        let egl = unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required() }
            .map_err(|e| Error::EglLoad(e.to_string()))?;

        let display = unsafe { egl.get_display(native_display) }.ok_or(Error::NoDisplay)?;
        let (major, minor) = egl.initialize(display).map_err(egl_err("eglInitialize"))?;
        tracing::debug!("EGL version: {major}.{minor}");

        match unsafe { Self::create(&egl, display, target) } {
            Ok((surface, context)) => Ok(Self {
                egl,
                display,
                surface,
                context,
            }),
            Err(err) => {
                if let Err(e) = egl.terminate(display) {
                    tracing::warn!("eglTerminate failed: {e}");
                }
                Err(err)
            }
        }
    }

    /// Choose a config, create the surface and context, and make them
    /// current.
    unsafe fn create(
        egl: &egl::DynamicInstance<egl::EGL1_4>,
        display: egl::Display,
        target: Target,
    ) -> Result<(egl::Surface, egl::Context)> {
        let surface_type = match target {
            Target::Window(_) => egl::WINDOW_BIT,
            Target::Pbuffer { .. } => egl::PBUFFER_BIT,
        };
        let attrib_list = [
            egl::RED_SIZE,
            5,
            egl::GREEN_SIZE,
            6,
            egl::BLUE_SIZE,
            5,
            egl::ALPHA_SIZE,
            egl::DONT_CARE,
            egl::DEPTH_SIZE,
            egl::DONT_CARE,
            egl::STENCIL_SIZE,
            egl::DONT_CARE,
            egl::SAMPLE_BUFFERS,
            0,
            egl::SURFACE_TYPE,
            surface_type,
            egl::RENDERABLE_TYPE,
            renderable_type(egl, display),
            egl::NONE,
        ];

        let config = egl
            .choose_first_config(display, &attrib_list)
            .map_err(egl_err("eglChooseConfig"))?
            .ok_or(Error::NoConfig)?;

        egl.bind_api(egl::OPENGL_ES_API)
            .map_err(egl_err("eglBindAPI"))?;

        let surface = match target {
            Target::Window(window) => unsafe {
                egl.create_window_surface(display, config, window, None)
            }
            .map_err(egl_err("eglCreateWindowSurface"))?,
            Target::Pbuffer { width, height } => egl
                .create_pbuffer_surface(
                    display,
                    config,
                    &[egl::WIDTH, width, egl::HEIGHT, height, egl::NONE],
                )
                .map_err(egl_err("eglCreatePbufferSurface"))?,
        };

        let context_attribs = [egl::CONTEXT_CLIENT_VERSION, CLIENT_VERSION, egl::NONE];
        let context = egl
            .create_context(display, config, None, &context_attribs)
            .map_err(egl_err("eglCreateContext"))?;

        egl.make_current(display, Some(surface), Some(surface), Some(context))
            .map_err(egl_err("eglMakeCurrent"))?;

        Ok((surface, context))
    }

    /// Load GL entry points through `eglGetProcAddress`.
    ///
    /// # Safety
    ///
    /// The returned context is only valid while `self` is alive and current.
    #[must_use]
    pub unsafe fn load_gl(&self) -> glow::Context {
        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                self.egl
                    .get_proc_address(name)
                    .map_or(std::ptr::null(), |f| f as *const c_void)
            })
        };
        let (version, renderer) = unsafe {
            (
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::RENDERER),
            )
        };
        tracing::info!(%renderer, "GL version: {version}");
        gl
    }

    /// Make this context current on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the `eglMakeCurrent` error.
    pub fn make_current(&self) -> Result<()> {
        self.egl
            .make_current(
                self.display,
                Some(self.surface),
                Some(self.surface),
                Some(self.context),
            )
            .map_err(egl_err("eglMakeCurrent"))
    }

    /// Present the back buffer.
    ///
    /// # Errors
    ///
    /// Returns the `eglSwapBuffers` error, e.g. when the window is gone.
    pub fn swap_buffers(&self) -> Result<()> {
        self.egl
            .swap_buffers(self.display, self.surface)
            .map_err(egl_err("eglSwapBuffers"))
    }

    /// Set the minimum number of vertical refreshes between swaps.
    ///
    /// # Errors
    ///
    /// Returns the `eglSwapInterval` error.
    pub fn set_swap_interval(&self, interval: i32) -> Result<()> {
        self.egl
            .swap_interval(self.display, interval)
            .map_err(egl_err("eglSwapInterval"))
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        let egl = &self.egl;
        let results = [
            ("eglMakeCurrent", egl.make_current(self.display, None, None, None)),
            ("eglDestroySurface", egl.destroy_surface(self.display, self.surface)),
            ("eglDestroyContext", egl.destroy_context(self.display, self.context)),
            ("eglTerminate", egl.terminate(self.display)),
        ];
        for (call, result) in results {
            if let Err(e) = result {
                tracing::warn!("{call} failed during teardown: {e}");
            }
        }
    }
}

/// ES3 configs are only advertised by displays with
/// `EGL_KHR_create_context`; anything else gets an ES2-renderable config.
fn renderable_type(egl: &egl::DynamicInstance<egl::EGL1_4>, display: egl::Display) -> egl::Int {
    let extensions = egl
        .query_string(Some(display), egl::EXTENSIONS)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    pick_renderable_type(&extensions)
}

fn pick_renderable_type(extensions: &str) -> egl::Int {
    if extensions
        .split_ascii_whitespace()
        .any(|ext| ext == "EGL_KHR_create_context")
    {
        egl::OPENGL_ES3_BIT
    } else {
        tracing::warn!("EGL_KHR_create_context missing, falling back to an ES2 config");
        egl::OPENGL_ES2_BIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es3_bit_requires_create_context_extension() {
        assert_eq!(
            pick_renderable_type("EGL_KHR_image_base EGL_KHR_create_context EGL_EXT_buffer_age"),
            egl::OPENGL_ES3_BIT
        );
        assert_eq!(pick_renderable_type("EGL_KHR_image_base"), egl::OPENGL_ES2_BIT);
        assert_eq!(pick_renderable_type(""), egl::OPENGL_ES2_BIT);
    }

    #[test]
    fn extension_match_is_exact() {
        assert_eq!(
            pick_renderable_type("EGL_KHR_create_context_no_error"),
            egl::OPENGL_ES2_BIT
        );
    }
}
