//! X11 window and the per-frame event loop.
//!
//! The loop polls continuously: every iteration drains pending window
//! events, then draws one frame and swaps buffers.

use std::ffi::c_void;
use std::sync::Arc;
use std::time::Instant;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    platform::x11::EventLoopBuilderExtX11,
    window::{Window, WindowId},
};

use crate::{
    egl::EglContext,
    error::{Error, Result},
    fps::FpsCounter,
    render::Viewport,
};

/// Window creation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Initial inner size in pixels.
    pub size: Viewport,
    /// Wait for vertical blank on every swap.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Render".to_owned(),
            size: Viewport {
                width: 960,
                height: 540,
            },
            vsync: false,
        }
    }
}

/// Something drawn once per loop iteration.
///
/// The EGL context is current whenever a method is called.
pub trait Scene {
    /// Draw one frame into the default framebuffer.
    ///
    /// Returns `Ok(false)` when the scene has nothing more to show.
    ///
    /// # Errors
    ///
    /// Any error stops the loop and is returned from [`run`].
    fn draw(&mut self, viewport: Viewport) -> Result<bool>;

    /// Release GL resources. Called once, before the context is destroyed.
    fn destroy(&mut self);
}

/// Open a window, create a GL context for it, and run `scene` until the
/// window is closed or the scene ends.
///
/// `make_scene` runs once the context is current.
///
/// # Errors
///
/// Returns the first error raised by window creation, EGL, the scene, or
/// buffer swapping.
pub fn run<S, F>(config: WindowConfig, make_scene: F) -> Result<()>
where
    S: Scene,
    F: FnOnce(Arc<glow::Context>) -> Result<S>,
{
    let event_loop = EventLoop::builder().with_x11().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        config,
        make_scene: Some(make_scene),
        running: None,
        fps: FpsCounter::new(),
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Live state once the window exists. Fields drop in order: the scene's GL
/// objects go first, then the context, then the window it renders to.
struct Running<S: Scene> {
    scene: S,
    egl: EglContext,
    window: Window,
    viewport: Viewport,
}

impl<S: Scene> Drop for Running<S> {
    fn drop(&mut self) {
        self.scene.destroy();
    }
}

struct App<S: Scene, F> {
    config: WindowConfig,
    make_scene: Option<F>,
    running: Option<Running<S>>,
    fps: FpsCounter,
    error: Option<Error>,
}

impl<S, F> App<S, F>
where
    S: Scene,
    F: FnOnce(Arc<glow::Context>) -> Result<S>,
{
    fn start(&self, event_loop: &ActiveEventLoop, make_scene: F) -> Result<Running<S>> {
        let size = self.config.size;
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(size.width, size.height));
        let window = event_loop.create_window(attributes)?;

        let native_display = xlib_display(window.display_handle()?.as_raw())?;
        let native_window = xlib_window(window.window_handle()?.as_raw())?;

        // The window outlives the context: both live in `Running`, and the
        // context field drops first.
        let egl = unsafe { EglContext::for_window(native_display, native_window)? };
        if let Err(e) = egl.set_swap_interval(i32::from(self.config.vsync)) {
            tracing::warn!("could not set swap interval: {e}");
        }

        let gl = Arc::new(unsafe { egl.load_gl() });
        let scene = make_scene(gl)?;

        let inner = window.inner_size();
        tracing::info!(title = %self.config.title, "window {}x{} ready", inner.width, inner.height);

        Ok(Running {
            scene,
            egl,
            window,
            viewport: Viewport {
                width: inner.width,
                height: inner.height,
            },
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        tracing::error!("{err}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        if let Some(fps) = self.fps.tick(Instant::now()) {
            tracing::info!("fps: {fps}");
        }

        let result = running
            .scene
            .draw(running.viewport)
            .and_then(|more| running.egl.swap_buffers().map(|()| more));

        match result {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("scene finished");
                event_loop.exit();
            }
            Err(err) => self.fail(event_loop, err),
        }
    }
}

impl<S, F> ApplicationHandler for App<S, F>
where
    S: Scene,
    F: FnOnce(Arc<glow::Context>) -> Result<S>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(make_scene) = self.make_scene.take() else {
            return;
        };
        match self.start(event_loop, make_scene) {
            Ok(running) => self.running = Some(running),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Some(text) = &event.text {
                    tracing::info!("keypress: {text}");
                }
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(running) = self.running.as_mut() {
                    running.viewport = Viewport {
                        width: size.width,
                        height: size.height,
                    };
                    tracing::debug!("resized to {}x{}", size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Tear down GL while the X connection is still open.
        if let Some(running) = &self.running {
            if let Err(e) = running.egl.make_current() {
                tracing::warn!("{e}");
            }
        }
        self.running = None;
    }
}

fn xlib_display(handle: RawDisplayHandle) -> Result<*mut c_void> {
    match handle {
        RawDisplayHandle::Xlib(xlib) => xlib
            .display
            .map(std::ptr::NonNull::as_ptr)
            .ok_or(Error::UnsupportedHandle("Xlib handle without a display connection")),
        _ => Err(Error::UnsupportedHandle("display is not an Xlib display")),
    }
}

fn xlib_window(handle: RawWindowHandle) -> Result<*mut c_void> {
    match handle {
        // EGL on X11 takes the window XID in place of a pointer.
        RawWindowHandle::Xlib(xlib) => Ok(xlib.window as usize as *mut c_void),
        _ => Err(Error::UnsupportedHandle("window is not an Xlib window")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use raw_window_handle::{XcbWindowHandle, XlibDisplayHandle, XlibWindowHandle};
    use std::num::NonZeroU32;
    use std::ptr::NonNull;

    #[test]
    fn default_window_matches_render_demo() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "Render");
        assert_eq!(
            config.size,
            Viewport {
                width: 960,
                height: 540
            }
        );
    }

    #[test]
    fn xlib_window_id_becomes_native_window() {
        let handle = RawWindowHandle::Xlib(XlibWindowHandle::new(0x0420_0007));
        assert_eq!(xlib_window(handle).unwrap() as usize, 0x0420_0007);
    }

    #[test]
    fn xcb_window_is_rejected() {
        let handle = RawWindowHandle::Xcb(XcbWindowHandle::new(NonZeroU32::new(7).unwrap()));
        assert!(matches!(xlib_window(handle), Err(Error::UnsupportedHandle(_))));
    }

    #[test]
    fn xlib_display_requires_connection() {
        let none = RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0));
        assert!(matches!(xlib_display(none), Err(Error::UnsupportedHandle(_))));

        let mut marker = 0u8;
        let ptr = NonNull::from(&mut marker).cast::<c_void>();
        let some = RawDisplayHandle::Xlib(XlibDisplayHandle::new(Some(ptr), 0));
        assert_eq!(xlib_display(some).unwrap(), ptr.as_ptr());
    }
}
