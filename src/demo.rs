//! The two windowed demos as [`Scene`]s.

use std::io::{Read, Seek};
use std::sync::Arc;

use crate::{
    color::ColorMatrix,
    error::{Error, Result},
    format::FrameLayout,
    frames::FrameReader,
    render::{QuadRenderer, TriangleRenderer, Viewport},
    window::Scene,
};

/// A red triangle, redrawn every frame.
pub struct TriangleScene {
    renderer: TriangleRenderer,
}

impl TriangleScene {
    /// Build the triangle renderer.
    ///
    /// # Errors
    ///
    /// Fails when the shaders do not compile or GL objects cannot be made.
    pub fn new(gl: Arc<glow::Context>) -> Result<Self> {
        // `run` only hands out the context once it is current.
        let renderer = unsafe { TriangleRenderer::new(gl)? };
        Ok(Self { renderer })
    }
}

impl Scene for TriangleScene {
    fn draw(&mut self, viewport: Viewport) -> Result<bool> {
        unsafe { self.renderer.draw(viewport) };
        Ok(true)
    }

    fn destroy(&mut self) {
        unsafe { self.renderer.destroy() };
    }
}

/// Plays a raw frame file, uploading one frame per iteration.
pub struct PlaybackScene<R> {
    renderer: QuadRenderer,
    reader: FrameReader<R>,
    playback: Playback,
}

impl<R: Read + Seek> PlaybackScene<R> {
    /// Upload the first frame of `reader` and prepare the matching shader.
    ///
    /// Playback stops after `max_frames` frames when set.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, an empty reader, or GL setup failures.
    pub fn new(
        gl: Arc<glow::Context>,
        layout: FrameLayout,
        matrix: ColorMatrix,
        mut reader: FrameReader<R>,
        max_frames: Option<u64>,
    ) -> Result<Self> {
        let first = reader.next_frame()?.ok_or(Error::ShortInput {
            required: layout.frame_size(),
            available: 0,
        })?;
        let renderer = unsafe { QuadRenderer::new(gl, layout, matrix, first)? };
        Ok(Self {
            renderer,
            reader,
            playback: Playback::new(max_frames),
        })
    }
}

impl<R: Read + Seek> Scene for PlaybackScene<R> {
    fn draw(&mut self, viewport: Viewport) -> Result<bool> {
        match self.playback.next(&mut self.reader)? {
            Step::Finished => return Ok(false),
            Step::Current => {}
            Step::Upload(frame) => unsafe { self.renderer.upload(frame)? },
        }
        unsafe { self.renderer.draw(viewport) };
        Ok(true)
    }

    fn destroy(&mut self) {
        tracing::debug!(frames = self.playback.shown, "stopping playback");
        unsafe { self.renderer.destroy() };
    }
}

/// What the next iteration of playback should put on screen.
#[derive(Debug, PartialEq, Eq)]
enum Step<'a> {
    /// Redraw the frame uploaded at setup.
    Current,
    /// Upload this frame, then draw it.
    Upload(&'a [u8]),
    /// Nothing left to show.
    Finished,
}

/// Frame accounting for [`PlaybackScene`]. The first frame is uploaded
/// when the renderer is built, so the first step only draws.
#[derive(Debug)]
struct Playback {
    max_frames: Option<u64>,
    shown: u64,
}

impl Playback {
    fn new(max_frames: Option<u64>) -> Self {
        Self {
            max_frames,
            shown: 0,
        }
    }

    fn next<'r, R: Read + Seek>(&mut self, reader: &'r mut FrameReader<R>) -> Result<Step<'r>> {
        if self.max_frames.is_some_and(|max| self.shown >= max) {
            return Ok(Step::Finished);
        }

        let step = if self.shown == 0 {
            Step::Current
        } else {
            match reader.next_frame()? {
                Some(frame) => Step::Upload(frame),
                None => return Ok(Step::Finished),
            }
        };
        self.shown += 1;
        Ok(step)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A reader over `count` frames of `[i; 2]`, with frame 0 already taken
    /// the way [`PlaybackScene::new`] takes it.
    fn started(count: u8, looping: bool) -> FrameReader<Cursor<Vec<u8>>> {
        let data: Vec<u8> = (0..count).flat_map(|i| [i, i]).collect();
        let mut reader = FrameReader::new(Cursor::new(data), 2, looping).unwrap();
        reader.next_frame().unwrap();
        reader
    }

    /// Run playback to the end, returning the first byte of each drawn
    /// frame (`None` for the setup frame).
    fn drawn(
        playback: &mut Playback,
        reader: &mut FrameReader<Cursor<Vec<u8>>>,
    ) -> Vec<Option<u8>> {
        let mut drawn = Vec::new();
        loop {
            match playback.next(reader).unwrap() {
                Step::Finished => return drawn,
                Step::Current => drawn.push(None),
                Step::Upload(frame) => drawn.push(Some(frame[0])),
            }
            assert!(drawn.len() < 100, "playback never finished");
        }
    }

    #[test]
    fn zero_max_frames_shows_nothing() {
        let mut reader = started(2, true);
        let mut playback = Playback::new(Some(0));
        assert_eq!(playback.next(&mut reader).unwrap(), Step::Finished);
        assert_eq!(playback.shown, 0);
    }

    #[test]
    fn max_frames_caps_looping_input() {
        let mut reader = started(2, true);
        let mut playback = Playback::new(Some(3));
        assert_eq!(drawn(&mut playback, &mut reader), [None, Some(1), Some(0)]);
        assert_eq!(playback.shown, 3);
        assert_eq!(playback.next(&mut reader).unwrap(), Step::Finished);
    }

    #[test]
    fn non_looping_input_ends_after_last_frame() {
        let mut reader = started(2, false);
        let mut playback = Playback::new(None);
        assert_eq!(drawn(&mut playback, &mut reader), [None, Some(1)]);
    }

    #[test]
    fn first_step_reuses_setup_frame() {
        let mut reader = started(3, false);
        let mut playback = Playback::new(Some(2));
        assert_eq!(playback.next(&mut reader).unwrap(), Step::Current);
        assert_eq!(playback.next(&mut reader).unwrap(), Step::Upload(&[1, 1]));
        assert_eq!(playback.next(&mut reader).unwrap(), Step::Finished);
    }
}
