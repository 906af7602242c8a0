//! Sequential reader for headerless raw frame files.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

/// Reads fixed-size frames one after another, optionally looping.
///
/// A source that holds exactly one frame is read once and the same buffer
/// is handed out on every call.
pub struct FrameReader<R> {
    source: R,
    frame_size: usize,
    frame_count: u64,
    looping: bool,
    buffer: Vec<u8>,
    next_index: u64,
    frames_read: u64,
}

impl FrameReader<BufReader<File>> {
    /// Open a frame file on disk.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or holds less than one frame.
    pub fn open(path: &Path, frame_size: usize, looping: bool) -> Result<Self> {
        let file = File::open(path)?;
        tracing::info!(path = %path.display(), "opened frame file");
        Self::new(BufReader::new(file), frame_size, looping)
    }
}

impl<R: Read + Seek> FrameReader<R> {
    /// Wrap a seekable source of `frame_size`-byte frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShortInput`] when the source is shorter than one
    /// frame.
    pub fn new(mut source: R, frame_size: usize, looping: bool) -> Result<Self> {
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let frame_size_u64 = frame_size as u64;
        let frame_count = if frame_size == 0 { 0 } else { len / frame_size_u64 };
        if frame_count == 0 {
            return Err(Error::ShortInput {
                required: frame_size,
                available: usize::try_from(len).unwrap_or(usize::MAX),
            });
        }

        let trailing = len % frame_size_u64;
        if trailing != 0 {
            tracing::warn!(trailing, "ignoring partial frame at end of input");
        }
        tracing::debug!(frame_count, frame_size, "frame source ready");

        Ok(Self {
            source,
            frame_size,
            frame_count,
            looping,
            buffer: vec![0; frame_size],
            next_index: 0,
            frames_read: 0,
        })
    }

    /// Number of whole frames in the source.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Position the reader so the next call to [`next_frame`] returns frame
    /// `index`.
    ///
    /// [`next_frame`]: Self::next_frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameOutOfRange`] past the last whole frame.
    pub fn seek_frame(&mut self, index: u64) -> Result<()> {
        if index >= self.frame_count {
            return Err(Error::FrameOutOfRange {
                index,
                count: self.frame_count,
            });
        }
        self.source
            .seek(SeekFrom::Start(index * self.frame_size as u64))?;
        self.next_index = index;
        Ok(())
    }

    /// Read the next frame.
    ///
    /// Returns `None` after the last frame when not looping; when looping the
    /// reader rewinds to the first frame instead.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the source.
    pub fn next_frame(&mut self) -> Result<Option<&[u8]>> {
        if self.next_index >= self.frame_count {
            if !self.looping {
                return Ok(None);
            }
            if self.frame_count > 1 {
                self.source.seek(SeekFrom::Start(0))?;
            }
            self.next_index = 0;
        }

        // A single frame is read once and reused.
        if self.frame_count > 1 || self.frames_read == 0 {
            self.read_exact_frame()?;
        }
        self.next_index += 1;
        Ok(Some(&self.buffer))
    }

    /// Number of frames actually pulled from the source so far.
    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn read_exact_frame(&mut self) -> io::Result<()> {
        self.source.read_exact(&mut self.buffer)?;
        self.frames_read += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn frames(count: u8, size: usize) -> Vec<u8> {
        (0..count).flat_map(|i| vec![i; size]).collect()
    }

    #[test]
    fn reads_frames_in_order_then_stops() {
        let mut reader = FrameReader::new(Cursor::new(frames(3, 4)), 4, false).unwrap();
        assert_eq!(reader.frame_count(), 3);
        for expected in 0..3u8 {
            assert_eq!(reader.next_frame().unwrap().unwrap(), &[expected; 4]);
        }
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn looping_rewinds_to_first_frame() {
        let mut reader = FrameReader::new(Cursor::new(frames(2, 3)), 3, true).unwrap();
        let seen: Vec<u8> = (0..5)
            .map(|_| reader.next_frame().unwrap().unwrap()[0])
            .collect();
        assert_eq!(seen, [0, 1, 0, 1, 0]);
        assert_eq!(reader.frames_read(), 5);
    }

    #[test]
    fn single_frame_is_read_once() {
        let mut reader = FrameReader::new(Cursor::new(vec![7u8; 6]), 6, true).unwrap();
        for _ in 0..4 {
            assert_eq!(reader.next_frame().unwrap().unwrap(), &[7; 6]);
        }
        assert_eq!(reader.frames_read(), 1);
    }

    #[test]
    fn trailing_partial_frame_ignored() {
        let mut data = frames(2, 4);
        data.extend_from_slice(&[9, 9]);
        let mut reader = FrameReader::new(Cursor::new(data), 4, false).unwrap();
        assert_eq!(reader.frame_count(), 2);
        reader.next_frame().unwrap();
        assert_eq!(reader.next_frame().unwrap().unwrap(), &[1; 4]);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn input_shorter_than_a_frame_is_rejected() {
        let err = FrameReader::new(Cursor::new(vec![0u8; 5]), 6, true)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::ShortInput {
                required: 6,
                available: 5
            }
        ));
    }

    #[test]
    fn seek_frame_jumps_and_checks_range() {
        let mut reader = FrameReader::new(Cursor::new(frames(4, 2)), 2, false).unwrap();
        reader.seek_frame(2).unwrap();
        assert_eq!(reader.next_frame().unwrap().unwrap(), &[2; 2]);
        assert!(matches!(
            reader.seek_frame(4),
            Err(Error::FrameOutOfRange { index: 4, count: 4 })
        ));
    }

    #[test]
    fn opens_files_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&frames(2, 8)).unwrap();
        let mut reader = FrameReader::open(file.path(), 8, false).unwrap();
        assert_eq!(reader.frame_count(), 2);
        reader.seek_frame(1).unwrap();
        assert_eq!(reader.next_frame().unwrap().unwrap(), &[1; 8]);
    }
}
