//! Command-line interface.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use yuv_gles_render::{ColorMatrix, PixelFormat, Viewport, WindowConfig};

#[derive(Debug, Parser)]
#[command(version, about = "Render raw RGB/YUV frames with EGL and OpenGL ES")]
pub struct Cli {
    /// Log verbosity; `RUST_LOG` takes precedence.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Draw a red triangle in a window.
    Triangle {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Play a raw frame file in a window.
    Play {
        /// Headerless file of consecutive frames.
        file: PathBuf,
        #[command(flatten)]
        frame: FrameArgs,
        #[command(flatten)]
        window: WindowArgs,
        /// Stop at the end of the file instead of starting over.
        #[arg(long)]
        no_loop: bool,
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u64>,
    },
    /// Convert one frame to RGB off-screen and write it to disk.
    Convert {
        /// Headerless file of consecutive frames.
        input: PathBuf,
        /// Output path; `.png` writes a PNG, anything else raw RGB24.
        output: PathBuf,
        #[command(flatten)]
        frame: FrameArgs,
        /// Zero-based frame to convert.
        #[arg(long, default_value_t = 0)]
        frame_index: u64,
    },
}

#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Initial window size.
    #[arg(long, default_value = "960x540")]
    pub size: Size,
    /// Window title.
    #[arg(long, default_value = "Render")]
    pub title: String,
    /// Sync buffer swaps to the display refresh.
    #[arg(long)]
    pub vsync: bool,
}

impl From<WindowArgs> for WindowConfig {
    fn from(args: WindowArgs) -> Self {
        Self {
            title: args.title,
            size: args.size.into(),
            vsync: args.vsync,
        }
    }
}

#[derive(Debug, Args)]
pub struct FrameArgs {
    /// Pixel layout of the input frames.
    #[arg(long, value_enum, default_value_t = FormatArg::Rgb24)]
    pub format: FormatArg,
    /// Dimensions of one frame.
    #[arg(long, default_value = "1920x1080")]
    pub frame_size: Size,
    /// YUV to RGB coefficients.
    #[arg(long, value_enum, default_value_t = MatrixArg::Bt601)]
    pub matrix: MatrixArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Rgb24,
    Rgba,
    Nv12,
    Nv24,
    I420,
}

impl From<FormatArg> for PixelFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Rgb24 => Self::Rgb24,
            FormatArg::Rgba => Self::Rgba,
            FormatArg::Nv12 => Self::Nv12,
            FormatArg::Nv24 => Self::Nv24,
            FormatArg::I420 => Self::I420,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatrixArg {
    Bt601,
    Bt709,
}

impl From<MatrixArg> for ColorMatrix {
    fn from(value: MatrixArg) -> Self {
        match value {
            MatrixArg::Bt601 => Self::Bt601,
            MatrixArg::Bt709 => Self::Bt709,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// `WIDTHxHEIGHT`, both non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let parse = |v: &str| match v.trim().parse::<u32>() {
            Ok(0) => Err(format!("dimension must be non-zero in {s:?}")),
            Ok(n) => Ok(n),
            Err(e) => Err(format!("invalid dimension {v:?}: {e}")),
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

impl From<Size> for Viewport {
    fn from(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn size_parses_both_separators() {
        assert_eq!(
            "1920x1080".parse::<Size>().unwrap(),
            Size {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!("64X48".parse::<Size>().unwrap().height, 48);
    }

    #[test]
    fn size_rejects_zero_and_garbage() {
        assert!("0x10".parse::<Size>().is_err());
        assert!("10x".parse::<Size>().is_err());
        assert!("1080p".parse::<Size>().is_err());
        assert!("-1x5".parse::<Size>().is_err());
    }

    #[test]
    fn play_defaults() {
        let cli = Cli::try_parse_from(["yuv-gles-render", "play", "frames.yuv"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);
        let Command::Play {
            file,
            frame,
            window,
            no_loop,
            max_frames,
        } = cli.command
        else {
            panic!("expected play");
        };
        assert_eq!(file, PathBuf::from("frames.yuv"));
        assert_eq!(frame.format, FormatArg::Rgb24);
        assert_eq!(
            frame.frame_size,
            Size {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(frame.matrix, MatrixArg::Bt601);
        assert_eq!(window.title, "Render");
        assert!(!no_loop);
        assert_eq!(max_frames, None);
    }

    #[test]
    fn convert_takes_format_and_index() {
        let cli = Cli::try_parse_from([
            "yuv-gles-render",
            "--log-level",
            "debug",
            "convert",
            "in.yuv",
            "out.png",
            "--format",
            "nv24",
            "--frame-size",
            "352x288",
            "--matrix",
            "bt709",
            "--frame-index",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        let Command::Convert {
            frame, frame_index, ..
        } = cli.command
        else {
            panic!("expected convert");
        };
        assert_eq!(PixelFormat::from(frame.format), PixelFormat::Nv24);
        assert_eq!(ColorMatrix::from(frame.matrix), ColorMatrix::Bt709);
        assert_eq!(frame.frame_size.width, 352);
        assert_eq!(frame_index, 3);
    }

    #[test]
    fn window_args_become_config() {
        let cli = Cli::try_parse_from([
            "yuv-gles-render",
            "triangle",
            "--size",
            "100x100",
            "--title",
            "TITLE",
            "--vsync",
        ])
        .unwrap();
        let Command::Triangle { window } = cli.command else {
            panic!("expected triangle");
        };
        let config = WindowConfig::from(window);
        assert_eq!(config.title, "TITLE");
        assert_eq!(
            config.size,
            Viewport {
                width: 100,
                height: 100
            }
        );
        assert!(config.vsync);
    }
}
