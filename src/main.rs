//! `yuv-gles-render`: the triangle, playback and conversion demos.

mod cli;

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use yuv_gles_render::{
    demo::{PlaybackScene, TriangleScene},
    logging, offscreen, window, ColorMatrix, FrameLayout, FrameReader,
};

use crate::cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level.into());
    exit_code(run(cli.command))
}

/// Errors are logged once, here, and turned into a failing exit status.
fn exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Triangle { window: args } => {
            window::run(args.into(), TriangleScene::new)?;
        }
        Command::Play {
            file,
            frame,
            window: args,
            no_loop,
            max_frames,
        } => {
            let layout = FrameLayout::new(
                frame.format.into(),
                frame.frame_size.width,
                frame.frame_size.height,
            )?;
            let reader = FrameReader::open(&file, layout.frame_size(), !no_loop)
                .with_context(|| format!("cannot play {}", file.display()))?;
            tracing::info!(
                format = %layout.format(),
                frames = reader.frame_count(),
                "playing {}x{}",
                layout.width(),
                layout.height()
            );

            let matrix = ColorMatrix::from(frame.matrix);
            window::run(args.into(), move |gl| {
                PlaybackScene::new(gl, layout, matrix, reader, max_frames)
            })?;
        }
        Command::Convert {
            input,
            output,
            frame,
            frame_index,
        } => {
            let layout = FrameLayout::new(
                frame.format.into(),
                frame.frame_size.width,
                frame.frame_size.height,
            )?;
            let mut reader = FrameReader::open(&input, layout.frame_size(), false)
                .with_context(|| format!("cannot read {}", input.display()))?;
            reader.seek_frame(frame_index)?;
            let Some(pixels) = reader.next_frame()? else {
                anyhow::bail!("frame {frame_index} missing from {}", input.display());
            };

            let rgb = offscreen::convert_frame(&layout, frame.matrix.into(), pixels)?;
            offscreen::write_output(&rgb, &output)
                .with_context(|| format!("cannot write {}", output.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn is(code: ExitCode, expected: ExitCode) -> bool {
        format!("{code:?}") == format!("{expected:?}")
    }

    #[test]
    fn errors_exit_with_failure() {
        assert!(is(exit_code(Ok(())), ExitCode::SUCCESS));
        assert!(is(
            exit_code(Err(anyhow::anyhow!("no EGL display"))),
            ExitCode::FAILURE
        ));
    }

    #[test]
    fn missing_input_fails_before_any_window() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "yuv-gles-render",
            "convert",
            dir.path().join("absent.yuv").to_str().unwrap(),
            dir.path().join("out.png").to_str().unwrap(),
        ])
        .unwrap();
        let err = run(cli.command).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read"), "{err:#}");
        assert!(is(exit_code(Err(err)), ExitCode::FAILURE));
    }
}
