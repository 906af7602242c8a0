//! Logging setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a colored stderr logger.
///
/// `default_level` applies unless `RUST_LOG` says otherwise. Calling this a
/// second time is a no-op.
pub fn init(default_level: LevelFilter) {
    let _ = subscriber(default_level, std::io::stderr).try_init();
}

/// Lines carry a timestamp, level, target and source location.
fn subscriber<W>(
    default_level: LevelFilter,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .finish()
}
