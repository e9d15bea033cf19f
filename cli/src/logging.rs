use anyhow::{Context, Result};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    Layer,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging on stderr, plus a daily-rolling file in `log_dir`
/// when one is given. `RUST_LOG` overrides `default_level`.
///
/// The returned guard must be held until exit so buffered file output is
/// flushed.
pub fn init_logging(default_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let timer = OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
        // Fallback to UTC if local time fails (can happen in some environments)
        OffsetTime::new(
            time::UtcOffset::UTC,
            time::format_description::well_known::Rfc3339,
        )
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = console_layer(timer.clone());

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(console)
            .with(filter)
            .try_init()
            .context("Failed to install log subscriber")?;
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("campus")
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let timer_for_console = timer.clone();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(timer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(console_layer(timer_for_console))
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::info!("Log files are being written to: {}", log_dir.display());
    Ok(Some(guard))
}

/// Stderr layer, generic over the subscriber it is stacked on.
fn console_layer<S>(timer: OffsetTime<Rfc3339>) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer)
        .with_target(false)
}
