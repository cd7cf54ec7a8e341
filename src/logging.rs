use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging for every CLI stage: human-readable console output
/// plus a daily-rolling JSON file under `logs/`.
///
/// `RUST_LOG` can raise or lower the filter; the crate itself defaults to
/// info so per-document skips stay visible in the log files.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "finsight.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::from_default_env().add_directive("finsight_etl=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_ansi(false).with_writer(file_writer))
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stdout))
        .init();

    // The appender flushes only while its guard lives
    std::mem::forget(guard);
}
