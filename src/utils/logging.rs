use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{
    format::FmtSpan,
    writer::{BoxMakeWriter, MakeWriterExt},
};

pub const CLI_PREFIX: &str = "cli";

/// Writer for the log files. Without a log directory the file output is discarded.
fn file_writer(prefix: &str, log_dir: Option<&Path>) -> Result<BoxMakeWriter> {
    let Some(dir) = log_dir else {
        return Ok(BoxMakeWriter::new(std::io::sink));
    };
    // The appender expects the directory to exist when it prunes old files.
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(dir)?;
    Ok(BoxMakeWriter::new(appender))
}

/// Sets up the global subscriber. Logs always go to a daily rolling file when a log directory is
/// available; stdout gets a copy only when `show_std` is set, since stdout belongs to the timer
/// display.
pub fn enable_logging(
    prefix: &str,
    log_dir: Option<&Path>,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let files = file_writer(prefix, log_dir)?;
    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(files))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
