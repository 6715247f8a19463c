use std::path::Path;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt::writer::BoxMakeWriter, layer::SubscriberExt,
    registry::LookupSpan, util::SubscriberInitExt,
};

/// Where console log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    /// The server logs to stdout
    Stdout,
    /// Client commands print their results on stdout, so logs go to stderr
    Stderr,
}

impl Console {
    fn writer(self) -> BoxMakeWriter {
        match self {
            Console::Stdout => BoxMakeWriter::new(std::io::stdout),
            Console::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Daily rotating file for one level, e.g. logs/error.log.2025-01-01
fn file_layer<S>(log_dir: &Path, name: &str, level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(log_dir, name))
        .with_ansi(false)
        .with_filter(level)
}

/// Install the global subscriber: console output plus one rotating file per
/// level under `log_dir`.
///
/// `default_filter` applies when RUST_LOG is unset.
pub fn init(log_dir: &Path, default_filter: &str, console: Console) -> std::io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(console.writer())
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer(log_dir, "info.log", LevelFilter::INFO))
        .with(file_layer(log_dir, "warn.log", LevelFilter::WARN))
        .with(file_layer(log_dir, "error.log", LevelFilter::ERROR))
        .with(file_layer(log_dir, "debug.log", LevelFilter::DEBUG))
        .init();

    Ok(())
}
