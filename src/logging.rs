//! Structured logging configuration
//!
//! Provides logging with:
//! - JSON output for machine consumption
//! - Pretty formatting for development
//! - Configurable via environment variables (`RUST_LOG` wins over config)
//! - Request ids for correlating backend calls
//!
//! Console logs always go to stderr so they never mix with rendered output.

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};
use uuid::Uuid;

const LOG_FILE_NAME: &str = "cohort-dashboard.log";

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Console,
    File,
    Both,
}

impl LogSink {
    /// Unknown values fall back to the console.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "file" => LogSink::File,
            "both" => LogSink::Both,
            _ => LogSink::Console,
        }
    }

    fn console(self) -> bool {
        matches!(self, LogSink::Console | LogSink::Both)
    }

    fn file(self) -> bool {
        matches!(self, LogSink::File | LogSink::Both)
    }
}

/// Install the global subscriber.
///
/// When a file sink is configured the returned guard must be held until
/// exit, or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.format.eq_ignore_ascii_case("json");
    let sink = LogSink::parse(&config.output);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if sink.console() {
        layers.push(console_layer(json));
    }

    if sink.file() {
        match file_writer(log_dir) {
            Ok((writer, file_guard)) => {
                layers.push(file_layer(json, writer));
                guard = Some(file_guard);
            }
            Err(e) => {
                eprintln!(
                    "Warning: cannot create log directory {}: {}",
                    log_dir.display(),
                    e
                );
                if !sink.console() {
                    layers.push(console_layer(json));
                }
            }
        }
    }

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
    {
        eprintln!("Warning: logging already initialized: {}", e);
    }

    guard
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .pretty()
            .boxed()
    }
}

fn file_layer(json: bool, writer: NonBlocking) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .boxed()
    } else {
        fmt::layer().with_writer(writer).with_ansi(false).boxed()
    }
}

fn file_writer(log_dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

/// Fresh correlation id for one backend request.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
