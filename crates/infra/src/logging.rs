//! Structured logging setup.
//!
//! The SDK only emits `tracing` events; nothing is printed unless the host
//! application installs a subscriber. [`init_logging`] is a convenience for
//! binaries and examples that have none of their own.
//!
//! Verbosity follows `RUST_LOG` when set, e.g.
//! `RUST_LOG=airalo_infra::http=debug`.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
    /// Whether to include span events (enter/exit)
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { json_format: false, default_level: Level::INFO, include_spans: false }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self { json_format: true, ..Default::default() }
    }

    pub fn text() -> Self {
        Self::default()
    }

    /// `AIRALO_LOG_FORMAT=json` selects JSON output.
    pub fn from_env() -> Self {
        match std::env::var("AIRALO_LOG_FORMAT") {
            Ok(format) if format.eq_ignore_ascii_case("json") => Self::json(),
            _ => Self::text(),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.include_spans = true;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string()))
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install a global subscriber. Later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    let filter = config.filter();
    let span_events = config.span_events();

    if config.json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_span_events(span_events)
                .with_current_span(true)
                .with_target(true),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_span_events(span_events).with_target(true));
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}
