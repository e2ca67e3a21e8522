//! Tracing subscriber setup.
//!
//! [`init_tracing`] installs the global subscriber and hands back the
//! service root span. Everything logged inside that span, including spans of
//! spawned virtual users created under it, carries the `service` field.

use tracing::Span;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const FALLBACK_LEVEL: &str = "info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event, with the current span flattened in
    Json,
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name recorded on the root span
    pub service_name: String,
    /// Level directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "invoice-loadgen".to_string(),
            log_level: FALLBACK_LEVEL.to_string(),
            format: LogFormat::Text,
        }
    }
}

impl TracingConfig {
    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the level directive.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Emit JSON instead of text.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }
}

/// Parse a level directive, falling back to `info` when it is malformed.
fn level_filter(level: &str) -> (EnvFilter, bool) {
    EnvFilter::try_new(level).map_or_else(|_| (EnvFilter::new(FALLBACK_LEVEL), false), |f| (f, true))
}

/// Root span for everything the service logs.
#[must_use]
pub fn service_span(config: &TracingConfig) -> Span {
    tracing::info_span!("loadgen", service = %config.service_name)
}

/// Install the global subscriber and return the service root span.
///
/// `RUST_LOG` takes precedence over [`TracingConfig::log_level`]. If a
/// subscriber is already installed it is left in place.
pub fn init_tracing(config: &TracingConfig) -> Span {
    let (filter, level_ok) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => level_filter(&config.log_level),
    };

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
            .is_ok(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
            .is_ok(),
    };

    let span = service_span(config);
    if installed && !level_ok {
        span.in_scope(|| {
            tracing::warn!(
                level = %config.log_level,
                fallback = FALLBACK_LEVEL,
                "invalid log level, using fallback"
            );
        });
    }
    span
}
