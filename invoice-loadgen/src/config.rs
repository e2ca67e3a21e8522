//! Generator and runner configuration.
//!
//! The base URL is carried unvalidated: a missing or malformed `INGEST_URL`
//! is reported when a request is generated, not at startup. Sampling bounds
//! and runner settings are validated up front.

use crate::error::{GeneratorError, GeneratorResult};
use loadgen_common::{HttpConfig, TlsVersion, TracingConfig, TransportError, TrustPolicy};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Context parameter holding the target base URL.
pub const INGEST_URL_PARAM: &str = "INGEST_URL";

/// Largest accepted [`SamplingBounds::year_span`].
pub const MAX_YEAR_SPAN: i32 = 100;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Value outside the accepted range
    #[error("Invalid value for {name}: {reason}")]
    OutOfRange {
        /// Variable name
        name: String,
        /// Constraint that failed
        reason: String,
    },
}

/// Bounds for randomized request parameters.
///
/// Every range is sampled with an exclusive upper bound. With the default
/// month range `[1, 12)` month 12 is never produced; widen it with
/// [`SamplingBounds::with_month_range`] to cover December.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingBounds {
    /// Lowest owner id (inclusive)
    pub owner_id_min: u32,
    /// Owner id upper bound (exclusive)
    pub owner_id_max: u32,
    /// Number of years sampled starting at the current UTC year
    pub year_span: i32,
    /// Lowest month (inclusive)
    pub month_min: u32,
    /// Month upper bound (exclusive)
    pub month_max: u32,
}

impl Default for SamplingBounds {
    fn default() -> Self {
        Self {
            owner_id_min: 0,
            owner_id_max: 127_271,
            year_span: 4,
            month_min: 1,
            month_max: 12,
        }
    }
}

impl SamplingBounds {
    /// Set the owner id range `[min, max)`.
    #[must_use]
    pub const fn with_owner_id_range(mut self, min: u32, max: u32) -> Self {
        self.owner_id_min = min;
        self.owner_id_max = max;
        self
    }

    /// Set the number of sampled years.
    #[must_use]
    pub const fn with_year_span(mut self, span: i32) -> Self {
        self.year_span = span;
        self
    }

    /// Set the month range `[min, max)`.
    #[must_use]
    pub const fn with_month_range(mut self, min: u32, max: u32) -> Self {
        self.month_min = min;
        self.month_max = max;
        self
    }

    /// Validate the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidBounds`] for an empty range, a year
    /// span outside `1..=MAX_YEAR_SPAN`, or months outside 1..=12.
    pub fn validate(&self) -> GeneratorResult<()> {
        if self.owner_id_min >= self.owner_id_max {
            return Err(GeneratorError::invalid_bounds(format!(
                "owner id range [{}, {}) is empty",
                self.owner_id_min, self.owner_id_max
            )));
        }
        if !(1..=MAX_YEAR_SPAN).contains(&self.year_span) {
            return Err(GeneratorError::invalid_bounds(format!(
                "year span {} must be within 1..={MAX_YEAR_SPAN}",
                self.year_span
            )));
        }
        if self.month_min >= self.month_max {
            return Err(GeneratorError::invalid_bounds(format!(
                "month range [{}, {}) is empty",
                self.month_min, self.month_max
            )));
        }
        if self.month_min < 1 || self.month_max > 13 {
            return Err(GeneratorError::invalid_bounds(format!(
                "month range [{}, {}) exceeds 1..=12",
                self.month_min, self.month_max
            )));
        }
        Ok(())
    }
}

/// Immutable configuration for a request generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    base_url: Option<String>,
    bounds: SamplingBounds,
}

impl GeneratorConfig {
    /// Create a configuration with default sampling bounds.
    #[must_use]
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url,
            bounds: SamplingBounds::default(),
        }
    }

    /// Create a configuration targeting `base_url`.
    #[must_use]
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self::new(Some(base_url.into()))
    }

    /// Replace the sampling bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidBounds`] if the bounds are degenerate.
    pub fn with_bounds(mut self, bounds: SamplingBounds) -> GeneratorResult<Self> {
        bounds.validate()?;
        self.bounds = bounds;
        Ok(self)
    }

    /// Raw base URL as supplied by the runner context.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Sampling bounds.
    #[must_use]
    pub const fn bounds(&self) -> &SamplingBounds {
        &self.bounds
    }
}

/// Load-test runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Target base URL, validated at generation time
    pub ingest_url: Option<String>,
    /// Iterations per virtual user (must be > 0)
    pub iterations: u32,
    /// Concurrent virtual users (must be > 0)
    pub virtual_users: u32,
    /// Certificate acceptance policy
    pub trust_policy: TrustPolicy,
    /// Lowest negotiated TLS version
    pub min_tls_version: TlsVersion,
    /// PEM bundle of extra trusted roots
    pub ca_bundle: Option<PathBuf>,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Log level filter
    pub log_level: String,
    /// JSON log output
    pub log_json: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            ingest_url: None,
            iterations: 1,
            virtual_users: 1,
            trust_policy: TrustPolicy::Strict,
            min_tls_version: TlsVersion::Tls12,
            ca_bundle: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from the environment and an optional `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable cannot be parsed or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            ingest_url: lookup(INGEST_URL_PARAM),
            iterations: parse_var(&lookup, "LOADTEST_ITERATIONS", defaults.iterations)?,
            virtual_users: parse_var(&lookup, "LOADTEST_VIRTUAL_USERS", defaults.virtual_users)?,
            trust_policy: parse_var(&lookup, "LOADTEST_TRUST_POLICY", defaults.trust_policy)?,
            min_tls_version: parse_var(&lookup, "LOADTEST_MIN_TLS", defaults.min_tls_version)?,
            ca_bundle: lookup("LOADTEST_CA_BUNDLE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT", defaults.request_timeout_secs)?,
            connect_timeout_secs: parse_var(&lookup, "CONNECT_TIMEOUT", defaults.connect_timeout_secs)?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: parse_var(&lookup, "LOG_JSON", defaults.log_json)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(out_of_range("LOADTEST_ITERATIONS", "must be greater than 0"));
        }
        if self.virtual_users == 0 {
            return Err(out_of_range("LOADTEST_VIRTUAL_USERS", "must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(out_of_range("REQUEST_TIMEOUT", "must be greater than 0"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(out_of_range("CONNECT_TIMEOUT", "must be greater than 0"));
        }
        Ok(())
    }

    /// Generator configuration for one virtual user.
    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new(self.ingest_url.clone())
    }

    /// HTTP client configuration carrying the trust policy.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the CA bundle cannot be read.
    pub fn http_config(&self) -> Result<HttpConfig, TransportError> {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_trust_policy(self.trust_policy)
            .with_min_tls_version(self.min_tls_version);

        match &self.ca_bundle {
            Some(path) => {
                let pem = fs::read(path).map_err(|e| {
                    TransportError::ClientBuild(format!("Failed to read {}: {e}", path.display()))
                })?;
                config.with_root_certificates_pem(&pem)
            }
            None => Ok(config),
        }
    }

    /// Tracing configuration.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::default().with_log_level(&self.log_level);
        if self.log_json {
            config.with_json_output()
        } else {
            config
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn out_of_range(name: &str, reason: &str) -> ConfigError {
    ConfigError::OutOfRange {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
