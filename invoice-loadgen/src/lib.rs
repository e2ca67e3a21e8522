//! Synthetic invoice-lookup request generator for load testing.
//!
//! Each load-test iteration samples an owner id, year and month, composes
//! `GET {INGEST_URL}/api/invoices?ownerId=..&year=..&month=..` and hands the
//! descriptor to an executor whose HTTP client carries the TLS trust policy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod runner;
pub mod sampler;
pub mod uri;

pub use config::{
    ConfigError, GeneratorConfig, INGEST_URL_PARAM, MAX_YEAR_SPAN, RunnerConfig, SamplingBounds,
};
pub use error::{GeneratorError, GeneratorResult, RunnerError};
pub use executor::RequestExecutor;
pub use generator::{EmissionState, Iteration, RequestDescriptor, RequestGenerator};
pub use runner::run;
pub use sampler::{OWNER_ID_PREFIX, ParameterSampler, SampledParameters};
pub use uri::{INVOICES_PATH, build_invoice_uri};
