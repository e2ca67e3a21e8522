//! Request generation for one load-test iteration.
//!
//! Each iteration emits exactly one `GET` descriptor. Generation is a pure
//! computation over the immutable [`GeneratorConfig`]; nothing persists
//! between iterations.

use crate::config::GeneratorConfig;
use crate::error::GeneratorResult;
use crate::sampler::{ParameterSampler, SampledParameters};
use crate::uri::build_invoice_uri;
use chrono::{Datelike, Utc};
use rand::Rng;
use reqwest::Method;
use std::fmt;
use std::iter::FusedIterator;
use tracing::debug;
use url::Url;

/// An HTTP request ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: Method,
    uri: Url,
}

impl RequestDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub const fn new(method: Method, uri: Url) -> Self {
        Self { method, uri }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute request URI.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

/// Produces invoice lookup requests from a [`GeneratorConfig`].
#[derive(Debug, Clone)]
pub struct RequestGenerator {
    config: GeneratorConfig,
    sampler: ParameterSampler,
}

impl RequestGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let sampler = ParameterSampler::from_validated(*config.bounds());
        Self { config, sampler }
    }

    /// Generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Sample fresh parameters and build the request.
    ///
    /// # Errors
    ///
    /// Returns a configuration or construction error from
    /// [`build_invoice_uri`]; no descriptor is produced in that case.
    pub fn next_request(&self) -> GeneratorResult<RequestDescriptor> {
        self.next_request_with(&mut rand::thread_rng(), Utc::now().year())
    }

    /// Like [`RequestGenerator::next_request`] with a caller-supplied RNG and year.
    ///
    /// # Errors
    ///
    /// See [`RequestGenerator::next_request`].
    pub fn next_request_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        current_year: i32,
    ) -> GeneratorResult<RequestDescriptor> {
        let params = self.sampler.sample_with(rng, current_year);
        self.request_for(&params)
    }

    /// Build the request for already-sampled parameters.
    ///
    /// # Errors
    ///
    /// See [`RequestGenerator::next_request`].
    pub fn request_for(&self, params: &SampledParameters) -> GeneratorResult<RequestDescriptor> {
        let uri = build_invoice_uri(self.config.base_url(), params)?;
        debug!(%params, %uri, "generated invoice request");
        Ok(RequestDescriptor::new(Method::GET, uri))
    }

    /// Start a new iteration.
    #[must_use]
    pub const fn iteration(&self) -> Iteration<'_> {
        Iteration {
            generator: self,
            state: EmissionState::NotStarted,
        }
    }
}

/// Progress of an [`Iteration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionState {
    /// No request produced yet
    NotStarted,
    /// The request has been handed out; the next advance ends the sequence
    Emitting,
    /// The sequence is over
    Exhausted,
}

/// Request sequence of one load-test iteration.
///
/// Yields exactly one item: the descriptor, or the error that aborted the
/// iteration. The state stays [`EmissionState::Emitting`] after that item
/// until the iterator is advanced again.
#[derive(Debug)]
pub struct Iteration<'a> {
    generator: &'a RequestGenerator,
    state: EmissionState,
}

impl Iteration<'_> {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EmissionState {
        self.state
    }
}

impl Iterator for Iteration<'_> {
    type Item = GeneratorResult<RequestDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            EmissionState::NotStarted => {
                self.state = EmissionState::Emitting;
                Some(self.generator.next_request())
            }
            EmissionState::Emitting => {
                self.state = EmissionState::Exhausted;
                None
            }
            EmissionState::Exhausted => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.state == EmissionState::NotStarted);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iteration<'_> {}

impl FusedIterator for Iteration<'_> {}
