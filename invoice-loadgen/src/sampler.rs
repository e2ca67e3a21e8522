//! Randomized request parameters.

use crate::config::SamplingBounds;
use crate::error::GeneratorResult;
use chrono::{Datelike, Utc};
use rand::Rng;
use std::fmt;

/// Literal prefix of every owner id token.
pub const OWNER_ID_PREFIX: &str = "o000";

/// Parameters for one invoice lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledParameters {
    /// Owner token: [`OWNER_ID_PREFIX`] followed by the unpadded numeric id
    pub owner_id: String,
    /// Invoice year
    pub year: i32,
    /// Invoice month
    pub month: u32,
}

impl SampledParameters {
    /// Build parameters from a numeric owner id.
    #[must_use]
    pub fn new(owner_number: u32, year: i32, month: u32) -> Self {
        Self {
            owner_id: format!("{OWNER_ID_PREFIX}{owner_number}"),
            year,
            month,
        }
    }

    /// Numeric part of the owner token.
    #[must_use]
    pub fn owner_number(&self) -> Option<u32> {
        self.owner_id
            .strip_prefix(OWNER_ID_PREFIX)
            .and_then(|n| n.parse().ok())
    }
}

impl fmt::Display for SampledParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{:02}", self.owner_id, self.year, self.month)
    }
}

/// Draws [`SampledParameters`] inside a set of bounds.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSampler {
    bounds: SamplingBounds,
}

impl ParameterSampler {
    /// Create a sampler over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GeneratorError::InvalidBounds`] if a range is empty
    /// or out of domain.
    pub fn new(bounds: SamplingBounds) -> GeneratorResult<Self> {
        bounds.validate()?;
        Ok(Self { bounds })
    }

    /// Wrap bounds that already passed [`SamplingBounds::validate`].
    pub(crate) const fn from_validated(bounds: SamplingBounds) -> Self {
        Self { bounds }
    }

    /// Sample with the thread RNG, anchored at the current UTC year.
    #[must_use]
    pub fn sample(&self) -> SampledParameters {
        self.sample_with(&mut rand::thread_rng(), Utc::now().year())
    }

    /// Sample with a caller-supplied RNG and reference year.
    ///
    /// Owner id is drawn from `[owner_id_min, owner_id_max)`, year from
    /// `[current_year, current_year + year_span)` and month from
    /// `[month_min, month_max)`. The year window is clamped at `i32::MAX`.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R, current_year: i32) -> SampledParameters {
        let b = &self.bounds;
        let owner_number = rng.gen_range(b.owner_id_min..b.owner_id_max);
        let last_year = current_year.saturating_add(b.year_span.max(1) - 1);
        let year = rng.gen_range(current_year..=last_year);
        let month = rng.gen_range(b.month_min..b.month_max);
        SampledParameters::new(owner_number, year, month)
    }

    /// Bounds in use.
    #[must_use]
    pub const fn bounds(&self) -> &SamplingBounds {
        &self.bounds
    }
}

impl Default for ParameterSampler {
    fn default() -> Self {
        Self::from_validated(SamplingBounds::default())
    }
}
