//! Invoice request URI composition.
//!
//! The base URL must parse as an absolute URI; the request path is then
//! resolved against it, replacing any path the base carries.

use crate::config::INGEST_URL_PARAM;
use crate::error::{GeneratorError, GeneratorResult};
use crate::sampler::SampledParameters;
use url::Url;

/// Path of the invoice lookup endpoint.
pub const INVOICES_PATH: &str = "/api/invoices";

/// Relative reference for an invoice lookup.
#[must_use]
pub fn invoice_path(params: &SampledParameters) -> String {
    format!(
        "{INVOICES_PATH}?ownerId={}&year={}&month={}",
        params.owner_id, params.year, params.month
    )
}

/// Build the absolute invoice lookup URI for `params`.
///
/// # Errors
///
/// - [`GeneratorError::MissingBaseUrl`] if `base_url` is `None` or empty.
/// - [`GeneratorError::InvalidBaseUrl`] if it is not an absolute URI.
/// - [`GeneratorError::InvalidRequestUri`] if the invoice path cannot be
///   resolved against it (for example a `mailto:` base).
///
/// # Examples
///
/// ```
/// use invoice_loadgen::sampler::SampledParameters;
/// use invoice_loadgen::uri::build_invoice_uri;
///
/// let params = SampledParameters::new(5, 2025, 7);
/// let uri = build_invoice_uri(Some("https://svc.example.com"), &params).unwrap();
/// assert_eq!(
///     uri.as_str(),
///     "https://svc.example.com/api/invoices?ownerId=o0005&year=2025&month=7"
/// );
/// ```
pub fn build_invoice_uri(base_url: Option<&str>, params: &SampledParameters) -> GeneratorResult<Url> {
    let base_url = match base_url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(GeneratorError::missing_base_url(INGEST_URL_PARAM)),
    };

    let base = Url::parse(base_url).map_err(|e| GeneratorError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let path = invoice_path(params);
    base.join(&path).map_err(|e| GeneratorError::InvalidRequestUri {
        url: format!("{base_url}{INVOICES_PATH}"),
        reason: e.to_string(),
    })
}
