//! Test fixtures with sample data.

/// Base URL used throughout the examples.
pub const SAMPLE_BASE_URL: &str = "https://svc.example.com";

/// Host of [`SAMPLE_BASE_URL`].
pub const SAMPLE_HOST: &str = "svc.example.com";

/// Base URLs that must be rejected as configuration errors.
pub const INVALID_BASE_URLS: &[&str] = &["not a uri", "svc.example.com", "/api/invoices", "   "];

/// Base URLs that parse but cannot carry the invoice path.
pub const OPAQUE_BASE_URLS: &[&str] = &["mailto:ops@example.com", "data:text/plain,hello"];
