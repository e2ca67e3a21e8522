//! Shared test utilities for the load generators.
//!
//! This crate provides:
//! - Proptest generators for URLs, reference years and TLS peers
//! - Sample base URLs
//! - TLS identities and an HTTPS endpoint for handshake tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod tls;

pub use generators::*;
