//! Gateway to the legislative open-data API.
//!
//! The portal speaks a loose dialect: opaque endpoint identifiers, two
//! different success-envelope shapes, and a `RESULT` object whose "no
//! matching data" code is not an error. This module hides all of that:
//! callers deal in flat record lists and a small trait.
//!
//! # Architecture
//!
//! - [`AssemblyApiClient`]: trait defining the gateway operations
//! - [`HttpAssemblyClient`]: real HTTP implementation using reqwest,
//!   carrying the proposer-lookup circuit breaker on the client value
//! - [`mock::MockAssemblyClient`]: scripted mock for unit tests (behind
//!   the `test-utils` feature)
//! - [`envelope`]: pure envelope normalization and result classification

mod client;
pub mod envelope;
mod types;

pub use client::{ApiClientError, AssemblyApiClient, HttpAssemblyClient, MAX_PROPOSER_FAILURES};
pub use types::{ProposerInfo, RawRecord};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;
