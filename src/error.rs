// src/error.rs
//! Resolver-level error taxonomy.
//!
//! `NotFound` and redirects are outcomes, not errors: see
//! [`crate::articles::ArticleResolution`]. Conflicts never get this far; the
//! subscription writer turns them into an outcome of its own.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Transient store fault or timeout. Pages degrade to the empty state.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A persisted payload did not have the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<StoreError> for ResolveError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Decode(msg) => ResolveError::MalformedPayload(msg),
            // Reads never conflict; a rejected read is as useless to a page as a dead store.
            other => ResolveError::StoreUnavailable(other.to_string()),
        }
    }
}
