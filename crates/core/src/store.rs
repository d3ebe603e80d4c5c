//! Persistence boundary errors shared by every store port.

use thiserror::Error;

/// Failure reported by a store adapter (in-memory or database-backed).
///
/// Callers treat `Unavailable` as an internal error: it is logged and
/// surfaced without detail. `Conflict` and `Invalid` carry business meaning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store refused the record (e.g. empty items, non-positive total).
    #[error("invalid record: {0}")]
    Invalid(String),

    /// The backing storage failed (connection, lock poisoning, decode).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
