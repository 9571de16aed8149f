//! Error types for the data layer.
//!
//! Propagation policy: read paths recover locally (fall back to the snapshot
//! store and return what they have), so `DataError` is only ever surfaced
//! from write paths and lookups. Schema mismatches and malformed rows never
//! reach this type; they are absorbed by the relational adapter's retry and
//! the record mapper respectively.

use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("remote backend: {0}")]
    Remote(#[from] RemoteError),

    #[error("serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("no {kind} record with id {id}")]
    NotFound {
        kind: crate::types::EntityKind,
        id: String,
    },

    #[error("status '{0}' cannot be advanced")]
    StatusNotAdvanceable(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("configuration: {0}")]
    Config(String),
}

impl DataError {
    /// True for failures a caller may reasonably retry (network trouble,
    /// rate limits, server errors). Schema and validation problems are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, DataError::Remote(remote) if remote.is_transient())
    }
}
