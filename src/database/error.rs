use std::collections::BTreeMap;
use thiserror::Error;

use crate::database::record::{RecordError, RecordId};
use crate::filter::error::FilterError;
use crate::pager::PagerError;

/// Errors surfaced by the store, repositories and relation helpers
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: String, id: RecordId },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Duplicate key: {collection}.{field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed for {collection}")]
    Validation {
        collection: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<PagerError> for RepositoryError {
    fn from(err: PagerError) -> Self {
        match err {
            PagerError::InvalidArgument(msg) => RepositoryError::InvalidArgument(msg),
        }
    }
}

impl RepositoryError {
    pub fn not_found(collection: impl Into<String>, id: RecordId) -> Self {
        RepositoryError::NotFound { collection: collection.into(), id }
    }
}
