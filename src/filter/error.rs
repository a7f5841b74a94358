use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Field '{field}' does not exist on {collection}")]
    SchemaMismatch { collection: String, field: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Finder {finder} expects {expected} argument(s), got {actual}")]
    ArgumentCountMismatch {
        finder: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid finder declaration: {0}")]
    InvalidFinder(String),

    #[error("Unknown finder '{finder}' on {collection}")]
    UnknownFinder { collection: String, finder: String },

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}
