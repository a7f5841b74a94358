// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::database::error::RepositoryError;
use crate::database::record::RecordError;
use crate::filter::error::FilterError;
use crate::pager::PagerError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body, using the same envelope as successes
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code(),
            "data": null,
            "timestamp": Utc::now(),
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<BTreeMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert other error types to ApiError
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } | RepositoryError::UnknownCollection(_) => {
                ApiError::not_found(err.to_string())
            }
            RepositoryError::DuplicateKey { .. } => ApiError::conflict(err.to_string()),
            RepositoryError::InvalidArgument(msg) => ApiError::bad_request(msg),
            RepositoryError::Validation { collection, field_errors } => ApiError::validation_error(
                format!("Validation failed for {}", collection),
                Some(field_errors),
            ),
            RepositoryError::Filter(e) => e.into(),
            RepositoryError::Record(e) => e.into(),
            RepositoryError::Serialization(e) => {
                // Log the real error but return generic message
                tracing::error!("Serialization error: {}", e);
                ApiError::internal_server_error("Failed to convert stored record")
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::UnknownFinder { .. } => ApiError::not_found(err.to_string()),
            FilterError::SchemaMismatch { ref collection, ref field } => {
                let mut field_errors = BTreeMap::new();
                field_errors.insert(field.clone(), format!("not a field of {}", collection));
                ApiError::validation_error(err.to_string(), Some(field_errors))
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::InvalidJson(msg) => ApiError::invalid_json(msg),
            RecordError::InvalidId(value) => {
                let mut field_errors = BTreeMap::new();
                field_errors.insert("id".to_string(), format!("Invalid id: {}", value));
                ApiError::validation_error("Invalid field format", Some(field_errors))
            }
        }
    }
}

impl From<PagerError> for ApiError {
    fn from(err: PagerError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status_code() >= 500 {
            tracing::error!("{}", self.message());
        }
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_status_codes() {
        let cases: Vec<(RepositoryError, u16)> = vec![
            (RepositoryError::not_found("books", 1), 404),
            (RepositoryError::UnknownCollection("planets".into()), 404),
            (
                RepositoryError::DuplicateKey { collection: "users".into(), field: "user_name".into(), value: "\"ann\"".into() },
                409,
            ),
            (RepositoryError::InvalidArgument("size must be positive".into()), 400),
            (FilterError::UnsupportedOperator("Roughly".into()).into(), 400),
            (
                FilterError::UnknownFinder { collection: "students".into(), finder: "findByX".into() }.into(),
                404,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn validation_errors_carry_field_messages() {
        let mut field_errors = BTreeMap::new();
        field_errors.insert("user_name".to_string(), "size must be between 3 and 12".to_string());
        let api: ApiError = RepositoryError::Validation { collection: "users".into(), field_errors }.into();
        let body = api.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["user_name"], "size must be between 3 and 12");
    }
}
