use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde_json::Value;

use crate::api::format::record_to_api_value;
use crate::app::AppState;
use crate::database::record::{Record, RecordId, ID_FIELD};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/data/:schema/:id
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<(String, RecordId)>, PathRejection>,
) -> ApiResult<Value> {
    let Path((schema, id)) = path?;
    let repo = state.catalog.dynamic(&schema).await?;
    let record = repo.get_by_id(id).await?;
    Ok(ApiResponse::success(record_to_api_value(&record)))
}

/// PUT /api/data/:schema/:id - full replace; the record must exist
pub async fn put(
    State(state): State<AppState>,
    path: Result<Path<(String, RecordId)>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Path((schema, id)) = path?;
    let Json(payload) = payload?;
    let repo = state.catalog.dynamic(&schema).await?;
    let saved = repo.replace(id, Record::from_json(payload)?).await?;
    Ok(ApiResponse::success(record_to_api_value(&saved)))
}

/// PATCH /api/data/:schema/:id - merge the given fields
pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<(String, RecordId)>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Path((schema, id)) = path?;
    let Json(payload) = payload?;
    let Value::Object(mut changes) = payload else {
        return Err(ApiError::invalid_json("Expected a JSON object"));
    };
    // The identity is immutable
    changes.remove(ID_FIELD);

    let repo = state.catalog.dynamic(&schema).await?;
    let updated = repo.update_fields(id, changes).await?;
    Ok(ApiResponse::success(record_to_api_value(&updated)))
}

/// DELETE /api/data/:schema/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<(String, RecordId)>, PathRejection>,
) -> ApiResult<()> {
    let Path((schema, id)) = path?;
    let repo = state.catalog.dynamic(&schema).await?;
    repo.delete_by_id(id).await?;
    Ok(ApiResponse::no_content())
}
