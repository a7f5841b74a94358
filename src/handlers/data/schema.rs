use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::api::format::{page_to_api_value, record_to_api_value, records_to_api_value};
use crate::app::AppState;
use crate::database::record::Record;
use crate::error::ApiError;
use crate::handlers::params::PageParams;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/data/:schema - all records, or one page when `page`/`size` is given
pub async fn get(
    State(state): State<AppState>,
    Path(schema): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let repo = state.catalog.dynamic(&schema).await?;

    let data = match params.page_request()? {
        Some(request) => json!(page_to_api_value(repo.find_page(&request).await?)),
        None => {
            let records = repo.find_all_sorted(&params.sort_spec()?).await?;
            json!(records_to_api_value(&records))
        }
    };
    Ok(ApiResponse::success(data))
}

/// POST /api/data/:schema - one object, or an array saved all-or-nothing
pub async fn post(
    State(state): State<AppState>,
    Path(schema): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(payload) = payload?;
    let repo = state.catalog.dynamic(&schema).await?;

    let data = match payload {
        Value::Array(items) => {
            let records = items
                .into_iter()
                .map(Record::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            let saved = repo.save_all(records).await?;
            json!(records_to_api_value(&saved))
        }
        object @ Value::Object(_) => record_to_api_value(&repo.save(Record::from_json(object)?).await?),
        _ => return Err(ApiError::invalid_json("Expected a JSON object or array of objects")),
    };
    Ok(ApiResponse::created(data))
}

/// DELETE /api/data/:schema - remove every record
pub async fn delete(State(state): State<AppState>, Path(schema): Path<String>) -> ApiResult<()> {
    let repo = state.catalog.dynamic(&schema).await?;
    let removed = repo.delete_all().await?;
    tracing::info!("Deleted {} record(s) from {}", removed, schema);
    Ok(ApiResponse::no_content())
}
