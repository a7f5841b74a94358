use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::format::{page_to_api_value, records_to_api_value};
use crate::app::AppState;
use crate::filter::{Filter, FilterData};
use crate::middleware::{ApiResponse, ApiResult};
use crate::pager::PageRequest;

/// POST /api/find/:schema - filtered find with the JSON where-language
///
/// Body: `{ "where": {...}, "order": "marks desc", "limit": 10 }`, or with
/// `page`/`size` for a paged result.
pub async fn find_post(
    State(state): State<AppState>,
    Path(schema): Path<String>,
    payload: Result<Json<FilterData>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(filter_data) = payload?;
    let repo = state.catalog.dynamic(&schema).await?;

    let paging = (filter_data.page.is_some() || filter_data.size.is_some())
        .then(|| PageRequest::from_params(filter_data.page, filter_data.size))
        .transpose()?;

    let mut filter = Filter::new(repo.schema().clone());
    filter.assign(filter_data)?;

    let data = match paging {
        Some(request) => json!(page_to_api_value(repo.select_page(&filter, &request).await?)),
        None => json!(records_to_api_value(&repo.select(&filter).await?)),
    };
    Ok(ApiResponse::success(data))
}
