use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
};
use serde_json::{json, Value};

use crate::api::format::{page_to_api_value, records_to_api_value};
use crate::app::AppState;
use crate::database::dynamic::FinderResult;
use crate::error::ApiError;
use crate::handlers::params::PageParams;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/find/:schema - declared finders and their argument counts
pub async fn list(State(state): State<AppState>, Path(schema): Path<String>) -> ApiResult<Value> {
    let finders = state.catalog.finders(&schema).await?;
    let data: Vec<Value> = finders
        .iter()
        .map(|finder| {
            json!({
                "name": finder.name(),
                "kind": finder.finder_kind(),
                "arity": finder.arity(),
                "limit": finder.max_results(),
                "order": finder.order(),
            })
        })
        .collect();
    Ok(ApiResponse::success(json!(data)))
}

/// An empty body means no arguments; otherwise a JSON array, one element per
/// argument in declaration order.
fn parse_args(body: &Bytes) -> Result<Vec<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(vec![]);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(args)) => Ok(args),
        Ok(_) => Err(ApiError::invalid_json("Finder arguments must be a JSON array")),
        Err(e) => Err(ApiError::invalid_json(e.to_string())),
    }
}

/// POST /api/find/:schema/:finder - run a declared finder
pub async fn run(
    State(state): State<AppState>,
    Path((schema, name)): Path<(String, String)>,
    params: Result<Query<PageParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let args = parse_args(&body)?;
    let repo = state.catalog.dynamic(&schema).await?;
    let finder = state.catalog.finder(&schema, &name).await?;

    let data = match params.page_request()? {
        Some(request) => json!(page_to_api_value(repo.find_page_by(&finder, args, &request).await?)),
        None => match repo.execute(&finder, args).await? {
            FinderResult::Records(records) => json!(records_to_api_value(&records)),
            FinderResult::Count(count) => json!(count),
            FinderResult::Exists(exists) => json!(exists),
        },
    };
    Ok(ApiResponse::success(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_argument_bodies() {
        assert_eq!(parse_args(&Bytes::from_static(b"")).unwrap(), Vec::<Value>::new());
        assert_eq!(parse_args(&Bytes::from_static(b"[\"Rahul\", 1]")).unwrap(), vec![json!("Rahul"), json!(1)]);
        assert!(parse_args(&Bytes::from_static(b"{\"a\":1}")).is_err());
        assert!(parse_args(&Bytes::from_static(b"[oops")).is_err());
    }
}
