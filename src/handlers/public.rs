use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service description
pub async fn root() -> ApiResponse<Value> {
    let version = env!("CARGO_PKG_VERSION");

    ApiResponse::success(json!({
        "name": "CRUD API (Rust)",
        "version": version,
        "description": "Generic CRUD repository with derived finders and paging",
        "endpoints": {
            "home": "/",
            "health": "/health",
            "books": "/books[/:id]",
            "data": "/api/data/:schema[/:id]",
            "find": "/api/find/:schema[/:finder]",
        }
    }))
}

/// GET /health - store liveness and row counts
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let store = state.catalog.store().read().await;
    let mut collections = serde_json::Map::new();
    for name in store.collection_names() {
        collections.insert(name.clone(), json!(store.count(&name)?));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "collections": collections,
    })))
}
