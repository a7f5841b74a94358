use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::CONFIG;
use crate::database::{error::RepositoryError, manager::Catalog};
use crate::handlers;
use crate::middleware::{make_request_span, propagate_request_id, set_request_id};
use crate::services::{seed, BookService};

/// Shared handler state. Both halves are cheap clones over the same store.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub books: BookService,
}

impl AppState {
    pub async fn new(catalog: Catalog) -> Result<Self, RepositoryError> {
        let books = BookService::new(&catalog).await?;
        Ok(Self { catalog, books })
    }
}

/// Registers the built-in collections and, when configured, seeds demo rows.
pub async fn build_state() -> Result<AppState, RepositoryError> {
    let catalog = Catalog::with_defaults().await?;
    if CONFIG.store.seed_demo_data {
        seed::seed_demo(&catalog).await?;
    }
    AppState::new(catalog).await
}

pub fn app(state: AppState) -> Router {
    let cors = if CONFIG.api.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(book_routes())
        .merge(data_routes())
        .merge(find_routes());

    let router = if CONFIG.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http().make_span_with(make_request_span))
    } else {
        router
    };

    // Request id outermost so the trace span can read it
    router
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id())
                .layer(propagate_request_id())
                .layer(cors),
        )
        .with_state(state)
}

fn book_routes() -> Router<AppState> {
    use handlers::books;

    Router::new()
        .route("/books", get(books::list).post(books::create).delete(books::delete_all))
        .route("/books/with-author", post(books::create_with_author))
        .route("/books/:id", get(books::get).put(books::update).delete(books::delete))
        .route("/books/:id/author", get(books::author))
}

fn data_routes() -> Router<AppState> {
    use handlers::data;

    Router::new()
        // Collection-level operations
        .route(
            "/api/data/:schema",
            get(data::schema_get).post(data::schema_post).delete(data::schema_delete),
        )
        // Record-level operations
        .route(
            "/api/data/:schema/:id",
            get(data::record_get)
                .put(data::record_put)
                .patch(data::record_patch)
                .delete(data::record_delete),
        )
}

fn find_routes() -> Router<AppState> {
    use handlers::find;

    Router::new()
        .route("/api/find/:schema", get(find::finder_list).post(find::find_post))
        .route("/api/find/:schema/:finder", post(find::finder_run))
}

/// Serves on an already-bound listener until the task is dropped.
pub async fn serve_with_listener(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("CRUD API listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;
    serve_with_listener(listener, state).await
}

/// Bind address from `api.host` and `api.port`.
pub fn bind_addr() -> anyhow::Result<SocketAddr> {
    let raw = format!("{}:{}", CONFIG.api.host, CONFIG.api.port);
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {}: {}", raw, e))
}
