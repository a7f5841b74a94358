use crud_api_rust::{app, config, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up APP_ENV, API_PORT, etc.
    let _ = dotenvy::dotenv();

    logging::init();

    let config = config::config();
    tracing::info!("Starting CRUD API in {:?} mode", config.environment);

    let state = app::build_state().await?;
    app::serve(app::bind_addr()?, state).await
}
