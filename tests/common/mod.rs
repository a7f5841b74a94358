#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;

use crud_api_rust::app::{self, AppState};
use crud_api_rust::database::manager::Catalog;
use crud_api_rust::services::seed;

/// An in-process server on its own port with its own seeded store. Each test
/// starts one, so tests never see each other's writes.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let catalog = Catalog::with_defaults().await?;
        seed::seed_demo(&catalog).await?;
        let state = AppState::new(catalog).await?;

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(app::serve_with_listener(listener, state));

        Ok(Self { port, base_url, client: reqwest::Client::new() })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline { break; }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Reads the body as JSON and checks the status and `success` flag agree.
pub async fn envelope(res: reqwest::Response, expected: StatusCode) -> Result<Value> {
    let status = res.status();
    let body: Value = res.json().await?;
    assert_eq!(status, expected, "unexpected status, body: {}", body);
    assert_eq!(body["success"], Value::Bool(expected.is_success()), "body: {}", body);
    Ok(body)
}

/// Collects one string field from an array of records.
pub fn names(records: &Value, field: &str) -> Vec<String> {
    records
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item[field].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
