mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_reports_collection_counts() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    let body = common::envelope(res, StatusCode::OK).await?;

    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["collections"]["students"], 4);
    assert_eq!(body["data"]["collections"]["books"], 3);
    Ok(())
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .get(server.url("/"))
        .header("x-request-id", "test-123")
        .send()
        .await?;
    assert_eq!(res.headers().get("x-request-id").and_then(|v| v.to_str().ok()), Some("test-123"));

    let res = server.client.get(server.url("/")).send().await?;
    let generated = res.headers().get("x-request-id").and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert_eq!(generated.len(), 36, "expected a uuid, got {:?}", generated);
    Ok(())
}

#[tokio::test]
async fn create_then_fetch_book() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/books"))
        .json(&json!({"id": 99, "book_name": "Deep Work", "book_author": "Newport", "price": "15.00"}))
        .send()
        .await?;
    let created = common::envelope(res, StatusCode::CREATED).await?;
    let id = created["data"]["id"].as_i64().expect("id assigned");
    assert_eq!(id, 4, "client-supplied id is ignored");

    let res = server.client.get(server.url(&format!("/books/{}", id))).send().await?;
    let fetched = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(fetched["data"]["book_name"], "Deep Work");
    assert_eq!(fetched["data"]["book_author"], "Newport");

    let res = server.client.get(server.url("/books")).send().await?;
    let all = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(all["data"].as_array().map(Vec::len), Some(4));
    Ok(())
}

#[tokio::test]
async fn update_replaces_existing_and_rejects_missing() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .put(server.url("/books/1"))
        .json(&json!({"book_name": "Renamed", "book_author": "ABC"}))
        .send()
        .await?;
    let updated = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(updated["data"]["id"], 1);
    assert_eq!(updated["data"]["book_name"], "Renamed");

    let res = server
        .client
        .put(server.url("/books/404"))
        .json(&json!({"book_name": "Ghost"}))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::NOT_FOUND).await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn delete_book_then_get_is_not_found() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.delete(server.url("/books/2")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.client.get(server.url("/books/2")).send().await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;

    let res = server.client.delete(server.url("/books/2")).send().await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;
    Ok(())
}

#[tokio::test]
async fn delete_all_books_empties_collection() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.delete(server.url("/books")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.client.get(server.url("/books")).send().await?;
    let body = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn blank_book_name_is_a_validation_error() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/books"))
        .json(&json!({"book_name": "  ", "book_author": "Nobody"}))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["book_name"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/books"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn book_with_author_is_linked() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/books/with-author"))
        .json(&json!({
            "book": {"book_name": "Dune", "book_author": "Herbert"},
            "author": {"first_name": "Frank", "last_name": "Herbert"}
        }))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::CREATED).await?;
    let book_id = body["data"]["book"]["id"].as_i64().expect("book id");
    let author_id = body["data"]["author"]["id"].as_i64().expect("author id");
    assert_eq!(body["data"]["book"]["author_id"], author_id);

    let res = server.client.get(server.url(&format!("/books/{}/author", book_id))).send().await?;
    let author = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(author["data"]["last_name"], "Herbert");

    let res = server.client.get(server.url("/books/1/author")).send().await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;
    Ok(())
}
