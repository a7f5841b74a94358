mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn unknown_collection_is_not_found() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.get(server.url("/api/data/planets")).send().await?;
    let body = common::envelope(res, StatusCode::NOT_FOUND).await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn list_students_sorted() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .get(server.url("/api/data/students?sort=student_name,desc"))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(common::names(&body["data"], "student_name"), ["Ratan", "Ram", "Rakesh", "Rahul"]);
    Ok(())
}

#[tokio::test]
async fn page_through_students() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .get(server.url("/api/data/students?page=1&size=3&sort=student_name"))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::OK).await?;
    let page = &body["data"];
    assert_eq!(page["pageNumber"], 1);
    assert_eq!(page["pageSize"], 3);
    assert_eq!(page["totalElements"], 4);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["last"], true);
    assert_eq!(common::names(&page["content"], "student_name"), ["Ratan"]);

    // Past the end is an empty page, not an error
    let res = server.client.get(server.url("/api/data/students?page=5&size=3")).send().await?;
    let body = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(body["data"]["content"], json!([]));
    assert_eq!(body["data"]["totalElements"], 4);
    assert_eq!(body["data"]["last"], true);
    Ok(())
}

#[tokio::test]
async fn invalid_page_arguments_are_rejected() -> Result<()> {
    let server = common::start_server().await?;

    for query in ["page=-1&size=2", "page=0&size=0"] {
        let res = server.client.get(server.url(&format!("/api/data/students?{}", query))).send().await?;
        let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
        assert_eq!(body["code"], "BAD_REQUEST", "query {}", query);
    }
    Ok(())
}

#[tokio::test]
async fn create_single_and_batch() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/api/data/students"))
        .json(&json!({"student_name": "Ravi", "marks": 75, "result": "Pass"}))
        .send()
        .await?;
    let one = common::envelope(res, StatusCode::CREATED).await?;
    assert_eq!(one["data"]["id"], 5);

    let res = server
        .client
        .post(server.url("/api/data/students"))
        .json(&json!([{"student_name": "Rekha"}, {"student_name": "Rohan", "marks": 40}]))
        .send()
        .await?;
    let batch = common::envelope(res, StatusCode::CREATED).await?;
    assert_eq!(common::names(&batch["data"], "student_name"), ["Rekha", "Rohan"]);
    assert_eq!(batch["data"][1]["id"], 7);
    Ok(())
}

#[tokio::test]
async fn failing_batch_saves_nothing() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/api/data/students"))
        .json(&json!([{"student_name": "Valid"}, {"student_name": "Invalid", "marks": 250}]))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let res = server.client.get(server.url("/api/data/students")).send().await?;
    let all = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(all["data"].as_array().map(Vec::len), Some(4));
    Ok(())
}

#[tokio::test]
async fn unknown_fields_fail_validation() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/api/data/students"))
        .json(&json!({"student_name": "Ravi", "nickname": "R"}))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["field_errors"]["nickname"], "unknown field");
    Ok(())
}

#[tokio::test]
async fn put_replaces_and_patch_merges() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .patch(server.url("/api/data/students/2"))
        .json(&json!({"id": 42, "result": "Fail"}))
        .send()
        .await?;
    let patched = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(patched["data"]["id"], 2, "id in a patch body is ignored");
    assert_eq!(patched["data"]["result"], "Fail");
    assert_eq!(patched["data"]["marks"], 90);

    let res = server
        .client
        .put(server.url("/api/data/students/2"))
        .json(&json!({"student_name": "Ram"}))
        .send()
        .await?;
    let replaced = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(replaced["data"]["student_name"], "Ram");
    assert!(replaced["data"]["marks"].is_null());

    let res = server
        .client
        .put(server.url("/api/data/students/99"))
        .json(&json!({"student_name": "Nobody"}))
        .send()
        .await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;
    Ok(())
}

#[tokio::test]
async fn unique_fields_conflict() -> Result<()> {
    let server = common::start_server().await?;

    let user = json!({"user_name": "rahul", "user_email": "rahul@example.com"});
    let res = server.client.post(server.url("/api/data/users")).json(&user).send().await?;
    common::envelope(res, StatusCode::CREATED).await?;

    let res = server.client.post(server.url("/api/data/users")).json(&user).send().await?;
    let body = common::envelope(res, StatusCode::CONFLICT).await?;
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn delete_record_and_collection() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.delete(server.url("/api/data/students/1")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.client.get(server.url("/api/data/students/1")).send().await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;

    let res = server.client.delete(server.url("/api/data/students")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.client.get(server.url("/api/data/students")).send().await?;
    let body = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn id_sequence_is_never_reused() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .client
        .post(server.url("/api/data/students"))
        .json(&json!({"id": i64::MAX, "student_name": "Max", "marks": 50}))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "BAD_REQUEST");

    let res = server
        .client
        .post(server.url("/api/data/students"))
        .json(&json!({"student_name": "Next", "marks": 50}))
        .send()
        .await?;
    let body = common::envelope(res, StatusCode::CREATED).await?;
    assert_eq!(body["data"]["id"], 5);

    let res = server.client.get(server.url("/api/data/students")).send().await?;
    let body = common::envelope(res, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[tokio::test]
async fn put_after_delete_does_not_resurrect() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.delete(server.url("/api/data/students/2")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server
        .client
        .put(server.url("/api/data/students/2"))
        .json(&json!({"student_name": "Ram", "marks": 60}))
        .send()
        .await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;

    let res = server.client.get(server.url("/api/data/students/2")).send().await?;
    common::envelope(res, StatusCode::NOT_FOUND).await?;
    Ok(())
}

#[tokio::test]
async fn malformed_path_and_query_use_the_error_envelope() -> Result<()> {
    let server = common::start_server().await?;

    for path in [
        "/api/data/students/abc",
        "/api/data/students?page=x",
        "/books/abc",
        "/books/abc/author",
    ] {
        let res = server.client.get(server.url(path)).send().await?;
        let body = common::envelope(res, StatusCode::BAD_REQUEST).await?;
        assert_eq!(body["code"], "BAD_REQUEST", "path {}", path);
        assert!(body["timestamp"].is_string(), "path {}", path);
    }

    let res = server
        .client
        .post(server.url("/api/find/students/findByStudentName?size=big"))
        .json(&json!(["Rahul"]))
        .send()
        .await?;
    common::envelope(res, StatusCode::BAD_REQUEST).await?;
    Ok(())
}
