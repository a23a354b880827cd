//! API route behavior, driven through the router without a socket.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mailstudio_rs::api::ApiServer;
use mailstudio_rs::storage::{EmbeddedAdapter, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_router() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(Storage::new(Arc::new(EmbeddedAdapter::new(dir.path()))));
    storage.connect().await.unwrap();
    let server = ApiServer::new(storage, "127.0.0.1:0");
    let router = server.router();
    (dir, router)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn email_payload(title: &str) -> Value {
    json!({
        "title": title,
        "content": format!("<p>{}</p>", title),
        "design": "{}"
    })
}

fn design_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": "a design",
        "design": { "rows": [] }
    })
}

fn provider_payload(name: &str) -> Value {
    json!({
        "name": name,
        "type": "SMTP",
        "config": "{\"host\":\"smtp.example.com\",\"port\":587,\"secure\":false}",
        "senderEmail": "sender@example.com"
    })
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (_dir, router) = test_router().await;
    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn email_crud_over_http() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/emails", email_payload("Hello")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "DRAFT");

    let response = router
        .clone()
        .oneshot(get(&format!("/api/emails/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/emails/{}", id),
            json!({ "status": "PUBLISHED" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "PUBLISHED");
    assert_eq!(updated["title"], "Hello");

    let response = router
        .clone()
        .oneshot(delete(&format!("/api/emails/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(get(&format!("/api/emails/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn email_creation_requires_all_fields() {
    let (_dir, router) = test_router().await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/emails",
            json!({ "title": "No body", "content": "", "design": "{}" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn design_creation_applies_defaults_and_rejects_duplicates() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/designs", design_payload("Mine")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["thumbnail"], "/designs/custom-thumb.png");
    assert_eq!(created["isActive"], true);
    assert_eq!(created["isSystem"], false);

    let response = router
        .oneshot(json_request("POST", "/api/designs", design_payload("Mine")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn api_created_designs_are_never_system_designs() {
    let (_dir, router) = test_router().await;

    let mut payload = design_payload("Sneaky");
    payload["isSystem"] = json!(true);

    let response = router
        .oneshot(json_request("POST", "/api/designs", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["isSystem"], false);
}

#[tokio::test]
async fn design_rename_conflicts_against_other_designs() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/designs", design_payload("First")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/designs", design_payload("Second")))
        .await
        .unwrap();
    let second = body_json(response).await;
    let second_id = second["id"].as_str().unwrap();

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/designs/{}", second_id),
            json!({ "name": "First" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A self-rename passes the check.
    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/designs/{}", second_id),
            json!({ "name": "Second", "description": "still second" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn provider_listing_supports_active_filter() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/providers",
            provider_payload("On"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut off = provider_payload("Off");
    off["isActive"] = json!(false);
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/providers", off))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router.clone().oneshot(get("/api/providers")).await.unwrap();
    let all = body_json(response).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let response = router
        .oneshot(get("/api/providers?active=true"))
        .await
        .unwrap();
    let active = body_json(response).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["name"], "On");
}

#[tokio::test]
async fn unknown_provider_type_is_a_bad_request_with_json_body() {
    let (_dir, router) = test_router().await;

    let mut payload = provider_payload("Mystery");
    payload["type"] = json!("POSTMARK");

    let response = router
        .oneshot(json_request("POST", "/api/providers", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("provider"));
}

#[tokio::test]
async fn send_validates_email_and_provider_existence() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/send",
            json!({ "emailId": "missing", "to": "a@b.com", "providerId": "missing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/send",
            json!({ "emailId": "", "to": "", "providerId": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sending_through_an_inactive_provider_is_rejected() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/emails", email_payload("Send me")))
        .await
        .unwrap();
    let email = body_json(response).await;

    let mut provider = provider_payload("Disabled");
    provider["isActive"] = json!(false);
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/providers", provider))
        .await
        .unwrap();
    let provider = body_json(response).await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/send",
            json!({
                "emailId": email["id"],
                "to": "a@b.com",
                "providerId": provider["id"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("active"));
}

#[tokio::test]
async fn provider_test_rejects_missing_recipient_and_unknown_provider() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/providers/some-id/test",
            json!({ "to": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/providers/some-id/test",
            json!({ "to": "a@b.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_provider_config_is_a_bad_request_at_send_time() {
    let (_dir, router) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/providers",
            json!({
                "name": "Broken",
                "type": "SMTP",
                "config": "not json",
                "senderEmail": "sender@example.com"
            }),
        ))
        .await
        .unwrap();
    // Config is opaque at rest; it only parses at send time.
    assert_eq!(response.status(), StatusCode::CREATED);
    let provider = body_json(response).await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/send/test",
            json!({
                "providerId": provider["id"],
                "to": "a@b.com",
                "subject": "s",
                "html": "<p>hi</p>"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
