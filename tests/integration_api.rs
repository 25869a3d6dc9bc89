//! API integration tests
//!
//! Tests for the health endpoint, fallback routing and CORS using axum's
//! test utilities.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{body_json, body_string, context, get, router, send, Library};
use homereel::config::Config;

#[tokio::test]
async fn test_health_endpoint() {
    let ctx = context(Config::default());
    let before = chrono::Utc::now().timestamp_millis();

    let response = get(router(&ctx), "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], "1.0");
    assert!(json["serverTime"].as_i64().unwrap() >= before);
}

#[tokio::test]
async fn test_unknown_route_is_plain_text_404() {
    let ctx = context(Config::default());

    let response = get(router(&ctx), "/api/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body_string(response).await, "Not found");

    let response = get(router(&ctx), "/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_json_responses_allow_any_origin() {
    let library = Library::new();
    let ctx = context(library.config());

    for uri in ["/api/health", "/api/content", "/api/clients", "/api/channels"] {
        let request = Request::get(uri)
            .header(header::ORIGIN, "http://192.168.1.77:3000")
            .body(Body::empty())
            .unwrap();
        let response = send(router(&ctx), request).await;

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*",
            "{uri}"
        );
    }
}

#[tokio::test]
async fn test_cors_preflight() {
    let ctx = context(Config::default());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/clients/register")
        .header(header::ORIGIN, "http://phone.local")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = send(router(&ctx), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
