mod common;

use artisan_marketplace_api::{
    build_app,
    middleware::auth::issue_token,
    models::Role,
    response::ApiResponse,
    routes::health::HealthData,
    services::listing_service::MAX_UPLOAD_BYTES,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;
use tower_http::limit::RequestBodyLimitLayer;

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = build_app(common::offline_state());
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}

#[tokio::test]
async fn health_check_reports_database_state() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);

    let response: ApiResponse<HealthData> = serde_json::from_value(body).unwrap();
    assert_eq!(response.message, "Health check");
    let data = response.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.database, "unavailable");
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let (status, body) = get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/api/nope");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    for uri in ["/api/users/me", "/api/artisans/me", "/api/orders"] {
        let (status, _) = get(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn inverted_price_range_is_rejected_before_querying() {
    let (status, body) = get("/api/listings?min_price=5000&max_price=100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("min_price cannot be greater than max_price")
    );
}

fn token(role: Role) -> String {
    issue_token(uuid::Uuid::new_v4(), role, common::JWT_SECRET).unwrap()
}

/// A listing-generation form with one JPEG part of `image_len` bytes, or none when zero.
fn generation_form(image_len: usize) -> Vec<u8> {
    let mut body = b"--X\r\nContent-Disposition: form-data; name=\"transcription\"\r\n\r\n\
A clay pot\r\n"
        .to_vec();
    if image_len > 0 {
        body.extend_from_slice(
            b"--X\r\nContent-Disposition: form-data; name=\"images\"; filename=\"pot.jpg\"\r\n\
Content-Type: image/jpeg\r\n\r\n",
        );
        body.extend(vec![0xAB; image_len]);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(b"--X--\r\n");
    body
}

async fn post_generation(
    app: Router,
    token: &str,
    form: Vec<u8>,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/listings/generate")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "multipart/form-data; boundary=X")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}

#[tokio::test]
async fn generate_rejects_buyers() {
    let app = build_app(common::offline_state());
    let (status, _) = post_generation(app, &token(Role::Buyer), generation_form(0)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn generate_reads_photos_larger_than_the_framework_default() {
    let app =
        build_app(common::offline_state()).layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES));
    let (status, body) =
        post_generation(app, &token(Role::Buyer), generation_form(3 * 1024 * 1024)).await;
    // the whole form was parsed, so the role check is what answers
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let app = build_app(common::offline_state());
    let (status, body) =
        post_generation(app, &token(Role::Artisan), generation_form(MAX_UPLOAD_BYTES + 1)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Payload Too Large")
    );
}
