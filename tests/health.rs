use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use cafe_pos_api::{
    domain::status::Role,
    events::EventBus,
    routes::{create_app, health::health_check},
    services::auth_service::issue_token,
    state::AppState,
};
use chrono::FixedOffset;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use tower::ServiceExt;
use uuid::Uuid;

fn offline_state() -> AppState {
    AppState {
        orm: DatabaseConnection::Disconnected,
        events: EventBus::default(),
        table_reset_delay: Duration::from_secs(10),
        business_offset: FixedOffset::east_opt(0).expect("utc offset"),
    }
}

fn ensure_jwt_secret() {
    if std::env::var("JWT_SECRET").is_err() {
        // SAFETY: every test in this binary writes the same value.
        unsafe { std::env::set_var("JWT_SECRET", "router-test-secret") };
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");
    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.service, "cafe-pos-api");
}

#[tokio::test]
async fn health_route_is_mounted() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_path_returns_json_404() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(Request::get("/nope/here").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/nope/here");
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Unauthorized");
    assert_eq!(body["data"]["error"], "Unauthorized");
}

#[tokio::test]
async fn malformed_bearer_token_is_unauthorized() {
    ensure_jwt_secret();
    let app = create_app(offline_state());
    let response = app
        .oneshot(
            Request::get("/api/orders")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customer_token_cannot_reach_staff_routes() {
    ensure_jwt_secret();
    let token = format!(
        "Bearer {}",
        issue_token(Uuid::new_v4(), Role::Customer.as_str()).unwrap()
    );

    for uri in ["/api/tables", "/api/admin/orders", "/api/invoices", "/api/analytics/sales"] {
        let app = create_app(offline_state());
        let response = app
            .oneshot(
                Request::get(uri)
                    .header(header::AUTHORIZATION, &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn docs_are_served() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
