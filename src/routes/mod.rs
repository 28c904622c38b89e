use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod invoices;
pub mod live;
pub mod messages;
pub mod orders;
pub mod params;
pub mod pos;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod tables;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/favorites", favorites::router())
        .nest("/orders", orders::route())
        .nest("/admin", admin::router())
        .nest("/tables", tables::router())
        .nest("/pos", pos::router())
        .nest("/invoices", invoices::router())
        .nest("/analytics", analytics::router())
        .nest("/settings", settings::router())
        .nest("/reviews", reviews::router())
        .nest("/messages", messages::router())
        .nest("/live", live::router())
}

/// Health, API, docs and the JSON 404 fallback. Middleware layers are added by the binary.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
