use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::analytics::SalesReport,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::AnalyticsQuery,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/sales", get(sales_report))
}

#[utoipa::path(
    get,
    path = "/api/analytics/sales",
    params(
        ("from" = Option<String>, Query, description = "First day, YYYY-MM-DD, default 6 days before to"),
        ("to" = Option<String>, Query, description = "Last day, YYYY-MM-DD, default today"),
        ("limit" = Option<usize>, Query, description = "Top products to return, default 10")
    ),
    responses(
        (status = 200, description = "Revenue summary, daily and hourly series, top products", body = ApiResponse<SalesReport>),
        (status = 400, description = "Invalid range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let resp = analytics_service::sales_report(&state, &user, query).await?;
    Ok(Json(resp))
}
