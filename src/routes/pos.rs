use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::OrderWithItems,
        pos::{
            AddItemsRequest, CompleteOrderRequest, CompletedOrder, OpenTableOrderRequest,
            QuickCheckoutRequest, WalkInOrderRequest,
        },
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::pos_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/table-orders", post(open_table_order))
        .route("/walk-in", post(walk_in_order))
        .route("/quick-checkout", post(quick_checkout))
        .route("/orders/{id}/items", post(add_items))
        .route("/orders/{id}/complete", post(complete_order))
}

#[utoipa::path(
    post,
    path = "/api/pos/table-orders",
    request_body = OpenTableOrderRequest,
    responses(
        (status = 200, description = "Seat a table and open its order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid items or unknown table"),
        (status = 409, description = "Table is already serving")
    ),
    security(("bearer_auth" = [])),
    tag = "POS"
)]
pub async fn open_table_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OpenTableOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = pos_service::open_table_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pos/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddItemsRequest,
    responses(
        (status = 200, description = "Append items to an open order", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is closed")
    ),
    security(("bearer_auth" = [])),
    tag = "POS"
)]
pub async fn add_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemsRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = pos_service::add_items(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pos/walk-in",
    request_body = WalkInOrderRequest,
    responses(
        (status = 200, description = "Counter order without a table", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid items")
    ),
    security(("bearer_auth" = [])),
    tag = "POS"
)]
pub async fn walk_in_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<WalkInOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = pos_service::walk_in_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pos/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CompleteOrderRequest,
    responses(
        (status = 200, description = "Settle, invoice and close the order", body = ApiResponse<CompletedOrder>),
        (status = 400, description = "Payment method required"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is already closed")
    ),
    security(("bearer_auth" = [])),
    tag = "POS"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<CompleteOrderRequest>>,
) -> AppResult<Json<ApiResponse<CompletedOrder>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = pos_service::complete_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pos/quick-checkout",
    request_body = QuickCheckoutRequest,
    responses(
        (status = 200, description = "Create, pay and complete in one step", body = ApiResponse<CompletedOrder>),
        (status = 400, description = "Invalid items or discount")
    ),
    security(("bearer_auth" = [])),
    tag = "POS"
)]
pub async fn quick_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<QuickCheckoutRequest>,
) -> AppResult<Json<ApiResponse<CompletedOrder>>> {
    let resp = pos_service::quick_checkout(&state, &user, payload).await?;
    Ok(Json(resp))
}
