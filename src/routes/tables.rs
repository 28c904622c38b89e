use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::tables::{
        CreateTableRequest, SetTableStatusRequest, TableDetail, TableList, UpdateTableRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::DiningTable,
    response::ApiResponse,
    routes::params::TableQuery,
    services::table_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tables).post(create_table))
        .route(
            "/{id}",
            get(get_table).patch(update_table).delete(delete_table),
        )
        .route("/{id}/status", patch(set_table_status))
}

#[utoipa::path(
    get,
    path = "/api/tables",
    params(
        ("area" = Option<String>, Query, description = "Filter by area"),
        ("status" = Option<String>, Query, description = "Filter by status: available, serving, completed")
    ),
    responses(
        (status = 200, description = "Floor plan", body = ApiResponse<TableList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TableQuery>,
) -> AppResult<Json<ApiResponse<TableList>>> {
    let resp = table_service::list_tables(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Table with its current order", body = ApiResponse<TableDetail>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn get_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TableDetail>>> {
    let resp = table_service::get_table(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Create table", body = ApiResponse<DiningTable>),
        (status = 400, description = "Invalid input or duplicate name"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn create_table(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTableRequest>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = table_service::create_table(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    request_body = UpdateTableRequest,
    responses(
        (status = 200, description = "Update table", body = ApiResponse<DiningTable>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn update_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTableRequest>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = table_service::update_table(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Delete table"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Table is in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn delete_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = table_service::delete_table(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/tables/{id}/status",
    params(("id" = Uuid, Path, description = "Table ID")),
    request_body = SetTableStatusRequest,
    responses(
        (status = 200, description = "Manual status override", body = ApiResponse<DiningTable>),
        (status = 400, description = "Serving cannot be forced"),
        (status = 409, description = "Table still has an open order")
    ),
    security(("bearer_auth" = [])),
    tag = "Tables"
)]
pub async fn set_table_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTableStatusRequest>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = table_service::set_table_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
