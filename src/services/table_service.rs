use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::status::{OrderStatus, TableStatus},
    dto::tables::{CreateTableRequest, SetTableStatusRequest, TableDetail, TableList, UpdateTableRequest},
    entity::{
        dining_tables::{ActiveModel, Column, Entity as DiningTables, Model as TableModel},
        orders::Entity as Orders,
    },
    error::{AppError, AppResult},
    events::Resource,
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::DiningTable,
    response::ApiResponse,
    routes::params::TableQuery,
    services::order_service,
    state::AppState,
};

pub async fn list_tables(
    state: &AppState,
    user: &AuthUser,
    query: TableQuery,
) -> AppResult<ApiResponse<TableList>> {
    ensure_staff(user)?;
    let mut finder = DiningTables::find();
    if let Some(area) = query.area.as_ref().filter(|a| !a.is_empty()) {
        finder = finder.filter(Column::Area.eq(area.clone()));
    }
    if let Some(status) = query.status {
        finder = finder.filter(Column::Status.eq(status.as_str()));
    }

    let items = finder
        .order_by_asc(Column::Area)
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(DiningTable::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::ok("Tables", TableList { items }))
}

pub async fn get_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TableDetail>> {
    ensure_staff(user)?;
    let table = DiningTables::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let current_order = match table.current_order_id {
        Some(order_id) => match Orders::find_by_id(order_id).one(&state.orm).await? {
            Some(order) => Some(order_service::load_order_with_items(&state.orm, order).await?),
            None => None,
        },
        None => None,
    };

    Ok(ApiResponse::ok(
        "Table",
        TableDetail {
            table: DiningTable::try_from(table)?,
            current_order,
        },
    ))
}

pub async fn create_table(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTableRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    validate_capacity(payload.capacity)?;
    ensure_unique_name(state, &name, None).await?;

    let table = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        area: Set(payload.area.trim().to_string()),
        capacity: Set(payload.capacity),
        status: Set(TableStatus::Available.as_str().into()),
        current_order_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        Some(user.user_id),
        "table_create",
        "dining_tables",
        serde_json::json!({ "table_id": table.id }),
    )
    .await;

    let table = publish_table(state, "created", table)?;
    Ok(ApiResponse::ok("Table created", table))
}

pub async fn update_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTableRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    ensure_admin(user)?;
    let existing = DiningTables::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be empty".into()));
        }
        ensure_unique_name(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(area) = payload.area {
        active.area = Set(area.trim().to_string());
    }
    if let Some(capacity) = payload.capacity {
        validate_capacity(capacity)?;
        active.capacity = Set(capacity);
    }
    active.updated_at = Set(Utc::now().into());
    let table = active.update(&state.orm).await?;

    let table = publish_table(state, "updated", table)?;
    Ok(ApiResponse::ok("Table updated", table))
}

pub async fn delete_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let table = DiningTables::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if table.status.parse::<TableStatus>()? != TableStatus::Available {
        return Err(AppError::Conflict(format!(
            "Table {} is in use",
            table.name
        )));
    }

    DiningTables::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "table_delete",
        "dining_tables",
        serde_json::json!({ "table_id": id }),
    )
    .await;
    state
        .events
        .publish(Resource::Tables, "deleted", id, None, &serde_json::json!({ "id": id }));

    Ok(ApiResponse::ok("Deleted", serde_json::json!({})))
}

/// Manual override for tables stuck in the wrong state.
///
/// Marking a table `serving` requires a live order to point at, so only
/// `available` and `completed` can be forced here.
pub async fn set_table_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetTableStatusRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    ensure_staff(user)?;
    let table = DiningTables::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.status == TableStatus::Serving {
        return Err(AppError::BadRequest(
            "Tables become serving by opening an order".into(),
        ));
    }

    if let Some(order_id) = table.current_order_id {
        let live = Orders::find_by_id(order_id)
            .one(&state.orm)
            .await?
            .map(|o| o.status.parse::<OrderStatus>())
            .transpose()?
            .is_some_and(|s| !s.is_terminal());
        if live {
            return Err(AppError::Conflict(
                "Table still has an open order, complete or cancel it first".into(),
            ));
        }
    }

    let mut active: ActiveModel = table.into();
    active.status = Set(payload.status.as_str().into());
    if payload.status == TableStatus::Available {
        active.current_order_id = Set(None);
    }
    active.updated_at = Set(Utc::now().into());
    let table = active.update(&state.orm).await?;

    tracing::info!(table_id = %table.id, status = %payload.status, "table status overridden");
    audit::record(
        state,
        Some(user.user_id),
        "table_status_override",
        "dining_tables",
        serde_json::json!({ "table_id": table.id, "status": payload.status }),
    )
    .await;

    let table = publish_table(state, "updated", table)?;
    Ok(ApiResponse::ok("Table updated", table))
}

/// Lock a free table and point it at `order_id`. Runs on the caller's
/// connection so the claim commits with the order write.
///
/// A `completed` table is waiting for its delayed release and counts as free.
pub(crate) async fn claim_table<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
    order_id: Uuid,
) -> AppResult<TableModel> {
    let table = DiningTables::find_by_id(table_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Table not found".into()))?;

    match table.status.parse::<TableStatus>()? {
        TableStatus::Available | TableStatus::Completed => {}
        TableStatus::Serving => {
            return Err(AppError::Conflict(format!(
                "Table {} is already serving an order",
                table.name
            )));
        }
    }

    let mut active: ActiveModel = table.into();
    active.status = Set(TableStatus::Serving.as_str().into());
    active.current_order_id = Set(Some(order_id));
    active.updated_at = Set(Utc::now().into());
    let table = active.update(conn).await?;

    tracing::info!(table_id = %table.id, %order_id, "table claimed");
    Ok(table)
}

/// Move a serving table off `order_id`. Returns `None` when the table no
/// longer belongs to that order.
pub(crate) async fn release_for_order<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
    order_id: Uuid,
    next: TableStatus,
) -> AppResult<Option<TableModel>> {
    let Some(table) = DiningTables::find_by_id(table_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    if table.current_order_id != Some(order_id)
        || table.status.parse::<TableStatus>()? != TableStatus::Serving
    {
        return Ok(None);
    }

    let mut active: ActiveModel = table.into();
    active.status = Set(next.as_str().into());
    if next == TableStatus::Available {
        active.current_order_id = Set(None);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(Some(active.update(conn).await?))
}

/// Return a `completed` table to `available` once it has shown its state
/// for the configured delay.
pub(crate) fn schedule_release(state: &AppState, table_id: Uuid, order_id: Uuid) {
    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(state.table_reset_delay).await;
        match release_completed(&state, table_id, order_id).await {
            Ok(Some(table)) => {
                tracing::info!(%table_id, %order_id, "table released");
                notify_table(&state, "updated", table);
            }
            Ok(None) => {
                tracing::debug!(%table_id, %order_id, "table already reassigned");
            }
            Err(err) => {
                tracing::warn!(error = %err, %table_id, %order_id, "table release failed");
            }
        }
    });
}

/// Conditional single-statement release: a table that has been claimed again
/// in the meantime is left alone.
pub(crate) async fn release_completed(
    state: &AppState,
    table_id: Uuid,
    order_id: Uuid,
) -> AppResult<Option<TableModel>> {
    let result = DiningTables::update_many()
        .col_expr(Column::Status, Expr::value(TableStatus::Available.as_str()))
        .col_expr(Column::CurrentOrderId, Expr::value(Option::<Uuid>::None))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(table_id))
        .filter(Column::Status.eq(TableStatus::Completed.as_str()))
        .filter(Column::CurrentOrderId.eq(order_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    Ok(DiningTables::find_by_id(table_id).one(&state.orm).await?)
}

/// Release every table left `completed`, e.g. when the process stopped
/// before a scheduled release fired.
pub async fn release_stale_tables(state: &AppState) -> AppResult<u64> {
    let result = DiningTables::update_many()
        .col_expr(Column::Status, Expr::value(TableStatus::Available.as_str()))
        .col_expr(Column::CurrentOrderId, Expr::value(Option::<Uuid>::None))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Status.eq(TableStatus::Completed.as_str()))
        .exec(&state.orm)
        .await?;
    Ok(result.rows_affected)
}

pub(crate) fn publish_table(
    state: &AppState,
    action: &str,
    table: TableModel,
) -> AppResult<DiningTable> {
    let table = DiningTable::try_from(table)?;
    state
        .events
        .publish(Resource::Tables, action, table.id, None, &table);
    Ok(table)
}

/// Event-only variant for callers that do not return the table.
pub(crate) fn notify_table(state: &AppState, action: &str, table: TableModel) {
    if let Err(err) = publish_table(state, action, table) {
        tracing::warn!(error = %err, "table event failed");
    }
}

fn validate_capacity(capacity: i32) -> AppResult<()> {
    if capacity < 1 {
        return Err(AppError::BadRequest("capacity must be at least 1".into()));
    }
    Ok(())
}

async fn ensure_unique_name(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = DiningTables::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest(format!("Table {name} already exists")));
    }
    Ok(())
}
