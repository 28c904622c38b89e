use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    domain::status::{ItemStatus, OrderStatus, PaymentStatus, derive_order_status},
    dto::{
        auth::{UpdateRoleRequest, UserList},
        orders::{
            ApplyDiscountRequest, OrderList, OrderWithItems, RecordPaymentRequest,
            UpdateItemStatusRequest, UpdateOrderStatusRequest,
        },
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination},
    services::{order_service, pos_service, table_service},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let finder = order_service::apply_order_filters(Orders::find(), &query, state.business_offset);
    order_service::paginate_orders(state, finder, &query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::load_order_with_items(&state.orm, order).await?;
    Ok(ApiResponse::ok("Order found", data))
}

/// Move an order along its lifecycle. `completed` runs the full completion
/// workflow and `cancelled` frees the table.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let order = order_service::find_order_for_update(&txn, id).await?;
    let current: OrderStatus = order.status.parse()?;
    current.ensure_transition(next)?;

    match next {
        OrderStatus::Completed => {
            let outcome = pos_service::complete_in_txn(
                &txn,
                state.business_offset,
                order,
                None,
                Some(user.user_id),
            )
            .await?;
            txn.commit().await?;
            let completed = pos_service::after_completion(state, user, outcome).await?;
            return Ok(ApiResponse::ok("Order updated", completed.order));
        }
        OrderStatus::Cancelled => {
            let (order, table) = order_service::cancel_in_txn(&txn, order).await?;
            let data = order_service::load_order_with_items(&txn, order).await?;
            txn.commit().await?;

            record_status_change(state, user, id, current, next).await;
            order_service::publish_order(state, "cancelled", &data);
            if let Some(table) = table {
                table_service::notify_table(state, "updated", table);
            }
            return Ok(ApiResponse::ok("Order updated", data));
        }
        _ => {}
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    let data = order_service::load_order_with_items(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, from = %current, to = %next, "order status changed");
    record_status_change(state, user, id, current, next).await;
    order_service::publish_order(state, "updated", &data);

    Ok(ApiResponse::ok("Order updated", data))
}

/// Advance one kitchen line, then let the order follow its items.
pub async fn update_item_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    item_id: Uuid,
    payload: UpdateItemStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;

    let order = order_service::find_order_for_update(&txn, order_id).await?;
    let current: OrderStatus = order.status.parse()?;
    if current.is_terminal() {
        return Err(AppError::Conflict(format!("Order is already {current}")));
    }

    let item = OrderItems::find_by_id(item_id)
        .filter(OrderItemCol::OrderId.eq(order_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let from: ItemStatus = item.status.parse()?;
    if !from.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "Item cannot move from {} to {}",
            from, payload.status
        )));
    }

    let mut active: OrderItemActive = item.into();
    active.status = Set(payload.status.as_str().into());
    active.update(&txn).await?;

    let statuses = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|i| i.status.parse::<ItemStatus>())
        .collect::<AppResult<Vec<_>>>()?;

    let order = match derive_order_status(current, &statuses) {
        Some(next) => {
            tracing::info!(%order_id, from = %current, to = %next, "order status derived from items");
            let mut active: OrderActive = order.into();
            active.status = Set(next.as_str().into());
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => order,
    };
    let data = order_service::load_order_with_items(&txn, order).await?;
    txn.commit().await?;

    order_service::publish_order(state, "updated", &data);
    Ok(ApiResponse::ok("Item updated", data))
}

pub async fn record_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RecordPaymentRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;
    let order = order_service::find_order_for_update(&txn, id).await?;

    if order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid {
        return Err(AppError::BadRequest("Order is already paid".into()));
    }
    if order.status.parse::<OrderStatus>()? == OrderStatus::Cancelled {
        return Err(AppError::Conflict("Cancelled orders cannot be paid".into()));
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_method = Set(payload.payment_method.as_str().into());
    active.payment_status = Set(PaymentStatus::Paid.as_str().into());
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    let data = order_service::load_order_with_items(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, method = %payload.payment_method, "payment recorded");
    audit::record(
        state,
        Some(user.user_id),
        "payment_record",
        "orders",
        serde_json::json!({
            "order_id": id,
            "payment_method": payload.payment_method,
            "amount": data.order.total_amount,
        }),
    )
    .await;
    order_service::publish_order(state, "updated", &data);

    Ok(ApiResponse::ok("Payment recorded", data))
}

pub async fn apply_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ApplyDiscountRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;
    let order = order_service::find_order_for_update(&txn, id).await?;

    let status: OrderStatus = order.status.parse()?;
    if status.is_terminal() {
        return Err(AppError::Conflict(format!("Order is already {status}")));
    }
    if order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid {
        return Err(AppError::Conflict("Paid orders cannot be discounted".into()));
    }

    let amount = payload.discount.amount_for(order.subtotal)?;
    let mut active: OrderActive = order.into();
    active.discount = Set(amount);
    let order = active.update(&txn).await?;
    let order = order_service::recalculate_totals(&txn, order).await?;
    let data = order_service::load_order_with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "discount_apply",
        "orders",
        serde_json::json!({ "order_id": id, "discount": data.order.discount }),
    )
    .await;
    order_service::publish_order(state, "updated", &data);

    Ok(ApiResponse::ok("Discount applied", data))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_user_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest("Admins cannot change their own role".into()));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    active.role = Set(payload.role.as_str().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": id, "role": payload.role }),
    )
    .await;

    Ok(ApiResponse::ok("User updated", User::try_from(updated)?))
}

async fn record_status_change(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
) {
    audit::record(
        state,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order_id, "from": from, "to": to }),
    )
    .await;
}
