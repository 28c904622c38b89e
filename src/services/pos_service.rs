use chrono::{FixedOffset, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::status::{
        ItemStatus, OrderSource, OrderStatus, OrderType, PaymentMethod, PaymentStatus, TableStatus,
    },
    dto::{
        orders::OrderWithItems,
        pos::{
            AddItemsRequest, CompleteOrderRequest, CompletedOrder, OpenTableOrderRequest,
            QuickCheckoutRequest, WalkInOrderRequest,
        },
    },
    entity::{
        dining_tables::{Entity as DiningTables, Model as TableModel},
        invoices::Model as InvoiceModel,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Model as OrderModel},
    },
    error::{AppError, AppResult},
    events::Resource,
    middleware::auth::{AuthUser, ensure_staff},
    models::Invoice,
    response::ApiResponse,
    services::{
        invoice_service,
        order_service::{self, NewOrder},
        table_service,
    },
    state::AppState,
};

const WALK_IN_CUSTOMER: &str = "Walk-in";

pub async fn open_table_order(
    state: &AppState,
    user: &AuthUser,
    payload: OpenTableOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;

    let lines = order_service::price_lines(&txn, &payload.items).await?;
    let order_id = Uuid::new_v4();
    let table = table_service::claim_table(&txn, payload.table_id, order_id).await?;

    let created = order_service::create_order(
        &txn,
        state.business_offset,
        NewOrder {
            id: order_id,
            user_id: None,
            customer_name: payload
                .customer_name
                .unwrap_or_else(|| table.name.clone()),
            customer_phone: None,
            order_type: OrderType::DineIn,
            source: OrderSource::Pos,
            table_id: Some(table.id),
            status: OrderStatus::Confirmed,
            payment_method: PaymentMethod::Cash,
            note: payload.note,
            created_by: Some(user.user_id),
            discount: None,
        },
        lines,
    )
    .await?;

    txn.commit().await?;

    tracing::info!(order_id = %created.order.id, table = %table.name, "table order opened");
    order_service::publish_order(state, "created", &created);
    table_service::notify_table(state, "updated", table);

    Ok(ApiResponse::ok("Table order opened", created))
}

/// Append lines to an open order. New lines start `pending`, so a `ready`
/// order goes back to `preparing`.
pub async fn add_items(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AddItemsRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;

    let order = order_service::find_order_for_update(&txn, order_id).await?;
    let status: OrderStatus = order.status.parse()?;
    if status.is_terminal() {
        return Err(AppError::Conflict(format!("Order is already {status}")));
    }

    let lines = order_service::price_lines(&txn, &payload.items).await?;
    order_service::insert_lines(&txn, order.id, &lines).await?;

    let order = if status == OrderStatus::Ready {
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Preparing.as_str().into());
        active.update(&txn).await?
    } else {
        order
    };
    let order = order_service::recalculate_totals(&txn, order).await?;
    let data = order_service::load_order_with_items(&txn, order).await?;

    txn.commit().await?;

    order_service::publish_order(state, "updated", &data);
    Ok(ApiResponse::ok("Items added", data))
}

pub async fn walk_in_order(
    state: &AppState,
    user: &AuthUser,
    payload: WalkInOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;

    let lines = order_service::price_lines(&txn, &payload.items).await?;
    let created = order_service::create_order(
        &txn,
        state.business_offset,
        NewOrder {
            id: Uuid::new_v4(),
            user_id: None,
            customer_name: payload
                .customer_name
                .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
            customer_phone: None,
            order_type: payload.order_type.unwrap_or(OrderType::Takeaway),
            source: OrderSource::Pos,
            table_id: None,
            status: OrderStatus::Confirmed,
            payment_method: payload.payment_method.unwrap_or(PaymentMethod::Cash),
            note: payload.note,
            created_by: Some(user.user_id),
            discount: None,
        },
        lines,
    )
    .await?;

    txn.commit().await?;

    tracing::info!(order_id = %created.order.id, "walk-in order created");
    order_service::publish_order(state, "created", &created);
    Ok(ApiResponse::ok("Walk-in order created", created))
}

pub async fn complete_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: CompleteOrderRequest,
) -> AppResult<ApiResponse<CompletedOrder>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;
    let order = order_service::find_order_for_update(&txn, order_id).await?;
    let outcome = complete_in_txn(
        &txn,
        state.business_offset,
        order,
        payload.payment_method,
        Some(user.user_id),
    )
    .await?;
    txn.commit().await?;

    let completed = after_completion(state, user, outcome).await?;
    Ok(ApiResponse::ok("Order completed", completed))
}

/// Quick mode: create, pay and complete a walk-in order in one transaction.
pub async fn quick_checkout(
    state: &AppState,
    user: &AuthUser,
    payload: QuickCheckoutRequest,
) -> AppResult<ApiResponse<CompletedOrder>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;

    let lines = order_service::price_lines(&txn, &payload.items).await?;
    let created = order_service::create_order(
        &txn,
        state.business_offset,
        NewOrder {
            id: Uuid::new_v4(),
            user_id: None,
            customer_name: payload
                .customer_name
                .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
            customer_phone: None,
            order_type: OrderType::Takeaway,
            source: OrderSource::Pos,
            table_id: None,
            status: OrderStatus::Confirmed,
            payment_method: payload.payment_method,
            note: None,
            created_by: Some(user.user_id),
            discount: payload.discount,
        },
        lines,
    )
    .await?;

    let order = order_service::find_order_for_update(&txn, created.order.id).await?;
    let outcome = complete_in_txn(
        &txn,
        state.business_offset,
        order,
        Some(payload.payment_method),
        Some(user.user_id),
    )
    .await?;
    txn.commit().await?;

    let completed = after_completion(state, user, outcome).await?;
    Ok(ApiResponse::ok("Quick checkout completed", completed))
}

pub(crate) struct Completion {
    order: OrderModel,
    invoice: InvoiceModel,
    table: Option<TableModel>,
}

/// Complete a locked order: settle payment, serve every line, issue the
/// invoice and move the table to `completed`, all on one connection.
pub(crate) async fn complete_in_txn<C: ConnectionTrait>(
    conn: &C,
    offset: FixedOffset,
    order: OrderModel,
    payment_method: Option<PaymentMethod>,
    cashier_id: Option<Uuid>,
) -> AppResult<Completion> {
    let status: OrderStatus = order.status.parse()?;
    status.ensure_transition(OrderStatus::Completed)?;

    let now = Utc::now();
    let table_id = order.table_id;
    let paid = order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid;

    let mut active: OrderActive = order.into();
    if !paid {
        let method = payment_method.ok_or_else(|| {
            AppError::BadRequest("payment_method is required for unpaid orders".into())
        })?;
        active.payment_method = Set(method.as_str().into());
        active.payment_status = Set(PaymentStatus::Paid.as_str().into());
        active.paid_at = Set(Some(now.into()));
    }
    active.status = Set(OrderStatus::Completed.as_str().into());
    active.completed_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(conn).await?;

    OrderItems::update_many()
        .col_expr(OrderItemCol::Status, Expr::value(ItemStatus::Served.as_str()))
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(conn)
        .await?;
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(conn)
        .await?;

    let (table_name, table) = match table_id {
        Some(table_id) => {
            let name = DiningTables::find_by_id(table_id)
                .one(conn)
                .await?
                .map(|t| t.name);
            let table = table_service::release_for_order(
                conn,
                table_id,
                order.id,
                TableStatus::Completed,
            )
            .await?;
            (name, table)
        }
        None => (None, None),
    };

    let invoice =
        invoice_service::create_snapshot(conn, offset, &order, &items, table_name, cashier_id).await?;

    Ok(Completion {
        order,
        invoice,
        table,
    })
}

/// Side effects that run only after the completion committed.
pub(crate) async fn after_completion(
    state: &AppState,
    user: &AuthUser,
    outcome: Completion,
) -> AppResult<CompletedOrder> {
    let Completion {
        order,
        invoice,
        table,
    } = outcome;

    tracing::info!(order_id = %order.id, invoice_id = %invoice.id, "order completed");
    audit::record(
        state,
        Some(user.user_id),
        "order_complete",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "invoice_id": invoice.id,
            "total": order.total_amount,
        }),
    )
    .await;

    if let Some(table) = table {
        table_service::schedule_release(state, table.id, order.id);
        table_service::notify_table(state, "updated", table);
    }

    let data = order_service::load_order_with_items(&state.orm, order).await?;
    let invoice = Invoice::try_from(invoice)?;
    order_service::publish_order(state, "completed", &data);
    state
        .events
        .publish(Resource::Invoices, "created", invoice.id, data.order.user_id, &invoice);

    Ok(CompletedOrder {
        order: data,
        invoice,
    })
}
