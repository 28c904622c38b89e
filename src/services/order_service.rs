use std::collections::HashMap;

use chrono::{FixedOffset, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        analytics::day_start_utc,
        numbering::build_order_number,
        pricing::{self, Discount, Totals},
        status::{
            ItemStatus, OrderSource, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
            TableStatus,
        },
    },
    dto::orders::{CheckoutRequest, OrderItemInput, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        dining_tables::Model as TableModel,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        settings::Entity as Settings,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    events::Resource,
    middleware::auth::AuthUser,
    models::{from_json, to_json, Order, OrderItem, ProductOption},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{settings_service, table_service},
    state::AppState,
};

/// A requested line after its price has been resolved against the catalog.
#[derive(Debug, Clone)]
pub(crate) struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub variant: Option<String>,
    pub modifiers: Vec<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    pub note: Option<String>,
}

pub(crate) struct NewOrder {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub table_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub created_by: Option<Uuid>,
    pub discount: Option<Discount>,
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let finder = Orders::find().filter(OrderCol::UserId.eq(user.user_id));
    let finder = apply_order_filters(finder, &query, state.business_offset);
    paginate_orders(state, finder, &query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = load_order_with_items(&state.orm, order).await?;
    Ok(ApiResponse::ok("OK", data))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    match (payload.order_type, payload.table_id) {
        (OrderType::DineIn, None) => {
            return Err(AppError::BadRequest("Dine-in orders need a table".into()));
        }
        (OrderType::Takeaway, Some(_)) => {
            return Err(AppError::BadRequest("Takeaway orders cannot take a table".into()));
        }
        _ => {}
    }

    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let inputs = cart
        .into_iter()
        .map(|row| {
            Ok(OrderItemInput {
                product_id: row.product_id,
                quantity: row.quantity,
                variant: row.variant,
                modifiers: from_json(row.modifiers)?,
                note: row.note,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let lines = price_lines(&txn, &inputs).await?;

    let profile = Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let order_id = Uuid::new_v4();
    let table = match payload.table_id {
        Some(table_id) => Some(table_service::claim_table(&txn, table_id, order_id).await?),
        None => None,
    };

    let created = create_order(
        &txn,
        state.business_offset,
        NewOrder {
            id: order_id,
            user_id: Some(user.user_id),
            customer_name: payload.customer_name.unwrap_or(profile.name),
            customer_phone: payload.customer_phone.or(profile.phone),
            order_type: payload.order_type,
            source: OrderSource::Online,
            table_id: payload.table_id,
            status: OrderStatus::Pending,
            payment_method: payload.payment_method,
            note: payload.note,
            created_by: Some(user.user_id),
            discount: None,
        },
        lines,
    )
    .await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %created.order.id, total = created.order.total_amount, "online order placed");
    audit::record(
        state,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": created.order.id }),
    )
    .await;
    publish_order(state, "created", &created);
    if let Some(table) = table {
        table_service::notify_table(state, "updated", table);
    }

    Ok(ApiResponse::ok("Checkout success", created))
}

/// Customers may withdraw an order until staff confirm it.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = find_order_for_update(&txn, id).await?;
    if order.user_id != Some(user.user_id) {
        return Err(AppError::NotFound);
    }
    if order.status.parse::<OrderStatus>()? != OrderStatus::Pending {
        return Err(AppError::Conflict(
            "Only pending orders can be cancelled".into(),
        ));
    }

    let (order, table) = cancel_in_txn(&txn, order).await?;
    let data = load_order_with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;
    publish_order(state, "cancelled", &data);
    if let Some(table) = table {
        table_service::notify_table(state, "updated", table);
    }

    Ok(ApiResponse::ok("Order cancelled", data))
}

pub(crate) fn apply_order_filters(
    mut finder: Select<Orders>,
    query: &OrderListQuery,
    offset: FixedOffset,
) -> Select<Orders> {
    if let Some(status) = query.status {
        finder = finder.filter(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(source) = query.source {
        finder = finder.filter(OrderCol::Source.eq(source.as_str()));
    }
    if let Some(table_id) = query.table_id {
        finder = finder.filter(OrderCol::TableId.eq(table_id));
    }
    if let Some(from) = query.from {
        finder = finder.filter(OrderCol::CreatedAt.gte(day_start_utc(from, offset)));
    }
    if let Some(to) = query.to {
        let end = day_start_utc(to + chrono::Duration::days(1), offset);
        finder = finder.filter(OrderCol::CreatedAt.lt(end));
    }
    match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    }
}

pub(crate) async fn paginate_orders(
    state: &AppState,
    finder: Select<Orders>,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Resolve products and prices for the requested lines.
pub(crate) async fn price_lines<C: ConnectionTrait>(
    conn: &C,
    inputs: &[OrderItemInput],
) -> AppResult<Vec<PricedLine>> {
    if inputs.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }

    let ids: Vec<Uuid> = inputs.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    inputs
        .iter()
        .map(|input| {
            let product = products.get(&input.product_id).ok_or_else(|| {
                AppError::BadRequest(format!("Product {} not found", input.product_id))
            })?;
            if product.is_archived || !product.is_available {
                return Err(AppError::BadRequest(format!(
                    "{} is not available",
                    product.name
                )));
            }
            let variants: Vec<ProductOption> = from_json(product.variants.clone())?;
            let modifiers: Vec<ProductOption> = from_json(product.modifiers.clone())?;
            let unit_price = pricing::resolve_unit_price(
                product.price,
                &variants,
                &modifiers,
                input.variant.as_deref(),
                &input.modifiers,
            )?;
            Ok(PricedLine {
                product_id: product.id,
                product_name: product.name.clone(),
                variant: input.variant.clone(),
                modifiers: input.modifiers.clone(),
                unit_price,
                quantity: input.quantity,
                line_total: pricing::line_total(unit_price, input.quantity)?,
                note: input.note.clone(),
            })
        })
        .collect()
}

pub(crate) async fn tax_rate_bps<C: ConnectionTrait>(conn: &C) -> AppResult<i32> {
    Ok(Settings::find_by_id(settings_service::SETTINGS_ID)
        .one(conn)
        .await?
        .map(|s| s.tax_rate_bps)
        .unwrap_or(0))
}

pub(crate) async fn create_order<C: ConnectionTrait>(
    conn: &C,
    offset: FixedOffset,
    new: NewOrder,
    lines: Vec<PricedLine>,
) -> AppResult<OrderWithItems> {
    let tax_bps = tax_rate_bps(conn).await?;
    let line_totals: Vec<i64> = lines.iter().map(|l| l.line_total).collect();
    let gross = Totals::compute(&line_totals, 0, tax_bps)?;
    let discount = match new.discount {
        Some(discount) => discount.amount_for(gross.subtotal)?,
        None => 0,
    };
    let totals = Totals::compute(&line_totals, discount, tax_bps)?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(new.id),
        order_number: Set(build_order_number(new.id, now, offset)),
        user_id: Set(new.user_id),
        customer_name: Set(new.customer_name),
        customer_phone: Set(new.customer_phone),
        order_type: Set(new.order_type.as_str().into()),
        source: Set(new.source.as_str().into()),
        table_id: Set(new.table_id),
        subtotal: Set(totals.subtotal),
        discount: Set(totals.discount),
        tax: Set(totals.tax),
        total_amount: Set(totals.total),
        status: Set(new.status.as_str().into()),
        payment_method: Set(new.payment_method.as_str().into()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().into()),
        note: Set(new.note),
        created_by: Set(new.created_by),
        paid_at: Set(None),
        completed_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    let items = insert_lines(conn, order.id, &lines).await?;
    Ok(OrderWithItems {
        order: Order::try_from(order)?,
        items: items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<AppResult<Vec<_>>>()?,
    })
}

pub(crate) async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    lines: &[PricedLine],
) -> AppResult<Vec<OrderItemModel>> {
    let mut inserted = Vec::with_capacity(lines.len());
    for line in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            variant: Set(line.variant.clone()),
            modifiers: Set(to_json(&line.modifiers)?),
            unit_price: Set(line.unit_price),
            quantity: Set(line.quantity),
            line_total: Set(line.line_total),
            note: Set(line.note.clone()),
            status: Set(ItemStatus::Pending.as_str().into()),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        inserted.push(item);
    }
    Ok(inserted)
}

/// Recompute subtotal, tax and total from the stored lines, keeping the discount amount.
pub(crate) async fn recalculate_totals<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderModel> {
    let line_totals: Vec<i64> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| item.line_total)
        .collect();
    let tax_bps = tax_rate_bps(conn).await?;
    let totals = Totals::compute(&line_totals, order.discount, tax_bps)?;

    let mut active: OrderActive = order.into();
    active.subtotal = Set(totals.subtotal);
    active.discount = Set(totals.discount);
    active.tax = Set(totals.tax);
    active.total_amount = Set(totals.total);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

pub(crate) async fn find_order_for_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) async fn load_order_with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(OrderWithItems {
        order: Order::try_from(order)?,
        items,
    })
}

/// Cancel a locked order and free its table if the table still points at it.
pub(crate) async fn cancel_in_txn<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<(OrderModel, Option<TableModel>)> {
    let current: OrderStatus = order.status.parse()?;
    current.ensure_transition(OrderStatus::Cancelled)?;

    let table_id = order.table_id;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(conn).await?;

    let table = match table_id {
        Some(table_id) => {
            table_service::release_for_order(conn, table_id, order.id, TableStatus::Available)
                .await?
        }
        None => None,
    };

    tracing::info!(order_id = %order.id, "order cancelled");
    Ok((order, table))
}

pub(crate) fn publish_order(state: &AppState, action: &str, order: &OrderWithItems) {
    state
        .events
        .publish(Resource::Orders, action, order.order.id, order.order.user_id, order);
}
