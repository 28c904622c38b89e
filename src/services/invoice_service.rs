use chrono::{FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    domain::{analytics::day_start_utc, numbering::build_invoice_number},
    dto::invoices::InvoiceList,
    entity::{
        invoices::{ActiveModel as InvoiceActive, Column as InvoiceCol, Entity as Invoices, Model as InvoiceModel},
        order_items::Model as OrderItemModel,
        orders::{Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{from_json, to_json, Invoice, InvoiceLine},
    response::{ApiResponse, Meta},
    routes::params::InvoiceQuery,
    state::AppState,
};

pub async fn list_invoices(
    state: &AppState,
    user: &AuthUser,
    query: InvoiceQuery,
) -> AppResult<ApiResponse<InvoiceList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Invoices::find();
    if let Some(from) = query.from {
        finder = finder.filter(InvoiceCol::IssuedAt.gte(day_start_utc(from, state.business_offset)));
    }
    if let Some(to) = query.to {
        let end = day_start_utc(to + chrono::Duration::days(1), state.business_offset);
        finder = finder.filter(InvoiceCol::IssuedAt.lt(end));
    }
    if let Some(method) = query.payment_method {
        finder = finder.filter(InvoiceCol::PaymentMethod.eq(method.as_str()));
    }
    let finder = finder.order_by_desc(InvoiceCol::IssuedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Invoice::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Invoices",
        InvoiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Invoice>> {
    ensure_staff(user)?;
    let invoice = Invoices::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok("Invoice", Invoice::try_from(invoice)?))
}

/// Staff see every invoice; customers only the ones for their own orders.
pub async fn get_invoice_for_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Invoice>> {
    if !user.is_staff() {
        let owned = Orders::find_by_id(order_id)
            .one(&state.orm)
            .await?
            .is_some_and(|o| o.user_id == Some(user.user_id));
        if !owned {
            return Err(AppError::NotFound);
        }
    }

    let invoice = Invoices::find()
        .filter(InvoiceCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok("Invoice", Invoice::try_from(invoice)?))
}

/// Freeze a completed order into its invoice. One invoice per order.
pub(crate) async fn create_snapshot<C: ConnectionTrait>(
    conn: &C,
    offset: FixedOffset,
    order: &OrderModel,
    items: &[OrderItemModel],
    table_name: Option<String>,
    cashier_id: Option<Uuid>,
) -> AppResult<InvoiceModel> {
    let existing = Invoices::find()
        .filter(InvoiceCol::OrderId.eq(order.id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Order {} already has an invoice",
            order.order_number
        )));
    }

    let lines = items
        .iter()
        .map(|item| {
            Ok(InvoiceLine {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                variant: item.variant.clone(),
                modifiers: from_json(item.modifiers.clone())?,
                unit_price: item.unit_price,
                quantity: item.quantity,
                line_total: item.line_total,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let invoice = InvoiceActive {
        id: Set(id),
        invoice_number: Set(build_invoice_number(id, now, offset)),
        order_id: Set(order.id),
        order_number: Set(order.order_number.clone()),
        table_name: Set(table_name),
        customer_name: Set(order.customer_name.clone()),
        items: Set(to_json(&lines)?),
        subtotal: Set(order.subtotal),
        discount: Set(order.discount),
        tax: Set(order.tax),
        total_amount: Set(order.total_amount),
        payment_method: Set(order.payment_method.clone()),
        cashier_id: Set(cashier_id),
        issued_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    tracing::info!(
        invoice_number = %invoice.invoice_number,
        order_id = %order.id,
        total = invoice.total_amount,
        "invoice issued"
    );
    Ok(invoice)
}
