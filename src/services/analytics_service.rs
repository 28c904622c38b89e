use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use crate::{
    domain::{
        analytics::{self, DateRange, SaleRecord},
        status::OrderStatus,
    },
    dto::analytics::SalesReport,
    entity::{
        invoices::{Column as InvoiceCol, Entity as Invoices, Model as InvoiceModel},
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::from_json,
    response::ApiResponse,
    routes::params::AnalyticsQuery,
    state::AppState,
};

const DEFAULT_TOP_LIMIT: usize = 10;
const MAX_TOP_LIMIT: usize = 100;

/// Sales report over business-local days, built from invoice snapshots so
/// later catalog edits never rewrite history.
pub async fn sales_report(
    state: &AppState,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let offset = state.business_offset;
    let today = Utc::now().with_timezone(&offset).date_naive();
    let range = DateRange::resolve(query.from, query.to, today)?;
    let (start, end) = range.utc_bounds(offset);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);

    let records = Invoices::find()
        .filter(InvoiceCol::IssuedAt.gte(start))
        .filter(InvoiceCol::IssuedAt.lt(end))
        .order_by_asc(InvoiceCol::IssuedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|invoice| to_sale_record(invoice, offset))
        .collect::<AppResult<Vec<_>>>()?;

    let cancelled = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Cancelled.as_str()))
        .filter(OrderCol::UpdatedAt.gte(start))
        .filter(OrderCol::UpdatedAt.lt(end))
        .count(&state.orm)
        .await? as i64;

    tracing::debug!(from = %range.from, to = %range.to, invoices = records.len(), "sales report");

    let report = SalesReport {
        from: range.from,
        to: range.to,
        summary: analytics::summarize(&records, cancelled),
        daily: analytics::daily_revenue(&records, &range),
        hourly: analytics::hourly_distribution(&records),
        top_products: analytics::top_products(&records, limit),
    };
    Ok(ApiResponse::ok("Sales report", report))
}

fn to_sale_record(
    invoice: InvoiceModel,
    offset: chrono::FixedOffset,
) -> AppResult<SaleRecord> {
    Ok(SaleRecord {
        issued_at: invoice.issued_at.with_timezone(&offset),
        total: invoice.total_amount,
        discount: invoice.discount,
        tax: invoice.tax,
        payment_method: invoice.payment_method,
        items: from_json(invoice.items)?,
    })
}
