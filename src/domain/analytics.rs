use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::InvoiceLine,
};

const MAX_RANGE_DAYS: i64 = 366;
const DEFAULT_RANGE_DAYS: i64 = 7;

/// Inclusive range of business-local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let to = to.unwrap_or(today);
        let from = from.unwrap_or(to - Duration::days(DEFAULT_RANGE_DAYS - 1));
        if from > to {
            return Err(AppError::BadRequest("from must not be after to".into()));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::BadRequest(format!(
                "range must not exceed {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(Self { from, to })
    }

    /// UTC instants `[start, end)` covering the range in the given offset.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = day_start_utc(self.from, offset);
        let end = day_start_utc(self.to + Duration::days(1), offset);
        (start, end)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |d| *d <= self.to)
    }
}

/// UTC instant of local midnight at the start of `date`.
pub fn day_start_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
        - Duration::seconds(i64::from(offset.local_minus_utc()))
}

/// One invoice, reduced to what reporting needs.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub issued_at: DateTime<FixedOffset>,
    pub total: i64,
    pub discount: i64,
    pub tax: i64,
    pub payment_method: String,
    pub items: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaymentMethodRevenue {
    pub payment_method: String,
    pub revenue: i64,
    pub invoices: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesSummary {
    pub revenue: i64,
    pub invoices: i64,
    pub average_ticket: i64,
    pub total_discount: i64,
    pub total_tax: i64,
    pub cancelled_orders: i64,
    pub by_payment_method: Vec<PaymentMethodRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: i64,
    pub invoices: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlyBucket {
    pub hour: u32,
    pub revenue: i64,
    pub invoices: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: i64,
}

pub fn summarize(records: &[SaleRecord], cancelled_orders: i64) -> SalesSummary {
    let revenue: i64 = records.iter().map(|r| r.total).sum();
    let invoices = records.len() as i64;

    let mut by_method: HashMap<&str, (i64, i64)> = HashMap::new();
    for record in records {
        let entry = by_method.entry(record.payment_method.as_str()).or_default();
        entry.0 += record.total;
        entry.1 += 1;
    }
    let mut by_payment_method: Vec<PaymentMethodRevenue> = by_method
        .into_iter()
        .map(|(method, (revenue, invoices))| PaymentMethodRevenue {
            payment_method: method.to_string(),
            revenue,
            invoices,
        })
        .collect();
    by_payment_method.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.payment_method.cmp(&b.payment_method))
    });

    SalesSummary {
        revenue,
        invoices,
        average_ticket: if invoices == 0 { 0 } else { revenue / invoices },
        total_discount: records.iter().map(|r| r.discount).sum(),
        total_tax: records.iter().map(|r| r.tax).sum(),
        cancelled_orders,
        by_payment_method,
    }
}

/// One entry per day in the range, including days without sales.
pub fn daily_revenue(records: &[SaleRecord], range: &DateRange) -> Vec<DailyRevenue> {
    let mut buckets: HashMap<NaiveDate, (i64, i64)> = HashMap::new();
    for record in records {
        let entry = buckets.entry(record.issued_at.date_naive()).or_default();
        entry.0 += record.total;
        entry.1 += 1;
    }
    range
        .days()
        .map(|date| {
            let (revenue, invoices) = buckets.get(&date).copied().unwrap_or_default();
            DailyRevenue {
                date,
                revenue,
                invoices,
            }
        })
        .collect()
}

pub fn hourly_distribution(records: &[SaleRecord]) -> Vec<HourlyBucket> {
    let mut buckets: Vec<HourlyBucket> = (0..24)
        .map(|hour| HourlyBucket {
            hour,
            revenue: 0,
            invoices: 0,
        })
        .collect();
    for record in records {
        let bucket = &mut buckets[record.issued_at.hour() as usize];
        bucket.revenue += record.total;
        bucket.invoices += 1;
    }
    buckets
}

pub fn top_products(records: &[SaleRecord], limit: usize) -> Vec<TopProduct> {
    let mut totals: HashMap<Uuid, TopProduct> = HashMap::new();
    for line in records.iter().flat_map(|r| r.items.iter()) {
        let entry = totals.entry(line.product_id).or_insert_with(|| TopProduct {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: 0,
            revenue: 0,
        });
        entry.quantity += i64::from(line.quantity);
        entry.revenue += line.line_total;
    }

    let mut ranked: Vec<TopProduct> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(limit);
    ranked
}
