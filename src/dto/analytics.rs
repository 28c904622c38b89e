use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::analytics::{DailyRevenue, HourlyBucket, SalesSummary, TopProduct};

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub summary: SalesSummary,
    pub daily: Vec<DailyRevenue>,
    pub hourly: Vec<HourlyBucket>,
    pub top_products: Vec<TopProduct>,
}
