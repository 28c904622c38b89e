use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

/// The date part is the business day, so a late order lands on its local date.
pub fn build_order_number(id: Uuid, at: DateTime<Utc>, offset: FixedOffset) -> String {
    build_number("ORD", id, at.with_timezone(&offset))
}

pub fn build_invoice_number(id: Uuid, at: DateTime<Utc>, offset: FixedOffset) -> String {
    build_number("INV", id, at.with_timezone(&offset))
}

fn build_number(prefix: &str, id: Uuid, at: DateTime<FixedOffset>) -> String {
    let date = at.format("%Y%m%d");
    let suffix = id.simple().to_string();
    format!("{}-{}-{}", prefix, date, &suffix[..8].to_uppercase())
}
