use cafe_pos_api::{
    domain::analytics::{
        DateRange, SaleRecord, daily_revenue, day_start_utc, hourly_distribution, summarize,
        top_products,
    },
    models::{InvoiceLine, Review},
    services::review_service::rating_stats,
};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn plus7() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

fn line(product_id: Uuid, name: &str, quantity: i32, unit_price: i64) -> InvoiceLine {
    InvoiceLine {
        product_id,
        product_name: name.into(),
        variant: None,
        modifiers: vec![],
        unit_price,
        quantity,
        line_total: unit_price * i64::from(quantity),
    }
}

fn sale(at: DateTime<FixedOffset>, total: i64, method: &str, items: Vec<InvoiceLine>) -> SaleRecord {
    SaleRecord {
        issued_at: at,
        total,
        discount: 0,
        tax: total / 11,
        payment_method: method.into(),
        items,
    }
}

#[test]
fn date_range_defaults_to_last_seven_days() {
    let range = DateRange::resolve(None, None, date(2025, 3, 10)).unwrap();
    assert_eq!(range.from, date(2025, 3, 4));
    assert_eq!(range.to, date(2025, 3, 10));
    assert_eq!(range.days().count(), 7);
}

#[test]
fn date_range_rejects_inverted_and_oversized_ranges() {
    assert!(DateRange::resolve(Some(date(2025, 3, 11)), Some(date(2025, 3, 10)), date(2025, 3, 10)).is_err());
    assert!(DateRange::resolve(Some(date(2023, 1, 1)), Some(date(2025, 1, 1)), date(2025, 1, 1)).is_err());

    let single = DateRange::resolve(Some(date(2025, 3, 10)), Some(date(2025, 3, 10)), date(2025, 3, 10))
        .unwrap();
    assert_eq!(single.days().count(), 1);
}

#[test]
fn utc_bounds_follow_business_offset() {
    let range = DateRange::resolve(Some(date(2025, 3, 10)), Some(date(2025, 3, 10)), date(2025, 3, 10))
        .unwrap();
    let (start, end) = range.utc_bounds(plus7());
    assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 9, 17, 0, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap());
    assert_eq!(day_start_utc(date(2025, 3, 10), FixedOffset::east_opt(0).unwrap()),
        Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
}

#[test]
fn summary_groups_by_payment_method() {
    let at = plus7().with_ymd_and_hms(2025, 3, 10, 9, 15, 0).unwrap();
    let records = vec![
        sale(at, 50_000, "cash", vec![]),
        sale(at, 30_000, "card", vec![]),
        sale(at, 20_000, "cash", vec![]),
    ];

    let summary = summarize(&records, 2);
    assert_eq!(summary.revenue, 100_000);
    assert_eq!(summary.invoices, 3);
    assert_eq!(summary.average_ticket, 33_333);
    assert_eq!(summary.cancelled_orders, 2);
    assert_eq!(summary.by_payment_method[0].payment_method, "cash");
    assert_eq!(summary.by_payment_method[0].revenue, 70_000);
    assert_eq!(summary.by_payment_method[0].invoices, 2);
    assert_eq!(summary.by_payment_method[1].payment_method, "card");
}

#[test]
fn empty_summary_has_zero_average() {
    let summary = summarize(&[], 0);
    assert_eq!(summary.revenue, 0);
    assert_eq!(summary.average_ticket, 0);
    assert!(summary.by_payment_method.is_empty());
}

#[test]
fn daily_revenue_fills_gaps_with_zero() {
    let range = DateRange::resolve(Some(date(2025, 3, 8)), Some(date(2025, 3, 10)), date(2025, 3, 10))
        .unwrap();
    let records = vec![
        sale(plus7().with_ymd_and_hms(2025, 3, 8, 23, 30, 0).unwrap(), 10_000, "cash", vec![]),
        sale(plus7().with_ymd_and_hms(2025, 3, 10, 0, 5, 0).unwrap(), 15_000, "cash", vec![]),
    ];

    let daily = daily_revenue(&records, &range);
    assert_eq!(daily.len(), 3);
    assert_eq!((daily[0].date, daily[0].revenue), (date(2025, 3, 8), 10_000));
    assert_eq!((daily[1].revenue, daily[1].invoices), (0, 0));
    assert_eq!((daily[2].date, daily[2].revenue), (date(2025, 3, 10), 15_000));
}

#[test]
fn hourly_distribution_uses_local_hour() {
    let records = vec![
        sale(plus7().with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap(), 10_000, "cash", vec![]),
        sale(plus7().with_ymd_and_hms(2025, 3, 10, 8, 59, 0).unwrap(), 5_000, "card", vec![]),
        sale(plus7().with_ymd_and_hms(2025, 3, 10, 21, 0, 0).unwrap(), 7_000, "cash", vec![]),
    ];

    let hourly = hourly_distribution(&records);
    assert_eq!(hourly.len(), 24);
    assert_eq!(hourly[8].revenue, 15_000);
    assert_eq!(hourly[8].invoices, 2);
    assert_eq!(hourly[21].invoices, 1);
    assert_eq!(hourly[0].invoices, 0);
}

#[test]
fn top_products_rank_by_quantity_then_revenue() {
    let latte = Uuid::new_v4();
    let croissant = Uuid::new_v4();
    let tea = Uuid::new_v4();
    let at = plus7().with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
    let records = vec![
        sale(at, 0, "cash", vec![line(latte, "Cafe Latte", 2, 25_000), line(tea, "Jasmine Tea", 3, 15_000)]),
        sale(at, 0, "cash", vec![line(latte, "Cafe Latte", 1, 32_000), line(croissant, "Butter Croissant", 1, 22_000)]),
    ];

    let top = top_products(&records, 2);
    assert_eq!(top.len(), 2);
    // Both sold three; latte earned more.
    assert_eq!(top[0].product_id, latte);
    assert_eq!(top[0].quantity, 3);
    assert_eq!(top[0].revenue, 82_000);
    assert_eq!(top[1].product_id, tea);
}

fn review(rating: i32, is_hidden: bool) -> Review {
    Review {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        product_id: None,
        rating,
        comment: None,
        is_hidden,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn rating_stats_ignore_hidden_reviews() {
    assert_eq!(rating_stats(&[]), (0, None));

    let reviews = vec![review(5, false), review(4, false), review(4, false), review(1, true)];
    assert_eq!(rating_stats(&reviews), (3, Some(4.3)));

    assert_eq!(rating_stats(&[review(2, true)]), (0, None));
}
