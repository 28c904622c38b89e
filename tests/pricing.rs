use cafe_pos_api::{
    domain::{
        numbering::{build_invoice_number, build_order_number},
        pricing::{Discount, Totals, compute_tax, line_total, resolve_unit_price},
    },
    error::AppError,
    models::ProductOption,
    routes::params::Pagination,
};
use chrono::{FixedOffset, TimeZone, Utc};
use uuid::Uuid;

fn option(name: &str, price: i64) -> ProductOption {
    ProductOption {
        name: name.into(),
        price,
    }
}

#[test]
fn variant_replaces_base_price_and_modifiers_add_up() {
    let variants = vec![option("Regular", 25_000), option("Large", 32_000)];
    let modifiers = vec![option("Oat milk", 5_000), option("Extra shot", 6_000)];

    let base = resolve_unit_price(20_000, &variants, &modifiers, None, &[]).unwrap();
    assert_eq!(base, 20_000);

    let large = resolve_unit_price(
        20_000,
        &variants,
        &modifiers,
        Some("Large"),
        &["Oat milk".to_string(), "Extra shot".to_string()],
    )
    .unwrap();
    assert_eq!(large, 43_000);
}

#[test]
fn unknown_or_duplicate_options_are_rejected() {
    let variants = vec![option("Regular", 25_000)];
    let modifiers = vec![option("Oat milk", 5_000)];

    let err = resolve_unit_price(20_000, &variants, &modifiers, Some("Huge"), &[]).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = resolve_unit_price(20_000, &variants, &modifiers, None, &["Syrup".into()])
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = resolve_unit_price(
        20_000,
        &variants,
        &modifiers,
        None,
        &["Oat milk".into(), "Oat milk".into()],
    )
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn line_total_requires_positive_quantity() {
    assert_eq!(line_total(12_500, 3).unwrap(), 37_500);
    assert!(line_total(12_500, 0).is_err());
    assert!(line_total(i64::MAX, 2).is_err());
}

#[test]
fn tax_rounds_half_up_in_basis_points() {
    assert_eq!(compute_tax(10_000, 1_000).unwrap(), 1_000);
    // 1_005 * 0.1 = 100.5
    assert_eq!(compute_tax(1_005, 1_000).unwrap(), 101);
    assert_eq!(compute_tax(1_004, 1_000).unwrap(), 100);
    assert_eq!(compute_tax(0, 1_000).unwrap(), 0);
    assert_eq!(compute_tax(5_000, 0).unwrap(), 0);
}

#[test]
fn huge_amounts_are_rejected_instead_of_overflowing() {
    assert!(matches!(
        compute_tax(i64::MAX / 2, 1_000),
        Err(AppError::BadRequest(_))
    ));
    assert!(Discount::Percent { value: 50 }.amount_for(i64::MAX).is_err());
    assert!(Totals::compute(&[i64::MAX, 1], 0, 0).is_err());

    let modifiers = vec![option("Gold leaf", i64::MAX)];
    let err = resolve_unit_price(10, &[], &modifiers, None, &["Gold leaf".into()]).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn totals_apply_discount_before_tax() {
    let totals = Totals::compute(&[30_000, 20_000], 10_000, 1_000).unwrap();
    assert_eq!(totals.subtotal, 50_000);
    assert_eq!(totals.discount, 10_000);
    assert_eq!(totals.tax, 4_000);
    assert_eq!(totals.total, 44_000);
}

#[test]
fn totals_clamp_discount_to_subtotal() {
    let totals = Totals::compute(&[8_000], 20_000, 1_000).unwrap();
    assert_eq!(totals.discount, 8_000);
    assert_eq!(totals.tax, 0);
    assert_eq!(totals.total, 0);

    let empty = Totals::compute(&[], 0, 1_000).unwrap();
    assert_eq!(empty.total, 0);
}

#[test]
fn discount_amounts() {
    assert_eq!(Discount::Percent { value: 10 }.amount_for(45_000).unwrap(), 4_500);
    assert_eq!(Discount::Percent { value: 100 }.amount_for(45_000).unwrap(), 45_000);
    assert!(Discount::Percent { value: 101 }.amount_for(45_000).is_err());
    assert!(Discount::Percent { value: -1 }.amount_for(45_000).is_err());

    assert_eq!(Discount::Amount { value: 5_000 }.amount_for(45_000).unwrap(), 5_000);
    assert_eq!(Discount::Amount { value: 90_000 }.amount_for(45_000).unwrap(), 45_000);
    assert!(Discount::Amount { value: -5 }.amount_for(45_000).is_err());
}

#[test]
fn discount_is_tagged_json() {
    let discount: Discount = serde_json::from_str(r#"{"kind":"percent","value":15}"#).unwrap();
    assert_eq!(discount, Discount::Percent { value: 15 });
}

#[test]
fn document_numbers_carry_prefix_and_date() {
    let id = Uuid::parse_str("3f2b8c1e-0000-4000-8000-000000000000").unwrap();
    let at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 0).unwrap();

    let utc = FixedOffset::east_opt(0).unwrap();

    assert_eq!(build_order_number(id, at, utc), "ORD-20250309-3F2B8C1E");
    assert_eq!(build_invoice_number(id, at, utc), "INV-20250309-3F2B8C1E");
}

#[test]
fn document_numbers_use_the_business_date() {
    let id = Uuid::parse_str("3f2b8c1e-0000-4000-8000-000000000000").unwrap();
    let late_evening_utc = Utc.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap();
    let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
    let honolulu = FixedOffset::west_opt(10 * 3600).unwrap();

    assert_eq!(
        build_order_number(id, late_evening_utc, jakarta),
        "ORD-20250310-3F2B8C1E"
    );
    let early_utc = Utc.with_ymd_and_hms(2025, 3, 10, 3, 0, 0).unwrap();
    assert_eq!(
        build_invoice_number(id, early_utc, honolulu),
        "INV-20250309-3F2B8C1E"
    );
}

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));

    let p = Pagination {
        page: Some(3),
        per_page: Some(500),
    };
    assert_eq!(p.normalize(), (3, 100, 200));

    let p = Pagination {
        page: Some(-2),
        per_page: Some(0),
    };
    assert_eq!(p.normalize(), (1, 1, 0));
}
