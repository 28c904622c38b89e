use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::ProductOption,
};

/// Discount requested by staff, converted to an amount against a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discount {
    /// Whole percent, 0 to 100.
    Percent { value: i64 },
    /// Fixed amount in minor units, clamped to the subtotal.
    Amount { value: i64 },
}

impl Discount {
    pub fn amount_for(&self, subtotal: i64) -> AppResult<i64> {
        match *self {
            Discount::Percent { value } => {
                if !(0..=100).contains(&value) {
                    return Err(AppError::BadRequest(
                        "discount percent must be between 0 and 100".into(),
                    ));
                }
                subtotal
                    .checked_mul(value)
                    .map(|scaled| scaled / 100)
                    .ok_or_else(too_large)
            }
            Discount::Amount { value } => {
                if value < 0 {
                    return Err(AppError::BadRequest("discount must not be negative".into()));
                }
                Ok(value.min(subtotal))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Totals {
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
}

impl Totals {
    /// `discount` is an already-resolved amount and is clamped to the subtotal.
    pub fn compute(line_totals: &[i64], discount: i64, tax_rate_bps: i32) -> AppResult<Self> {
        let subtotal = line_totals
            .iter()
            .try_fold(0_i64, |acc, line| acc.checked_add(*line))
            .ok_or_else(|| AppError::BadRequest("order total is too large".into()))?;
        let discount = discount.clamp(0, subtotal);
        let taxable = subtotal - discount;
        let tax = compute_tax(taxable, tax_rate_bps)?;
        let total = taxable.checked_add(tax).ok_or_else(too_large)?;
        Ok(Self {
            subtotal,
            discount,
            tax,
            total,
        })
    }
}

/// Tax in basis points, rounded half up.
pub fn compute_tax(taxable: i64, tax_rate_bps: i32) -> AppResult<i64> {
    if taxable <= 0 || tax_rate_bps <= 0 {
        return Ok(0);
    }
    taxable
        .checked_mul(i64::from(tax_rate_bps))
        .and_then(|scaled| scaled.checked_add(5_000))
        .map(|scaled| scaled / 10_000)
        .ok_or_else(too_large)
}

fn too_large() -> AppError {
    AppError::BadRequest("amount is too large".into())
}

pub fn line_total(unit_price: i64, quantity: i32) -> AppResult<i64> {
    if quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::BadRequest("line total is too large".into()))
}

/// Unit price for a product with the chosen variant and modifiers.
///
/// A variant price replaces the base price; modifier prices are added on top.
pub fn resolve_unit_price(
    base_price: i64,
    variants: &[ProductOption],
    modifiers: &[ProductOption],
    chosen_variant: Option<&str>,
    chosen_modifiers: &[String],
) -> AppResult<i64> {
    let mut price = match chosen_variant {
        Some(name) => {
            variants
                .iter()
                .find(|v| v.name == name)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown variant '{name}'")))?
                .price
        }
        None => base_price,
    };

    for (idx, name) in chosen_modifiers.iter().enumerate() {
        if chosen_modifiers[..idx].contains(name) {
            return Err(AppError::BadRequest(format!("Duplicate modifier '{name}'")));
        }
        let modifier = modifiers
            .iter()
            .find(|m| &m.name == name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown modifier '{name}'")))?;
        price = price.checked_add(modifier.price).ok_or_else(too_large)?;
    }

    Ok(price)
}
