//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts are stored and serialized as `f64`; every calculation goes through
//! `Decimal` and is rounded to 2 decimal places (half-up) on the way back.

use rust_decimal::prelude::*;
use shared::error::AppError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price / single amount
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i64 = 9999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round an f64 amount to 2 decimal places
#[inline]
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// `unit_price × quantity`
pub fn line_subtotal(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Sum of already-rounded amounts
pub fn sum(amounts: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(amounts.into_iter().map(to_decimal).sum())
}

/// `subtotal - discount + tax`
pub fn order_total(subtotal: f64, discount: f64, tax: f64) -> f64 {
    to_f64(to_decimal(subtotal) - to_decimal(discount) + to_decimal(tax))
}

/// Validate an amount is finite, non-negative and below [`MAX_AMOUNT`]
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be a finite number"),
        ));
    }
    if value < 0.0 {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be non-negative, got {value}"),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::invalid_field(
            field,
            format!("{field} exceeds maximum allowed ({MAX_AMOUNT}), got {value}"),
        ));
    }
    Ok(())
}

/// Validate an amount is strictly positive (movements, rates)
pub fn validate_positive_amount(value: f64, field: &str) -> Result<(), AppError> {
    validate_amount(value, field)?;
    if value == 0.0 {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be greater than zero"),
        ));
    }
    Ok(())
}

/// Validate a line quantity is within `1..=MAX_QUANTITY`
pub fn validate_quantity(value: i64, field: &str) -> Result<(), AppError> {
    if !(1..=MAX_QUANTITY).contains(&value) {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be between 1 and {MAX_QUANTITY}, got {value}"),
        ));
    }
    Ok(())
}
