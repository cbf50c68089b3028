//! Exchange-rate conversion
//!
//! Rates are "units of this currency per 1 base unit", so converting goes
//! through the base: `amount / from.rate × to.rate`. Display formatting is a
//! dashboard concern.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ConversionResult, Currency};

use crate::utils::money::{to_decimal, to_f64};

/// Decimal places kept for the effective rate
const RATE_DECIMAL_PLACES: u32 = 6;

/// Effective rate `from → to`
pub fn effective_rate(from: &Currency, to: &Currency) -> AppResult<Decimal> {
    let from_rate = to_decimal(from.exchange_rate);
    if from_rate <= Decimal::ZERO || to.exchange_rate <= 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "Exchange rates must be positive",
        ));
    }
    Ok(to_decimal(to.exchange_rate) / from_rate)
}

/// Convert `amount` from one currency to another
pub fn convert(amount: f64, from: &Currency, to: &Currency) -> AppResult<ConversionResult> {
    let rate = effective_rate(from, to)?;
    let converted = to_decimal(amount) * rate;
    Ok(ConversionResult {
        amount,
        from: from.code.clone(),
        to: to.code.clone(),
        converted: to_f64(converted),
        rate: rate
            .round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or_default(),
    })
}
