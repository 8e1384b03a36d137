//! Money calculation utilities using rust_decimal for precision
//!
//! Monetary values are stored as `f64` but every derivation goes through
//! `Decimal` and is rounded half-up to 2 places, matching receipt rendering.

use rust_decimal::prelude::*;
use shared::models::{LineItem, MonetaryShares};

use super::error::{FulfillmentError, FulfillmentResult};

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Shop owner share of a sub-order subtotal
const OWNER_SHARE_RATE: Decimal = Decimal::from_parts(70, 0, 0, false, 2);
/// Delivery worker share of a sub-order subtotal
const WORKER_SHARE_RATE: Decimal = Decimal::from_parts(80, 0, 0, false, 2);
/// Platform fee on a sub-order subtotal
const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);
/// Payment processing fee on a sub-order subtotal
const PAYMENT_FEE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Maximum allowed price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Validate a line item before snapshotting it into a sub-order.
pub fn validate_line_item(item: &LineItem) -> FulfillmentResult<()> {
    if !item.price.is_finite() {
        return Err(FulfillmentError::Validation(format!(
            "price must be a finite number, got {}",
            item.price
        )));
    }
    if item.price < 0.0 {
        return Err(FulfillmentError::Validation(format!(
            "price must be non-negative, got {}",
            item.price
        )));
    }
    if item.price > MAX_PRICE {
        return Err(FulfillmentError::Validation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.price
        )));
    }
    if item.quantity <= 0 {
        return Err(FulfillmentError::Validation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(FulfillmentError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Sum of price × quantity over the items, rounded to 2 places.
pub fn items_subtotal(items: &[LineItem]) -> f64 {
    let total = items
        .iter()
        .fold(Decimal::ZERO, |acc, item| {
            acc + to_decimal(item.price) * Decimal::from(item.quantity)
        });
    to_f64(round2(total))
}

/// Derive the frozen monetary shares for a sub-order subtotal.
pub fn shares_for_subtotal(subtotal: f64) -> MonetaryShares {
    let subtotal = to_decimal(subtotal);
    MonetaryShares {
        owner_share: to_f64(round2(subtotal * OWNER_SHARE_RATE)),
        worker_share: to_f64(round2(subtotal * WORKER_SHARE_RATE)),
        platform_fee: to_f64(round2(subtotal * PLATFORM_FEE_RATE)),
        payment_fee: to_f64(round2(subtotal * PAYMENT_FEE_RATE)),
    }
}
