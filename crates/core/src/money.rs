//! Storage limits for monetary amounts.
//!
//! Every amount column is `NUMERIC(15,2)`: at most two decimal places and
//! thirteen integer digits. Amounts are checked against these limits before
//! any arithmetic so that nothing is rounded or rejected by the database.

use rust_decimal::Decimal;

/// Decimal places kept for an amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Total significant digits kept for an amount.
pub const AMOUNT_PRECISION: u32 = 15;

/// Smallest magnitude that no longer fits (`10^13`).
const AMOUNT_LIMIT: i64 = 10_000_000_000_000;

/// Returns true when `amount` is stored without rounding or overflow.
///
/// Trailing zeros do not count against the scale, so `12.500` fits.
#[must_use]
pub fn fits_amount(amount: Decimal) -> bool {
    let normalized = amount.normalize();
    normalized.scale() <= AMOUNT_SCALE && normalized.abs() < Decimal::from(AMOUNT_LIMIT)
}

/// Message used for amounts that do not fit.
#[must_use]
pub fn amount_limit_message() -> String {
    format!(
        "Amount must have at most {AMOUNT_SCALE} decimal places and {} integer digits",
        AMOUNT_PRECISION - AMOUNT_SCALE
    )
}
