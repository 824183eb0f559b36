//! Fixed-point money helpers.
//!
//! Every monetary value in the system is a [`Decimal`] with two fractional
//! digits. Floating point never touches an amount: parsing, tax math and
//! rounding all stay in decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of fractional digits stored for every monetary column.
pub const MONEY_SCALE: u32 = 2;

/// Largest tax rate accepted, in percent.
pub const MAX_TAX_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Currency symbol used in formatted amounts.
pub const CURRENCY_SYMBOL: &str = "¥";

/// Largest amount a `NUMERIC(12, 2)` column can hold: 9,999,999,999.99.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

// ---------------------------------------------------------------------------
// Rounding and arithmetic
// ---------------------------------------------------------------------------

/// Round to two fractional digits, half away from zero, and pin the scale
/// at two so `10` is carried as `10.00`.
///
/// This matches how PostgreSQL rounds a value cast into `NUMERIC(p, 2)`, so a
/// value computed here and a value computed by the database never disagree.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Tax owed on `subtotal` at `rate_percent`, rounded to two places.
pub fn tax_on(subtotal: Decimal, rate_percent: Decimal) -> Decimal {
    round_money(subtotal * rate_percent / Decimal::ONE_HUNDRED)
}

// ---------------------------------------------------------------------------
// Parsing and validation
// ---------------------------------------------------------------------------

/// Parse a decimal string such as `"1234.56"`.
pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, CoreError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| CoreError::Validation(format!("{field} is not a valid decimal: '{raw}'")))
}

/// Read a monetary value from a JSON number or numeric string.
///
/// Numbers are re-parsed from their textual form so `1234.56` arrives as the
/// exact decimal the client wrote.
pub fn decimal_from_json(field: &str, value: &serde_json::Value) -> Result<Decimal, CoreError> {
    match value {
        serde_json::Value::Number(n) => parse_decimal(field, &n.to_string()),
        serde_json::Value::String(s) => parse_decimal(field, s),
        _ => Err(CoreError::Validation(format!(
            "{field} must be a number or numeric string"
        ))),
    }
}

fn ensure_scale(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(CoreError::Validation(format!(
            "{field} must have at most {MONEY_SCALE} decimal places"
        )));
    }
    Ok(())
}

/// Validate a monetary amount: strictly positive, at most two decimal
/// places, and within column range. Returns the value at scale 2.
pub fn validate_amount(field: &str, value: Decimal) -> Result<Decimal, CoreError> {
    if value <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    let max = max_amount();
    if value > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds the maximum of {max}"
        )));
    }
    ensure_scale(field, value)?;
    Ok(round_money(value))
}

/// Validate a tax rate in percent: `0 <= rate <= 100`, two decimal places.
pub fn validate_tax_rate(value: Decimal) -> Result<Decimal, CoreError> {
    if value < Decimal::ZERO || value > MAX_TAX_RATE {
        return Err(CoreError::Validation(format!(
            "tax_rate must be between 0 and {MAX_TAX_RATE}"
        )));
    }
    ensure_scale("tax_rate", value)?;
    Ok(round_money(value))
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format an amount in whole yen with thousands separators, e.g. `¥1,234,567`.
///
/// Fractional yen are rounded half-to-even.
pub fn format_yen(value: Decimal) -> String {
    let whole = value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = whole.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if whole.is_sign_negative() && !whole.is_zero() {
        format!("-{CURRENCY_SYMBOL}{grouped}")
    } else {
        format!("{CURRENCY_SYMBOL}{grouped}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
