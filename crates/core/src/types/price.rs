//! Lenient decimal handling for backend prices and balances.
//!
//! The catalog backend does not guarantee numeric sanity: costs arrive as JSON
//! integers, floats, numeric strings, `null`, or not at all. Amounts are held
//! as [`Decimal`] so cart totals are exact, and anything that does not parse
//! as a finite number is mapped to `None` instead of failing the whole
//! catalog response.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Convert an arbitrary JSON value into a decimal amount.
///
/// Returns `None` for non-numeric values and for floats that are not finite.
#[must_use]
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Deserialize an optional amount, mapping malformed values to `None`.
///
/// Use with `#[serde(default, deserialize_with = "...")]`.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_json))
}

/// Deserialize an amount, mapping malformed values to zero.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn deserialize_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_lenient(deserializer).map(Option::unwrap_or_default)
}

/// Format an amount for display (e.g., `$200`, `$10.5`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("${}", amount.normalize())
}
