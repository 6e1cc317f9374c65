use rust_decimal::Decimal;

use crate::currency::decimal_from_f64;
use crate::errors::{DiscountError, Result};

/// Read the USD price of `id` from a simple-price document:
///
/// ```text
/// { "bitcoin": { "usd": 95000.0 }, "takeyourtoken": { "usd": 0.05 } }
/// ```
pub fn parse_simple_price(body: &str, id: &str) -> Result<Decimal> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| DiscountError::Feed(format!("invalid JSON: {e}")))?;

    let entry = json.get(id).ok_or_else(|| {
        let available: Vec<&str> = json
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        DiscountError::Feed(format!(
            "no price for \"{}\" (available: {})",
            id,
            available.join(", ")
        ))
    })?;

    let usd = entry
        .get("usd")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| DiscountError::Feed(format!("missing usd price for \"{}\"", id)))?;

    decimal_from_f64("feed price", usd)
}
