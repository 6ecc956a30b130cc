//! Response parsers, one per provider kind
//!
//! Parsers are pure: they take the decoded JSON body and return a positive,
//! finite USD-per-ounce price or `None`.

use super::catalog::{substitute_metal, CustomFormat, ProviderKind};
use crate::types::Metal;
use serde_json::Value;

/// Extracts the price of `metal` from a provider response
pub fn parse_price(kind: &ProviderKind, body: &Value, metal: Metal) -> Option<f64> {
    let price = match kind {
        ProviderKind::MetalsDev => parse_rate_price(body),
        ProviderKind::MetalsApi | ProviderKind::MetalPriceApi => parse_inverted_rate(body, metal),
        ProviderKind::Custom(format) => parse_custom(format, body, metal),
    }?;
    positive(price)
}

/// `{ "rate": { "price": p } }`
fn parse_rate_price(body: &Value) -> Option<f64> {
    number(body.get("rate")?.get("price")?)
}

/// `{ "rates": { "XAG": r } }` where r is ounces per USD
fn parse_inverted_rate(body: &Value, metal: Metal) -> Option<f64> {
    let rate = number(body.get("rates")?.get(metal.symbol())?)?;
    invert(rate)
}

fn parse_custom(format: &CustomFormat, body: &Value, metal: Metal) -> Option<f64> {
    let pointer = substitute_metal(&format.price_pointer, metal);
    let value = number(body.pointer(&pointer)?)?;
    if format.invert {
        invert(value)
    } else {
        Some(value)
    }
}

/// Accepts JSON numbers and numeric strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn invert(rate: f64) -> Option<f64> {
    positive(rate).map(|r| 1.0 / r)
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}
