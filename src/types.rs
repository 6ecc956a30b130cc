//! Types for the spot price tracker

use crate::error::{ConfigError, PriceFetchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Supported precious metals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Silver,
    Gold,
    Platinum,
    Palladium,
}

impl Metal {
    /// Lowercase metal name, as used in storage keys and by metals.dev
    pub fn name(&self) -> &'static str {
        match self {
            Metal::Silver => "silver",
            Metal::Gold => "gold",
            Metal::Platinum => "platinum",
            Metal::Palladium => "palladium",
        }
    }

    /// Currency-style symbol used by rate-based APIs
    pub fn symbol(&self) -> &'static str {
        match self {
            Metal::Silver => "XAG",
            Metal::Gold => "XAU",
            Metal::Platinum => "XPT",
            Metal::Palladium => "XPD",
        }
    }

    /// Fallback price (USD/oz) used when a price is reset
    pub fn default_price(&self) -> f64 {
        match self {
            Metal::Silver => 25.0,
            Metal::Gold => 2500.0,
            Metal::Platinum => 1000.0,
            Metal::Palladium => 1000.0,
        }
    }

    /// Get all supported metals
    pub fn all() -> &'static [Metal] {
        &[Metal::Silver, Metal::Gold, Metal::Platinum, Metal::Palladium]
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metal {
    type Err = ConfigError;

    /// Accepts either the name or the symbol, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Metal::all()
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(wanted) || m.symbol().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownMetal(s.to_string()))
    }
}

/// An accepted spot price observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// The metal
    pub metal: Metal,

    /// Price in USD per troy ounce
    pub price: f64,

    /// When the price was observed
    pub observed_at: DateTime<Utc>,

    /// Provider name, or "manual"/"default"
    pub source: String,
}

impl PriceQuote {
    /// Create a new quote
    pub fn new(metal: Metal, price: f64, observed_at: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            metal,
            price,
            observed_at,
            source: source.into(),
        }
    }

    /// Value of `weight_oz` troy ounces of pure metal at this price
    pub fn melt_value(&self, weight_oz: f64) -> f64 {
        self.price * weight_oz
    }

    /// Purchase price paid above the metal value, per unit
    pub fn premium_per_unit(&self, purchase_price: f64, weight_oz: f64) -> f64 {
        purchase_price - self.melt_value(weight_oz)
    }
}

/// Latest accepted quote per metal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrentPriceTable(BTreeMap<Metal, PriceQuote>);

impl CurrentPriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metal: Metal) -> Option<&PriceQuote> {
        self.0.get(&metal)
    }

    /// Overwrites the entry for the quote's metal, returning the previous quote
    pub fn insert(&mut self, quote: PriceQuote) -> Option<PriceQuote> {
        self.0.insert(quote.metal, quote)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Metal, &PriceQuote)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of a call to `SpotPriceTracker::update_prices`
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Prices were fresh and no fetch was attempted
    Skipped,

    /// At least one metal was updated
    Updated {
        updated: Vec<Metal>,
        failed: Vec<(Metal, PriceFetchError)>,
    },

    /// Every fetch failed; cached prices were left untouched
    Failed { errors: Vec<(Metal, PriceFetchError)> },

    /// A newer refresh started while this one was in flight; results discarded
    Superseded,
}

impl UpdateOutcome {
    /// True when at least one price was accepted
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }
}

/// Price events broadcast to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotPriceEvent {
    /// A quote was accepted for a metal
    PriceUpdated {
        id: Uuid,
        metal: Metal,
        old_price: Option<f64>,
        new_price: f64,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// Fetching a metal's price failed
    PriceFetchFailed {
        id: Uuid,
        metal: Metal,
        provider: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl SpotPriceEvent {
    pub(crate) fn price_updated(previous: Option<&PriceQuote>, quote: &PriceQuote) -> Self {
        SpotPriceEvent::PriceUpdated {
            id: Uuid::new_v4(),
            metal: quote.metal,
            old_price: previous.map(|p| p.price),
            new_price: quote.price,
            source: quote.source.clone(),
            timestamp: quote.observed_at,
        }
    }

    pub(crate) fn fetch_failed(metal: Metal, error: &PriceFetchError, timestamp: DateTime<Utc>) -> Self {
        SpotPriceEvent::PriceFetchFailed {
            id: Uuid::new_v4(),
            metal,
            provider: error.provider.clone(),
            error_message: error.kind.to_string(),
            timestamp,
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            SpotPriceEvent::PriceUpdated { id, .. } => *id,
            SpotPriceEvent::PriceFetchFailed { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            SpotPriceEvent::PriceUpdated { .. } => "PRICE_UPDATED",
            SpotPriceEvent::PriceFetchFailed { .. } => "PRICE_FETCH_FAILED",
        }
    }
}

impl fmt::Display for SpotPriceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpotPriceEvent::PriceUpdated {
                metal,
                new_price,
                source,
                ..
            } => write!(f, "Price updated: {} = ${:.2} ({})", metal, new_price, source),
            SpotPriceEvent::PriceFetchFailed {
                metal,
                error_message,
                ..
            } => write!(f, "Price fetch failed for {}: {}", metal, error_message),
        }
    }
}

/// Overall system health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Every tracked metal has a price and the cache is fresh
    Healthy,
    /// Prices exist but are stale or incomplete
    Degraded,
    /// No price data at all
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metal_from_name_or_symbol() {
        assert_eq!("silver".parse::<Metal>().unwrap(), Metal::Silver);
        assert_eq!("XAU".parse::<Metal>().unwrap(), Metal::Gold);
        assert_eq!(" Platinum ".parse::<Metal>().unwrap(), Metal::Platinum);
        assert!(matches!(
            "copper".parse::<Metal>(),
            Err(ConfigError::UnknownMetal(_))
        ));
    }

    #[test]
    fn test_table_serializes_as_name_keyed_map() {
        let mut table = CurrentPriceTable::new();
        let at = Utc::now();
        table.insert(PriceQuote::new(Metal::Gold, 2400.0, at, "test"));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["gold"]["price"], 2400.0);
        assert_eq!(json["gold"]["source"], "test");
    }

    #[test]
    fn test_premium_per_unit() {
        let quote = PriceQuote::new(Metal::Silver, 30.0, Utc::now(), "test");
        assert_eq!(quote.melt_value(10.0), 300.0);
        assert_eq!(quote.premium_per_unit(35.0, 1.0), 5.0);
    }

    #[test]
    fn test_outcome_success_flag() {
        assert!(!UpdateOutcome::Skipped.is_success());
        assert!(!UpdateOutcome::Superseded.is_success());
        assert!(!UpdateOutcome::Failed { errors: vec![] }.is_success());
        assert!(UpdateOutcome::Updated {
            updated: vec![Metal::Silver],
            failed: vec![]
        }
        .is_success());
    }
}
