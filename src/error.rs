//! Error types for the spot price tracker

use crate::types::Metal;
use thiserror::Error;

/// Reason a single price fetch failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchErrorKind {
    /// Request could not complete
    #[error("network error: {0}")]
    Network(String),

    /// Provider answered with a non-2xx status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Body was malformed or did not contain a usable price
    #[error("unexpected response: {0}")]
    Parse(String),

    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The provider has no endpoint for this metal
    #[error("no endpoint configured for {0}")]
    UnsupportedMetal(Metal),

    /// The endpoint needs an API key and none is configured
    #[error("API key missing")]
    MissingApiKey,
}

/// A failed fetch from a price provider
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{provider}: {kind}")]
pub struct PriceFetchError {
    /// Name of the provider that failed
    pub provider: String,
    /// What went wrong
    pub kind: FetchErrorKind,
}

impl PriceFetchError {
    /// Creates a new fetch error for a provider
    pub fn new(provider: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            provider: provider.into(),
            kind,
        }
    }

    /// Maps a reqwest error, keeping timeouts distinguishable
    pub fn from_reqwest(provider: impl Into<String>, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_decode() {
            FetchErrorKind::Parse(err.to_string())
        } else {
            FetchErrorKind::Network(err.to_string())
        };
        Self::new(provider, kind)
    }
}

/// Errors raised by the key-value persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key contains characters the backend cannot represent
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Errors that can occur when retrieving or entering price data
#[derive(Debug, Error)]
pub enum PriceError {
    /// No price has been accepted for this metal yet
    #[error("Price data not available for {metal}")]
    NotAvailable { metal: Metal },

    /// Price is zero, negative or not a number
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    /// Persisting the price failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while reading configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Provider name not recognized
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Metal name or symbol not recognized
    #[error("unknown metal: {0}")]
    UnknownMetal(String),

    /// A variable is present but cannot be parsed
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// A variable required by the selected provider is missing
    #[error("missing required setting: {0}")]
    Missing(String),
}

impl ConfigError {
    /// Creates an InvalidValue error
    pub fn invalid(key: &str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Errors that can occur while building a tracker
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] PriceFetchError),
}
