//! Constants for the spot price tracker
//!
//! Compile-time defaults. Every value that makes sense to change at deploy
//! time can be overridden through `TrackerConfig::from_env`.

use crate::types::Metal;

/// How often cached prices become stale and are fetched again (in seconds)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// HTTP request timeout when fetching prices (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of quotes kept in the price history
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// Capacity of the broadcast channel carrying price events
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Metals tracked by default
pub const ENABLED_METALS: &[Metal] = &[
    Metal::Silver,
    Metal::Gold,
    Metal::Platinum,
    Metal::Palladium,
];

/// Directory used by the file-backed store when none is configured
pub const DEFAULT_DATA_DIR: &str = ".spot-tracker";

/// metals.dev API base URL
pub const METALS_DEV_API_URL: &str = "https://api.metals.dev/v1";

/// metals-api.com API base URL
pub const METALS_API_URL: &str = "https://metals-api.com/api";

/// metalpriceapi.com API base URL
pub const METAL_PRICE_API_URL: &str = "https://api.metalpriceapi.com/v1";

/// Placeholder substituted with the configured API key
pub const API_KEY_PLACEHOLDER: &str = "{API_KEY}";

/// Placeholder substituted with the lowercase metal name
pub const METAL_PLACEHOLDER: &str = "{METAL}";

/// Placeholder substituted with the metal symbol (XAG, XAU, ...)
pub const SYMBOL_PLACEHOLDER: &str = "{SYMBOL}";

/// Storage key prefix for the latest price of each metal
pub const SPOT_PRICE_KEY_PREFIX: &str = "spot_price";

/// Storage key for the last successful refresh timestamp
pub const LAST_UPDATE_KEY: &str = "spot_price.last_update";

/// Storage key for the bounded price history
pub const HISTORY_KEY: &str = "spot_price.history";

/// Source tag of user-entered prices
pub const MANUAL_SOURCE: &str = "manual";

/// Source tag of prices reset to their defaults
pub const DEFAULT_SOURCE: &str = "default";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "spot-price-tracker/0.1.0";
