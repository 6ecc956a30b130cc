//! # Spot Price Tracker
//!
//! Tracks spot prices for precious metals (silver, gold, platinum, palladium)
//! fetched from interchangeable HTTP providers such as metals.dev.
//!
//! Prices are cached with a freshness window, persisted in a key-value store
//! together with the last refresh time and a bounded price history, and
//! published to listeners after every accepted update.
//!
//! ## Usage
//!
//! ```no_run
//! use spot_price_tracker::{Metal, SpotPriceTracker, TrackerConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TrackerConfig::from_env()?;
//! let tracker = Arc::new(SpotPriceTracker::from_config(&config).await?);
//!
//! tracker.on_prices_updated(|table| {
//!     for (metal, quote) in table.iter() {
//!         println!("{}: ${:.2}", metal, quote.price);
//!     }
//! });
//!
//! // Refresh now if the cache is stale, then keep polling
//! tracker.update_prices(false).await;
//! tracker.start_background_task();
//!
//! let gold = tracker.get_price(Metal::Gold).await?;
//! println!("gold: ${:.2} from {}", gold.price, gold.source);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SpotPriceTracker::update_prices(force)
//!     ↓ stale? (clock::is_stale)
//! SpotPriceProvider (HttpPriceProvider + ProviderConfig)
//!     ↓ one GET per metal, parsed by ProviderKind
//! SpotPriceStore (in-memory mirror, history)
//!     ↓ write-through
//! KeyValueStore (FileStore / MemoryStore)
//! ```
//!
//! ## Adding New Providers
//!
//! 1. Add a variant to `ProviderKind` and its parser in `providers/parser.rs`
//! 2. Add a constructor on `ProviderConfig` with the URL templates
//! 3. Accept its name in `ProviderChoice`

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod persistence;
pub mod provider;
pub mod providers;
pub mod store;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use clock::{is_stale, Clock, ManualClock, SystemClock};
pub use config::{RefreshSettings, TrackerConfig};
pub use error::{ConfigError, FetchErrorKind, PriceError, PriceFetchError, StoreError, TrackerError};
pub use metrics::ProviderMetrics;
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use provider::SpotPriceProvider;
pub use providers::{CustomFormat, HttpPriceProvider, ProviderConfig, ProviderKind};
pub use tracker::SpotPriceTracker;
pub use types::{
    ComponentHealth, CurrentPriceTable, HealthStatus, Metal, PriceQuote, SpotPriceEvent,
    UpdateOutcome,
};
