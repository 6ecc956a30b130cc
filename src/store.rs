//! Price store: in-memory mirror with write-through persistence

use crate::{
    constants::{HISTORY_KEY, LAST_UPDATE_KEY},
    error::{PriceError, StoreError},
    history::PriceHistoryLog,
    persistence::{get_json, set_json, spot_price_key, KeyValueStore},
    types::{CurrentPriceTable, Metal, PriceQuote},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

struct StoreState {
    prices: CurrentPriceTable,
    history: PriceHistoryLog,
    last_update: Option<DateTime<Utc>>,
}

/// Result of `SpotPriceStore::accept_quote`
///
/// The in-memory mirror is always updated; `persisted` reports whether the
/// backing store caught up.
#[derive(Debug)]
pub struct AcceptedQuote {
    /// Quote that was replaced, if any
    pub previous: Option<PriceQuote>,
    pub persisted: Result<(), StoreError>,
}

/// Current prices, refresh timestamp and history
///
/// Reads are served from memory. Every mutation is written to the backing
/// `KeyValueStore` before the write lock is released, so the persisted
/// records always match the mirror's order of updates.
pub struct SpotPriceStore {
    backend: Arc<dyn KeyValueStore>,
    state: RwLock<StoreState>,
}

impl SpotPriceStore {
    /// Loads persisted state from `backend`
    ///
    /// Missing records start empty. Records that fail to decode are logged
    /// and ignored; I/O failures are returned.
    pub async fn load(backend: Arc<dyn KeyValueStore>, history_cap: usize) -> Result<Self, StoreError> {
        let mut prices = CurrentPriceTable::new();
        for metal in Metal::all() {
            let key = spot_price_key(*metal);
            if let Some(quote) = read_lenient::<PriceQuote>(backend.as_ref(), &key).await? {
                if quote.metal == *metal && quote.price.is_finite() && quote.price > 0.0 {
                    prices.insert(quote);
                } else {
                    tracing::warn!(key = %key, "Ignoring inconsistent persisted price");
                }
            }
        }

        let last_update = read_lenient::<DateTime<Utc>>(backend.as_ref(), LAST_UPDATE_KEY).await?;
        let entries = read_lenient::<Vec<PriceQuote>>(backend.as_ref(), HISTORY_KEY)
            .await?
            .unwrap_or_default();
        let history = PriceHistoryLog::from_entries(entries, history_cap);

        tracing::debug!(
            prices = prices.len(),
            history = history.len(),
            last_update = ?last_update,
            "Loaded persisted spot prices"
        );

        Ok(Self {
            backend,
            state: RwLock::new(StoreState {
                prices,
                history,
                last_update,
            }),
        })
    }

    /// Overwrites the current price, appends to history and persists both
    ///
    /// Both in-memory changes are applied before anything is written, so the
    /// table and the history never disagree. Both records are written even if
    /// the first write fails; the first error is reported in `persisted`.
    pub async fn accept_quote(&self, quote: PriceQuote) -> AcceptedQuote {
        let mut state = self.state.write().await;
        let previous = state.prices.insert(quote.clone());
        Self::push_history(&mut state, quote.clone());

        let price_write = set_json(self.backend.as_ref(), &spot_price_key(quote.metal), &quote).await;
        let history_write = Self::persist_history(&state, self.backend.as_ref()).await;

        AcceptedQuote {
            previous,
            persisted: price_write.and(history_write),
        }
    }

    /// Appends a quote to the history log and persists the whole log
    pub async fn record_observation(&self, quote: PriceQuote) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        Self::push_history(&mut state, quote);
        Self::persist_history(&state, self.backend.as_ref()).await
    }

    fn push_history(state: &mut StoreState, quote: PriceQuote) {
        let evicted = state.history.push(quote);
        if evicted > 0 {
            tracing::trace!(evicted, cap = state.history.cap(), "Evicted oldest history entries");
        }
    }

    async fn persist_history(state: &StoreState, backend: &dyn KeyValueStore) -> Result<(), StoreError> {
        set_json(backend, HISTORY_KEY, &state.history.to_vec()).await
    }

    /// Persists the time of the last successful refresh
    pub async fn mark_updated(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.last_update = Some(at);
        set_json(self.backend.as_ref(), LAST_UPDATE_KEY, &at).await
    }

    /// Empties the history log
    pub async fn clear_history(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.history.clear();
        set_json(self.backend.as_ref(), HISTORY_KEY, &Vec::<PriceQuote>::new()).await
    }

    /// Gets the current quote for a metal
    pub async fn get_price(&self, metal: Metal) -> Result<PriceQuote, PriceError> {
        let state = self.state.read().await;
        state
            .prices
            .get(metal)
            .cloned()
            .ok_or(PriceError::NotAvailable { metal })
    }

    pub async fn has_price(&self, metal: Metal) -> bool {
        self.state.read().await.prices.get(metal).is_some()
    }

    /// Snapshot of every current quote
    pub async fn current_prices(&self) -> CurrentPriceTable {
        self.state.read().await.prices.clone()
    }

    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_update
    }

    /// Whole history, oldest first
    pub async fn history(&self) -> Vec<PriceQuote> {
        self.state.read().await.history.to_vec()
    }

    /// History of one metal, oldest first
    pub async fn history_for(&self, metal: Metal) -> Vec<PriceQuote> {
        self.state.read().await.history.for_metal(metal)
    }
}

async fn read_lenient<T: DeserializeOwned>(
    backend: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match get_json(backend, key).await {
        Ok(value) => Ok(value),
        Err(StoreError::Serialization(e)) => {
            tracing::warn!(key, error = %e, "Discarding unreadable persisted record");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
