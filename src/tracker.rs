//! Spot price tracker service
//!
//! Decides when cached prices are stale, fetches every tracked metal from the
//! provider, merges successful quotes into the store and notifies listeners.

use crate::{
    clock::{is_stale, Clock, SystemClock},
    config::{RefreshSettings, TrackerConfig},
    constants::{DEFAULT_SOURCE, EVENT_CHANNEL_CAPACITY, MANUAL_SOURCE},
    error::{PriceError, PriceFetchError, StoreError, TrackerError},
    metrics::{MetricsCollector, ProviderMetrics},
    persistence::{FileStore, KeyValueStore},
    provider::SpotPriceProvider,
    providers::HttpPriceProvider,
    store::SpotPriceStore,
    types::{
        ComponentHealth, CurrentPriceTable, HealthStatus, Metal, PriceQuote, SpotPriceEvent,
        UpdateOutcome,
    },
};
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Callback invoked with the full price table after prices change
pub type PricesUpdatedCallback = Box<dyn Fn(&CurrentPriceTable) + Send + Sync>;

/// Spot Price Tracker
///
/// Owns the price store and the provider. Share it as `Arc<SpotPriceTracker>`
/// between the background polling task and manual refreshes.
///
/// # Example
/// ```no_run
/// use spot_price_tracker::{Metal, SpotPriceTracker, TrackerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TrackerConfig::from_env()?;
/// let tracker = SpotPriceTracker::from_config(&config).await?;
/// tracker.update_prices(false).await;
/// let silver = tracker.get_price(Metal::Silver).await?;
/// println!("silver: ${:.2}", silver.price);
/// # Ok(())
/// # }
/// ```
pub struct SpotPriceTracker {
    store: Arc<SpotPriceStore>,
    provider: Arc<dyn SpotPriceProvider>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsCollector>,
    settings: RefreshSettings,
    generation: AtomicU64,
    apply_lock: Mutex<()>,
    events: broadcast::Sender<SpotPriceEvent>,
    listeners: RwLock<Vec<PricesUpdatedCallback>>,
}

impl SpotPriceTracker {
    /// Builds a tracker with the HTTP provider and the file store from `config`
    pub async fn from_config(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let provider = HttpPriceProvider::new(config.provider.clone(), config.request_timeout)?;
        let backend = FileStore::open(&config.data_dir).await?;

        tracing::info!(
            provider = %config.provider.name,
            data_dir = %config.data_dir.display(),
            refresh_interval_secs = config.refresh.refresh_interval.as_secs(),
            "Initializing spot price tracker"
        );

        let tracker = Self::with_parts(
            Arc::new(provider),
            Arc::new(backend),
            Arc::new(SystemClock),
            config.refresh.clone(),
        )
        .await?;
        Ok(tracker)
    }

    /// Builds a tracker from explicit parts
    ///
    /// This is the seam for tests and embedders: any provider, any
    /// key-value backend and any clock.
    pub async fn with_parts(
        provider: Arc<dyn SpotPriceProvider>,
        backend: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        settings: RefreshSettings,
    ) -> Result<Self, StoreError> {
        let store = Arc::new(SpotPriceStore::load(backend, settings.history_cap).await?);
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            store,
            provider,
            clock,
            metrics,
            settings,
            generation: AtomicU64::new(0),
            apply_lock: Mutex::new(()),
            events,
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Refreshes prices when stale, or unconditionally when `force` is set
    ///
    /// Every tracked metal is fetched concurrently. Successful metals are
    /// stored and recorded in history; failed metals keep their last known
    /// price. The refresh timestamp only moves when at least one metal
    /// succeeded. If another refresh starts while this one is in flight,
    /// this one's results are discarded.
    pub async fn update_prices(&self, force: bool) -> UpdateOutcome {
        let now = self.clock.now();
        if !force && !is_stale(self.store.last_update().await, now, self.settings.refresh_interval) {
            tracing::debug!("Spot prices are fresh, skipping refresh");
            return UpdateOutcome::Skipped;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            generation,
            force,
            provider = self.provider.provider_name(),
            metals = self.settings.metals.len(),
            "Refreshing spot prices"
        );

        let fetches = self.settings.metals.iter().map(|&metal| async move {
            let start = Instant::now();
            let result = self.provider.fetch_price(metal).await;
            match &result {
                Ok(_) => {
                    self.metrics
                        .record_success(metal, start.elapsed(), self.clock.now())
                        .await
                }
                Err(e) => self.metrics.record_failure(metal, &e.kind.to_string()).await,
            }
            (metal, result)
        });
        let results = join_all(fetches).await;

        let _apply = self.apply_lock.lock().await;
        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            tracing::info!(generation, current, "Discarding superseded spot price refresh");
            return UpdateOutcome::Superseded;
        }

        let observed_at = self.clock.now();
        let mut updated = Vec::new();
        let mut failed: Vec<(Metal, PriceFetchError)> = Vec::new();

        for (metal, result) in results {
            match result {
                Ok(price) => {
                    let quote = PriceQuote::new(metal, price, observed_at, self.provider.provider_name());
                    self.accept(quote).await;
                    updated.push(metal);
                }
                Err(e) => {
                    tracing::warn!(
                        %metal,
                        provider = %e.provider,
                        error = %e.kind,
                        "Failed to fetch spot price, keeping last known value"
                    );
                    let _ = self.events.send(SpotPriceEvent::fetch_failed(metal, &e, observed_at));
                    failed.push((metal, e));
                }
            }
        }

        if updated.is_empty() {
            tracing::warn!(failed = failed.len(), "All spot price fetches failed");
            return UpdateOutcome::Failed { errors: failed };
        }

        if let Err(e) = self.store.mark_updated(observed_at).await {
            tracing::error!(error = %e, "Failed to persist refresh timestamp");
        }
        self.notify_listeners().await;

        tracing::info!(
            updated = updated.len(),
            failed = failed.len(),
            "Spot prices refreshed"
        );
        UpdateOutcome::Updated { updated, failed }
    }

    /// Stores a quote and publishes the change
    ///
    /// A failed write is logged; the in-memory value still counts.
    async fn accept(&self, quote: PriceQuote) {
        let accepted = self.store.accept_quote(quote.clone()).await;
        if let Err(e) = &accepted.persisted {
            tracing::error!(
                metal = %quote.metal,
                error = %e,
                "Failed to persist spot price; in-memory value updated"
            );
        }
        let _ = self
            .events
            .send(SpotPriceEvent::price_updated(accepted.previous.as_ref(), &quote));
    }

    async fn notify_listeners(&self) {
        let table = self.store.current_prices().await;
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for listener in listeners.iter() {
            listener(&table);
        }
    }

    /// Enters a price by hand
    ///
    /// The quote is stored and recorded like a fetched one, with source
    /// `"manual"`. The refresh timestamp is not touched. If the quote cannot
    /// be persisted the error is returned, but the in-memory price and
    /// history keep it.
    pub async fn set_manual_price(&self, metal: Metal, price: f64) -> Result<PriceQuote, PriceError> {
        self.set_price_from(metal, price, MANUAL_SOURCE).await
    }

    /// Resets a metal to its default price
    pub async fn reset_price(&self, metal: Metal) -> Result<PriceQuote, PriceError> {
        self.set_price_from(metal, metal.default_price(), DEFAULT_SOURCE).await
    }

    async fn set_price_from(&self, metal: Metal, price: f64, source: &str) -> Result<PriceQuote, PriceError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(PriceError::InvalidPrice(price));
        }

        let quote = PriceQuote::new(metal, price, self.clock.now(), source);
        let persisted = {
            let _apply = self.apply_lock.lock().await;
            let accepted = self.store.accept_quote(quote.clone()).await;
            let _ = self
                .events
                .send(SpotPriceEvent::price_updated(accepted.previous.as_ref(), &quote));
            accepted.persisted
        };
        self.notify_listeners().await;

        tracing::info!(%metal, price, source, "Spot price set");
        persisted?;
        Ok(quote)
    }

    /// Starts the background polling task
    ///
    /// The task calls `update_prices(false)` once per refresh interval, so a
    /// refresh only hits the network when the cache has gone stale.
    pub fn start_background_task(self: &Arc<Self>) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let period = self.settings.refresh_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            tracing::info!(
                refresh_interval_secs = period.as_secs(),
                "Starting spot price background task"
            );

            loop {
                let outcome = tracker.update_prices(false).await;
                tracing::debug!(?outcome, "Background refresh finished");
                sleep(period).await;
            }
        })
    }

    /// Registers a callback run after every accepted update
    pub fn on_prices_updated(&self, callback: impl Fn(&CurrentPriceTable) + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(callback));
    }

    /// Subscribes to price events
    pub fn subscribe(&self) -> broadcast::Receiver<SpotPriceEvent> {
        self.events.subscribe()
    }

    /// Gets the current price for a metal
    pub async fn get_price(&self, metal: Metal) -> Result<PriceQuote, PriceError> {
        self.store.get_price(metal).await
    }

    /// Gets every current price
    pub async fn current_prices(&self) -> CurrentPriceTable {
        self.store.current_prices().await
    }

    /// Checks if a price exists for a metal
    pub async fn has_price(&self, metal: Metal) -> bool {
        self.store.has_price(metal).await
    }

    /// Time of the last successful refresh
    pub async fn last_update(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.store.last_update().await
    }

    /// True when the next non-forced refresh would hit the network
    pub async fn is_stale(&self) -> bool {
        is_stale(
            self.store.last_update().await,
            self.clock.now(),
            self.settings.refresh_interval,
        )
    }

    /// Price history, oldest first
    pub async fn history(&self) -> Vec<PriceQuote> {
        self.store.history().await
    }

    /// Price history of one metal, oldest first
    pub async fn history_for(&self, metal: Metal) -> Vec<PriceQuote> {
        self.store.history_for(metal).await
    }

    pub async fn clear_history(&self) -> Result<(), StoreError> {
        self.store.clear_history().await
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    /// Gets provider metrics including latency percentiles and success rates
    pub async fn provider_metrics(&self) -> ProviderMetrics {
        self.metrics.get_metrics().await
    }

    /// Perform a health check on the tracker
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = std::collections::HashMap::new();

        let prices = self.current_prices().await;
        details.insert(
            "available_prices".to_string(),
            serde_json::json!(prices.len()),
        );
        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );

        let last_update = self.last_update().await;
        details.insert("last_update".to_string(), serde_json::json!(last_update));

        let missing: Vec<&str> = self
            .settings
            .metals
            .iter()
            .filter(|m| prices.get(**m).is_none())
            .map(|m| m.name())
            .collect();
        details.insert("missing_prices".to_string(), serde_json::json!(missing));

        let stale = self.is_stale().await;
        details.insert("stale".to_string(), serde_json::json!(stale));

        let status = if prices.is_empty() {
            HealthStatus::Unhealthy
        } else if stale || !missing.is_empty() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let message = match status {
            HealthStatus::Healthy => "Spot price tracker is operational with fresh data".to_string(),
            HealthStatus::Degraded if stale => "Spot prices are stale".to_string(),
            HealthStatus::Degraded => format!("Spot prices missing for {} metals", missing.len()),
            HealthStatus::Unhealthy => "Spot price tracker has no price data".to_string(),
        };

        ComponentHealth {
            name: "spot_price_tracker".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::FetchErrorKind;
    use crate::persistence::MemoryStore;
    use crate::provider::mock::MockProvider;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    struct Harness {
        tracker: Arc<SpotPriceTracker>,
        provider: Arc<MockProvider>,
        clock: Arc<ManualClock>,
        backend: Arc<MemoryStore>,
    }

    async fn harness(metals: &[Metal]) -> Harness {
        let provider = Arc::new(MockProvider::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let backend = Arc::new(MemoryStore::new());
        let tracker = SpotPriceTracker::with_parts(
            provider.clone(),
            backend.clone(),
            clock.clone(),
            RefreshSettings {
                metals: metals.to_vec(),
                refresh_interval: INTERVAL,
                history_cap: 10,
            },
        )
        .await
        .unwrap();

        Harness {
            tracker: Arc::new(tracker),
            provider,
            clock,
            backend,
        }
    }

    #[tokio::test]
    async fn test_successful_refresh_updates_everything() {
        let h = harness(&[Metal::Silver, Metal::Gold]).await;
        h.provider.set_price(Metal::Silver, 31.5);
        h.provider.set_price(Metal::Gold, 2400.0);

        let outcome = h.tracker.update_prices(false).await;
        assert!(outcome.is_success());

        let silver = h.tracker.get_price(Metal::Silver).await.unwrap();
        assert_eq!(silver.price, 31.5);
        assert_eq!(silver.source, "mock");
        assert_eq!(silver.observed_at, t0());
        assert_eq!(h.tracker.history().await.len(), 2);
        assert_eq!(h.tracker.last_update().await, Some(t0()));

        let persisted: Option<DateTime<Utc>> =
            crate::persistence::get_json(h.backend.as_ref(), crate::constants::LAST_UPDATE_KEY)
                .await
                .unwrap();
        assert_eq!(persisted, Some(t0()));
    }

    #[tokio::test]
    async fn test_second_call_within_interval_is_skipped() {
        let h = harness(&[Metal::Silver, Metal::Gold]).await;
        h.provider.set_price(Metal::Silver, 30.0);
        h.provider.set_price(Metal::Gold, 2400.0);

        assert!(h.tracker.update_prices(false).await.is_success());
        assert_eq!(h.provider.call_count(), 2);

        h.clock.advance(Duration::from_secs(30));
        assert_eq!(h.tracker.update_prices(false).await, UpdateOutcome::Skipped);
        assert_eq!(h.provider.call_count(), 2);

        // forced refresh ignores freshness
        assert!(h.tracker.update_prices(true).await.is_success());
        assert_eq!(h.provider.call_count(), 4);

        h.clock.advance(INTERVAL);
        assert!(h.tracker.update_prices(false).await.is_success());
        assert_eq!(h.provider.call_count(), 6);
    }

    #[tokio::test]
    async fn test_all_failures_keep_last_known_prices() {
        let h = harness(&[Metal::Silver, Metal::Gold]).await;
        h.provider.set_price(Metal::Silver, 30.0);
        h.provider.set_price(Metal::Gold, 2400.0);
        h.tracker.update_prices(false).await;
        let before = h.tracker.current_prices().await;

        h.clock.advance(INTERVAL);
        h.provider.set_error(Metal::Silver, FetchErrorKind::HttpStatus(500));
        h.provider.set_error(Metal::Gold, FetchErrorKind::Timeout);

        match h.tracker.update_prices(false).await {
            UpdateOutcome::Failed { errors } => assert_eq!(errors.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!h.tracker.update_prices(false).await.is_success());

        assert_eq!(h.tracker.current_prices().await, before);
        assert_eq!(h.tracker.last_update().await, Some(t0()));
        assert_eq!(h.tracker.history().await.len(), 2);
        assert!(h.tracker.is_stale().await);
    }

    #[tokio::test]
    async fn test_partial_failure_updates_successful_metals_only() {
        let h = harness(&[Metal::Silver, Metal::Gold]).await;
        h.provider.set_price(Metal::Silver, 30.0);
        h.provider.set_price(Metal::Gold, 2400.0);
        h.tracker.update_prices(false).await;

        h.clock.advance(INTERVAL);
        h.provider.set_price(Metal::Silver, 32.0);
        h.provider.set_error(Metal::Gold, FetchErrorKind::Parse("bad body".to_string()));

        match h.tracker.update_prices(false).await {
            UpdateOutcome::Updated { updated, failed } => {
                assert_eq!(updated, vec![Metal::Silver]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, Metal::Gold);
                assert_eq!(failed[0].1.provider, "mock");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(h.tracker.get_price(Metal::Silver).await.unwrap().price, 32.0);
        assert_eq!(h.tracker.get_price(Metal::Gold).await.unwrap().price, 2400.0);
        let later = t0() + chrono::Duration::seconds(60);
        assert_eq!(h.tracker.last_update().await, Some(later));

        let metrics = h.tracker.provider_metrics().await;
        assert_eq!(metrics.total_requests, 4);
        assert_eq!(metrics.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_superseded_refresh_is_discarded() {
        let h = harness(&[Metal::Silver]).await;
        h.provider.set_price(Metal::Silver, 20.0);
        h.provider.hold();

        let tracker = h.tracker.clone();
        let first = tokio::spawn(async move { tracker.update_prices(true).await });
        h.provider.wait_started().await;

        h.provider.stop_holding();
        h.provider.set_price(Metal::Silver, 30.0);
        assert!(h.tracker.update_prices(true).await.is_success());

        h.provider.release();
        assert_eq!(first.await.unwrap(), UpdateOutcome::Superseded);

        assert_eq!(h.tracker.get_price(Metal::Silver).await.unwrap().price, 30.0);
        assert_eq!(h.tracker.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_listeners_and_events() {
        let h = harness(&[Metal::Silver]).await;
        h.provider.set_price(Metal::Silver, 30.0);

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        h.tracker.on_prices_updated(move |table| {
            assert_eq!(table.get(Metal::Silver).map(|q| q.price), Some(30.0));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut events = h.tracker.subscribe();

        h.tracker.update_prices(false).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "PRICE_UPDATED");
        match event {
            SpotPriceEvent::PriceUpdated { old_price, new_price, .. } => {
                assert_eq!(old_price, None);
                assert_eq!(new_price, 30.0);
            }
            other => panic!("unexpected event: {}", other),
        }

        // skipped refreshes do not notify
        h.tracker.update_prices(false).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_broadcast() {
        let h = harness(&[Metal::Platinum]).await;
        h.provider.set_error(Metal::Platinum, FetchErrorKind::HttpStatus(503));
        let mut events = h.tracker.subscribe();

        h.tracker.update_prices(true).await;
        match events.recv().await.unwrap() {
            SpotPriceEvent::PriceFetchFailed { metal, provider, .. } => {
                assert_eq!(metal, Metal::Platinum);
                assert_eq!(provider, "mock");
            }
            other => panic!("unexpected event: {}", other),
        }
    }

    #[tokio::test]
    async fn test_manual_and_reset_prices() {
        let h = harness(&[Metal::Silver]).await;

        let quote = h.tracker.set_manual_price(Metal::Palladium, 950.0).await.unwrap();
        assert_eq!(quote.source, MANUAL_SOURCE);
        assert_eq!(h.tracker.get_price(Metal::Palladium).await.unwrap().price, 950.0);
        assert_eq!(h.tracker.last_update().await, None);

        let reset = h.tracker.reset_price(Metal::Palladium).await.unwrap();
        assert_eq!(reset.price, Metal::Palladium.default_price());
        assert_eq!(reset.source, DEFAULT_SOURCE);
        assert_eq!(h.tracker.history_for(Metal::Palladium).await.len(), 2);

        assert!(matches!(
            h.tracker.set_manual_price(Metal::Silver, 0.0).await,
            Err(PriceError::InvalidPrice(_))
        ));
        assert!(h.tracker.set_manual_price(Metal::Silver, f64::NAN).await.is_err());
        assert!(!h.tracker.has_price(Metal::Silver).await);
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let h = harness(&[Metal::Silver]).await;
        h.provider.set_price(Metal::Silver, 30.0);
        h.tracker.update_prices(false).await;

        let restarted = SpotPriceTracker::with_parts(
            h.provider.clone(),
            h.backend.clone(),
            h.clock.clone(),
            h.tracker.settings().clone(),
        )
        .await
        .unwrap();

        assert_eq!(restarted.get_price(Metal::Silver).await.unwrap().price, 30.0);
        assert_eq!(restarted.update_prices(false).await, UpdateOutcome::Skipped);
        assert_eq!(h.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_health_check_states() {
        let h = harness(&[Metal::Silver, Metal::Gold]).await;
        assert_eq!(h.tracker.health_check().await.status, HealthStatus::Unhealthy);

        h.provider.set_price(Metal::Silver, 30.0);
        h.provider.set_error(Metal::Gold, FetchErrorKind::Timeout);
        h.tracker.update_prices(false).await;
        assert_eq!(h.tracker.health_check().await.status, HealthStatus::Degraded);

        h.provider.set_price(Metal::Gold, 2400.0);
        h.tracker.update_prices(true).await;
        let health = h.tracker.health_check().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.details["available_prices"], serde_json::json!(2));

        h.clock.advance(INTERVAL);
        assert_eq!(h.tracker.health_check().await.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_background_task_refreshes_stale_cache() {
        let h = harness(&[Metal::Gold]).await;
        h.provider.set_price(Metal::Gold, 2400.0);

        let handle = h.tracker.start_background_task();
        for _ in 0..100 {
            if h.tracker.has_price(Metal::Gold).await {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(h.tracker.get_price(Metal::Gold).await.unwrap().price, 2400.0);
    }

    /// Backend whose writes always fail
    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    #[tokio::test]
    async fn test_unpersisted_quotes_still_reach_memory_and_subscribers() {
        let provider = Arc::new(MockProvider::new());
        provider.set_price(Metal::Silver, 30.0);
        let tracker = SpotPriceTracker::with_parts(
            provider,
            Arc::new(ReadOnlyStore),
            Arc::new(ManualClock::new(t0())),
            RefreshSettings {
                metals: vec![Metal::Silver],
                refresh_interval: INTERVAL,
                history_cap: 10,
            },
        )
        .await
        .unwrap();
        let mut events = tracker.subscribe();

        assert!(tracker.update_prices(false).await.is_success());
        assert_eq!(tracker.get_price(Metal::Silver).await.unwrap().price, 30.0);
        assert_eq!(tracker.history_for(Metal::Silver).await.len(), 1);
        assert_eq!(events.recv().await.unwrap().event_type(), "PRICE_UPDATED");

        let result = tracker.set_manual_price(Metal::Gold, 2500.0).await;
        assert!(matches!(result, Err(PriceError::Store(_))));
        assert_eq!(tracker.get_price(Metal::Gold).await.unwrap().price, 2500.0);
        assert_eq!(tracker.history_for(Metal::Gold).await.len(), 1);
        assert_eq!(events.recv().await.unwrap().event_type(), "PRICE_UPDATED");
    }
}
