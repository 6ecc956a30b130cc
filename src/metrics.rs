//! Provider fetch metrics
//!
//! Tracks a rolling latency window and per-metal success/failure counts for
//! the configured provider.

use crate::types::Metal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for latency percentiles
const MAX_SAMPLES: usize = 100;

/// Success/failure counts for one metal
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetalFetchStats {
    pub successes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Snapshot of a provider's metrics
#[derive(Debug, Clone, Serialize)]
pub struct ProviderMetrics {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile latency of successful fetches in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful fetches in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of fetches tracked
    pub total_requests: u64,
    /// Number of failed fetches
    pub failed_requests: u64,
    /// Counts broken down by metal
    pub per_metal: BTreeMap<Metal, MetalFetchStats>,
}

#[derive(Debug, Default)]
struct MetricsState {
    latencies_ms: VecDeque<f64>,
    total_requests: u64,
    failed_requests: u64,
    per_metal: BTreeMap<Metal, MetalFetchStats>,
}

/// Collects fetch metrics for one provider
pub struct MetricsCollector {
    provider_name: String,
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            state: RwLock::new(MetricsState::default()),
        }
    }

    /// Records a successful fetch and its latency
    pub async fn record_success(&self, metal: Metal, duration: Duration, at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        state.total_requests += 1;
        if state.latencies_ms.len() >= MAX_SAMPLES {
            state.latencies_ms.pop_front();
        }
        state.latencies_ms.push_back(duration.as_secs_f64() * 1000.0);

        let stats = state.per_metal.entry(metal).or_default();
        stats.successes += 1;
        stats.last_success_at = Some(at);
    }

    /// Records a failed fetch
    pub async fn record_failure(&self, metal: Metal, error: &str) {
        let mut state = self.state.write().await;
        state.total_requests += 1;
        state.failed_requests += 1;

        let stats = state.per_metal.entry(metal).or_default();
        stats.failures += 1;
        stats.last_error = Some(error.to_string());
    }

    /// Computes current metrics
    pub async fn get_metrics(&self) -> ProviderMetrics {
        let state = self.state.read().await;

        let mut latencies: Vec<f64> = state.latencies_ms.iter().copied().collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if state.total_requests > 0 {
            (state.total_requests - state.failed_requests) as f64 / state.total_requests as f64
        } else {
            1.0
        };

        ProviderMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: state.total_requests,
            failed_requests: state.failed_requests,
            per_metal: state.per_metal.clone(),
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
