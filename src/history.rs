//! Bounded price history

use crate::types::{Metal, PriceQuote};
use std::collections::VecDeque;

/// Ordered log of accepted quotes, oldest first
///
/// Once `cap` entries are held, each new entry evicts the oldest.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistoryLog {
    entries: VecDeque<PriceQuote>,
    cap: usize,
}

impl PriceHistoryLog {
    /// Creates an empty log; a zero cap is raised to one
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    /// Rebuilds a log from persisted entries, keeping only the newest `cap`
    pub fn from_entries(entries: Vec<PriceQuote>, cap: usize) -> Self {
        let mut log = Self::new(cap);
        for quote in entries {
            log.push(quote);
        }
        log
    }

    /// Appends a quote, returning how many old entries were evicted
    pub fn push(&mut self, quote: PriceQuote) -> usize {
        self.entries.push_back(quote);
        let mut evicted = 0;
        while self.entries.len() > self.cap {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceQuote> {
        self.entries.iter()
    }

    /// Entries for one metal, oldest first
    pub fn for_metal(&self, metal: Metal) -> Vec<PriceQuote> {
        self.entries
            .iter()
            .filter(|q| q.metal == metal)
            .cloned()
            .collect()
    }

    pub fn to_vec(&self) -> Vec<PriceQuote> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quote(price: f64) -> PriceQuote {
        PriceQuote::new(Metal::Silver, price, Utc::now(), "test")
    }

    #[test]
    fn test_evicts_oldest_past_cap() {
        let mut log = PriceHistoryLog::new(3);
        for i in 1..=3 {
            assert_eq!(log.push(quote(i as f64)), 0);
        }
        assert_eq!(log.push(quote(4.0)), 1);

        assert_eq!(log.len(), 3);
        let prices: Vec<f64> = log.iter().map(|q| q.price).collect();
        assert_eq!(prices, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_entries_truncates_to_newest() {
        let entries = (1..=10).map(|i| quote(i as f64)).collect();
        let log = PriceHistoryLog::from_entries(entries, 4);
        let prices: Vec<f64> = log.iter().map(|q| q.price).collect();
        assert_eq!(prices, vec![7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_zero_cap_keeps_latest() {
        let mut log = PriceHistoryLog::new(0);
        log.push(quote(1.0));
        log.push(quote(2.0));
        assert_eq!(log.cap(), 1);
        assert_eq!(log.to_vec()[0].price, 2.0);
    }

    #[test]
    fn test_for_metal_filters() {
        let mut log = PriceHistoryLog::new(10);
        log.push(quote(30.0));
        log.push(PriceQuote::new(Metal::Gold, 2400.0, Utc::now(), "test"));
        assert_eq!(log.for_metal(Metal::Gold).len(), 1);
        assert_eq!(log.for_metal(Metal::Palladium).len(), 0);
    }
}
