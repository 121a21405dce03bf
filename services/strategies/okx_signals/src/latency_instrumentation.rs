//! # Stage Latency Instrumentation
//!
//! ## Purpose
//!
//! Records the end-to-end latency of every processed data entry, split into
//! network, parse, factor and dispatch segments (see
//! [`types::StageTimestamps`]), and keeps the totals in one bounded
//! [`RingBuffer`] per `"{channel}:{instrument}"` key.
//!
//! ## Integration Points
//!
//! - **Input**: `LatencyBreakdown::total_us()` from the dispatcher, once per entry
//! - **Output**: on-demand percentiles for the per-entry log line and the periodic
//!   `[latency]` summary
//! - **Ownership**: one instance per connection, owned by its session state; no
//!   global registry
//!
//! ## Performance Profile
//!
//! - **Record**: one hash lookup plus an O(1) ring append
//! - **Percentiles**: computed on every query, never cached
//! - **Memory**: `capacity * 8` bytes per key, allocated on first use of the key

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::info;

use crate::error::{Result, StrategyError};
use crate::ring::RingBuffer;

/// Percentile ranks reported by the periodic summary
pub const SUMMARY_PERCENTILES: [f64; 3] = [50.0, 95.0, 99.0];

/// Sample count and tail percentiles for one key
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub key: String,
    pub count: usize,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
}

#[derive(Debug, Clone)]
pub struct LatencyInstrumentation {
    rings: HashMap<String, RingBuffer<u64>>,
    /// Cloned for each new key so ring creation cannot fail after construction
    empty: RingBuffer<u64>,
    percentile_targets: Vec<f64>,
}

impl LatencyInstrumentation {
    pub fn new(capacity: usize, percentile_targets: Vec<f64>) -> Result<Self> {
        if let Some(bad) = percentile_targets
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(StrategyError::configuration(format!(
                "percentile target {bad} is outside [0, 100]"
            )));
        }
        Ok(Self {
            rings: HashMap::new(),
            empty: RingBuffer::new(capacity)?,
            percentile_targets,
        })
    }

    /// Create the ring for `key` if it has not been seen yet
    pub fn ensure_key(&mut self, key: &str) {
        if !self.rings.contains_key(key) {
            self.rings.insert(key.to_string(), self.empty.clone());
        }
    }

    /// Append one total latency sample for `key`
    pub fn record(&mut self, key: &str, total_us: u64) {
        if let Some(ring) = self.rings.get_mut(key) {
            ring.push(total_us);
            return;
        }
        let mut ring = self.empty.clone();
        ring.push(total_us);
        self.rings.insert(key.to_string(), ring);
    }

    /// Configured percentiles for `key`; `None` when the key has no samples
    pub fn percentiles(&self, key: &str) -> Option<Vec<f64>> {
        self.rings.get(key)?.percentiles_of(&self.percentile_targets)
    }

    pub fn percentile_targets(&self) -> &[f64] {
        &self.percentile_targets
    }

    pub fn sample_count(&self, key: &str) -> usize {
        self.rings.get(key).map_or(0, RingBuffer::len)
    }

    /// Total samples held across every key
    pub fn total_samples(&self) -> usize {
        self.rings.values().map(RingBuffer::len).sum()
    }

    /// Known keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.rings.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Per-key count and p50/p95/p99, sorted by key; keys without samples are skipped
    pub fn summary(&self) -> Vec<LatencySummary> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let ring = self.rings.get(key)?;
                let [p50_us, p95_us, p99_us] = ring.percentiles(SUMMARY_PERCENTILES)?;
                Some(LatencySummary {
                    key: key.to_string(),
                    count: ring.len(),
                    p50_us,
                    p95_us,
                    p99_us,
                })
            })
            .collect()
    }

    /// ` Δlatency p50=..us p95=..us` for `key`, or empty when there are no samples
    pub fn format_stats(&self, key: &str) -> String {
        let mut text = String::new();
        if let Some(values) = self.percentiles(key) {
            text.push_str(" Δlatency");
            for (target, value) in self.percentile_targets.iter().zip(values) {
                let _ = write!(text, " p{target}={value:.0}us");
            }
        }
        text
    }

    pub fn log_summary(&self) {
        for entry in self.summary() {
            info!(
                "[latency] {} n={} p50={:.0}us p95={:.0}us p99={:.0}us",
                entry.key, entry.count, entry.p50_us, entry.p95_us, entry.p99_us
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrumentation() -> LatencyInstrumentation {
        LatencyInstrumentation::new(8, vec![50.0, 95.0]).unwrap()
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(LatencyInstrumentation::new(0, vec![50.0]).is_err());
        assert!(LatencyInstrumentation::new(8, vec![50.0, 101.0]).is_err());
    }

    #[test]
    fn test_record_and_percentiles() {
        let mut lat = instrumentation();
        for total in 1..=8 {
            lat.record("trades:BTC-USDT", total);
        }
        assert_eq!(lat.sample_count("trades:BTC-USDT"), 8);
        let values = lat.percentiles("trades:BTC-USDT").unwrap();
        assert!((values[0] - 4.5).abs() < 1e-12);
        assert!((values[1] - 7.65).abs() < 1e-12);
    }

    #[test]
    fn test_format_stats() {
        let mut lat = instrumentation();
        for total in [10, 20, 30] {
            lat.record("books5:BTC-USDT", total);
        }
        assert_eq!(
            lat.format_stats("books5:BTC-USDT"),
            " Δlatency p50=20us p95=29us"
        );
    }

    #[test]
    fn test_unknown_key() {
        let lat = instrumentation();
        assert_eq!(lat.sample_count("books5:X"), 0);
        assert!(lat.percentiles("books5:X").is_none());
        assert_eq!(lat.format_stats("books5:X"), "");
    }

    #[test]
    fn test_ensure_key_creates_empty_ring() {
        let mut lat = instrumentation();
        lat.ensure_key("books5:ETH-USDT");
        assert_eq!(lat.keys(), vec!["books5:ETH-USDT"]);
        assert_eq!(lat.sample_count("books5:ETH-USDT"), 0);
        assert!(lat.summary().is_empty());
    }

    #[test]
    fn test_summary_sorted_by_key() {
        let mut lat = instrumentation();
        lat.record("trades:B", 10);
        lat.record("books5:A", 20);
        lat.record("books5:A", 40);
        let summary = lat.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].key, "books5:A");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].p50_us, 30.0);
        assert_eq!(summary[1].key, "trades:B");
        assert_eq!(lat.total_samples(), 3);
    }
}
