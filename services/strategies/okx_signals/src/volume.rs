//! Multi-horizon traded volume over a bounded trade history
//!
//! Trades are stored as two parallel rings (timestamps and signed volumes).
//! A window query sums **absolute** volume with timestamps from
//! `as_of - window` through `as_of` (both ends included), using one prefix sum
//! per call and a lower-bound search per window. Timestamps are assumed non-decreasing in arrival order.

use crate::error::{Result, StrategyError};
use crate::ring::RingBuffer;

#[derive(Debug, Clone)]
pub struct WindowedVolumeAggregator {
    timestamps: RingBuffer<i64>,
    volumes: RingBuffer<f64>,
    // scratch reused across queries
    ts_scratch: Vec<i64>,
    prefix: Vec<f64>,
}

impl WindowedVolumeAggregator {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            timestamps: RingBuffer::new(capacity)?,
            volumes: RingBuffer::new(capacity)?,
            ts_scratch: Vec::with_capacity(capacity),
            prefix: Vec::with_capacity(capacity),
        })
    }

    #[inline]
    pub fn add_trade(&mut self, ts_us: i64, signed_volume: f64) {
        self.timestamps.push(ts_us);
        self.volumes.push(signed_volume);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.timestamps.capacity()
    }

    /// Absolute volume per window, one output per entry of `windows_us`
    pub fn window_volumes(&mut self, as_of_us: i64, windows_us: &[i64]) -> Vec<f64> {
        let mut out = vec![0.0; windows_us.len()];
        self.window_volumes_into(as_of_us, windows_us, &mut out);
        out
    }

    /// Allocation-free form of [`Self::window_volumes`]; `out` must match `windows_us` in length
    pub fn window_volumes_into(&mut self, as_of_us: i64, windows_us: &[i64], out: &mut [f64]) {
        debug_assert_eq!(windows_us.len(), out.len());
        out.iter_mut().for_each(|v| *v = 0.0);

        self.timestamps.copy_into(&mut self.ts_scratch);
        let end = self.ts_scratch.partition_point(|&ts| ts <= as_of_us);
        if end == 0 {
            return;
        }

        self.prefix.clear();
        let (older, newer) = self.volumes.as_slices();
        let mut running = 0.0;
        for volume in older.iter().chain(newer).take(end) {
            running += volume.abs();
            self.prefix.push(running);
        }
        let total = self.prefix[end - 1];

        for (slot, window) in out.iter_mut().zip(windows_us) {
            let start = as_of_us.saturating_sub(*window);
            let left = self.ts_scratch[..end].partition_point(|&ts| ts < start);
            *slot = if left == 0 {
                total
            } else {
                total - self.prefix[left - 1]
            };
        }
    }
}

/// Window horizons must be positive and strictly increasing
pub fn validate_windows(windows_us: &[i64]) -> Result<()> {
    if windows_us.is_empty() {
        return Err(StrategyError::configuration("at least one volume window is required"));
    }
    if windows_us[0] <= 0 {
        return Err(StrategyError::configuration("volume windows must be positive"));
    }
    if windows_us.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(StrategyError::configuration(
            "volume windows must be strictly increasing",
        ));
    }
    Ok(())
}
