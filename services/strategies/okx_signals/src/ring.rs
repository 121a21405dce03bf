//! # Fixed-Capacity Ring Buffer with Percentile Queries
//!
//! ## Purpose
//!
//! Bounded sample storage for hot-path statistics. Appends are O(1) and overwrite
//! the oldest slot once the ring is full; capacity is fixed at construction and
//! the backing storage is never reallocated.
//!
//! ## Ordering
//!
//! Storage order differs from arrival order after the first wrap. Every read that
//! depends on order ([`RingBuffer::snapshot`], [`RingBuffer::as_slices`]) returns
//! samples oldest first: the slice after the write cursor followed by the slice
//! before it.
//!
//! ## Performance Profile
//!
//! - **Append**: O(1), no allocation
//! - **Percentiles**: O(n log n) sort of a chronological copy, computed on demand
//! - **Memory**: `capacity * size_of::<T>()`, allocated once

use crate::error::{Result, StrategyError};

/// Numeric sample that can take part in percentile interpolation
pub trait Sample: Copy + Default {
    fn to_f64(self) -> f64;
}

impl Sample for i64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for u64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    /// Index of the next write
    cursor: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StrategyError::configuration(
                "ring buffer capacity must be greater than zero",
            ));
        }
        Ok(Self {
            slots: vec![T::default(); capacity],
            cursor: 0,
            len: 0,
        })
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.slots[self.cursor] = value;
        self.cursor += 1;
        if self.cursor == self.slots.len() {
            self.cursor = 0;
        }
        if self.len < self.slots.len() {
            self.len += 1;
        }
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        // only the newest `capacity` values can survive
        let skip = values.len().saturating_sub(self.capacity());
        for value in &values[skip..] {
            self.push(*value);
        }
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live samples as (older, newer) slices
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.is_full() {
            (&self.slots[self.cursor..], &self.slots[..self.cursor])
        } else {
            (&self.slots[..self.len], &[])
        }
    }

    /// Chronological copy of the live samples
    pub fn snapshot(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        self.copy_into(&mut out);
        out
    }

    /// Replace `out` with the live samples in chronological order
    pub fn copy_into(&self, out: &mut Vec<T>) {
        let (older, newer) = self.as_slices();
        out.clear();
        out.extend_from_slice(older);
        out.extend_from_slice(newer);
    }
}

impl<T: Sample> RingBuffer<T> {
    /// Linearly interpolated percentiles for a fixed set of ranks in `[0, 100]`
    ///
    /// Returns `None` when the ring is empty.
    pub fn percentiles<const K: usize>(&self, targets: [f64; K]) -> Option<[f64; K]> {
        let sorted = self.sorted_values()?;
        let mut out = [0.0; K];
        for (slot, target) in out.iter_mut().zip(targets) {
            *slot = interpolate(&sorted, target);
        }
        Some(out)
    }

    /// Same as [`RingBuffer::percentiles`] for ranks only known at runtime
    pub fn percentiles_of(&self, targets: &[f64]) -> Option<Vec<f64>> {
        let sorted = self.sorted_values()?;
        Some(targets.iter().map(|t| interpolate(&sorted, *t)).collect())
    }

    fn sorted_values(&self) -> Option<Vec<f64>> {
        if self.is_empty() {
            return None;
        }
        let (older, newer) = self.as_slices();
        let mut values: Vec<f64> = older.iter().chain(newer).map(|v| v.to_f64()).collect();
        values.sort_unstable_by(f64::total_cmp);
        Some(values)
    }
}

/// Interpolate between the order statistics around `p/100 * (n-1)`
fn interpolate(sorted: &[f64], percentile: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = (percentile.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
