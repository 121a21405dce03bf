//! Actionable-signal gate

use types::{Direction, FilterThresholds, SignalSnapshot};

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalFilter {
    thresholds: FilterThresholds,
}

impl SignalFilter {
    pub fn new(thresholds: FilterThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FilterThresholds {
        &self.thresholds
    }

    #[inline]
    pub fn allow(&self, snapshot: &SignalSnapshot) -> bool {
        if snapshot.confidence < self.thresholds.min_confidence {
            return false;
        }
        match snapshot.direction {
            Direction::Long => snapshot.probability >= self.thresholds.min_probability_long,
            Direction::Short => snapshot.probability <= self.thresholds.max_probability_short,
        }
    }
}
