//! Directional signal snapshots and filter thresholds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted direction of the next mid-price move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Probabilities at or above one half are long
    #[inline]
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.5 {
            Direction::Long
        } else {
            Direction::Short
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Features and model output for one book update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSnapshot {
    pub mid_price: f64,
    pub spread: f64,
    pub imbalance_top1: f64,
    pub volume_10ms: f64,
    pub volume_50ms: f64,
    pub volume_100ms: f64,
    /// Probability of an up-move, in [0, 1]
    pub probability: f64,
    /// Distance from a coin flip, in [0, 1]
    pub confidence: f64,
    pub direction: Direction,
}

impl SignalSnapshot {
    /// `min(1, |p - 0.5| * 2)`
    #[inline]
    pub fn confidence_for(probability: f64) -> f64 {
        ((probability - 0.5).abs() * 2.0).min(1.0)
    }
}

/// Gate thresholds for actionable signals, fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterThresholds {
    pub min_confidence: f64,
    pub min_probability_long: f64,
    pub max_probability_short: f64,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.1,
            min_probability_long: 0.55,
            max_probability_short: 0.45,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_boundary() {
        assert_eq!(Direction::from_probability(0.5), Direction::Long);
        assert_eq!(Direction::from_probability(0.4999), Direction::Short);
    }

    #[test]
    fn test_confidence_range() {
        assert_eq!(SignalSnapshot::confidence_for(0.5), 0.0);
        assert_eq!(SignalSnapshot::confidence_for(1.0), 1.0);
        assert_eq!(SignalSnapshot::confidence_for(0.0), 1.0);
        assert!((SignalSnapshot::confidence_for(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_thresholds_partial_deserialize() {
        let thresholds: FilterThresholds =
            serde_json::from_str(r#"{"min_confidence": 0.3}"#).unwrap();
        assert_eq!(thresholds.min_confidence, 0.3);
        assert_eq!(thresholds.min_probability_long, 0.55);
        assert_eq!(thresholds.max_probability_short, 0.45);
    }
}
