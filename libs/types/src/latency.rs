//! Per-entry latency decomposition
//!
//! Four stages are measured between the exchange timestamp and the moment a
//! result is emitted:
//!
//! ```text
//! exchange_ts ──network──▶ received ──parse──▶ parsed ──factor──▶ computed ──dispatch──▶ emitted
//! ```
//!
//! Every segment is clamped at zero. Exchange clocks drift and the local wall
//! clock can step, so a negative raw difference is absorbed rather than
//! reported.

use std::fmt;

/// Stage timestamps captured while processing one data entry, all in µs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageTimestamps {
    /// Time reported by the exchange for the entry
    pub exchange_us: i64,
    /// Frame handed over by the transport
    pub received_us: i64,
    /// Frame decoded into a structured message
    pub parsed_us: i64,
    /// Feature computation finished
    pub computed_us: i64,
    /// Result ready for emission
    pub emitted_us: i64,
}

impl StageTimestamps {
    pub fn breakdown(&self) -> LatencyBreakdown {
        LatencyBreakdown {
            network_us: clamped_delta(self.received_us, self.exchange_us),
            parse_us: clamped_delta(self.parsed_us, self.received_us),
            factor_us: clamped_delta(self.computed_us, self.parsed_us),
            dispatch_us: clamped_delta(self.emitted_us, self.computed_us),
        }
    }
}

#[inline]
fn clamped_delta(later: i64, earlier: i64) -> u64 {
    later.saturating_sub(earlier).max(0) as u64
}

/// Latency of one processed entry, split by stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyBreakdown {
    pub network_us: u64,
    pub parse_us: u64,
    pub factor_us: u64,
    pub dispatch_us: u64,
}

impl LatencyBreakdown {
    /// Sum of the four segments; never measured independently
    #[inline]
    pub fn total_us(&self) -> u64 {
        self.network_us
            .saturating_add(self.parse_us)
            .saturating_add(self.factor_us)
            .saturating_add(self.dispatch_us)
    }
}

impl fmt::Display for LatencyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat={}us net={}us parse={}us factor={}us comm={}us",
            self.total_us(),
            self.network_us,
            self.parse_us,
            self.factor_us,
            self.dispatch_us
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_segments() {
        let stamps = StageTimestamps {
            exchange_us: 1_000,
            received_us: 1_500,
            parsed_us: 1_520,
            computed_us: 1_600,
            emitted_us: 1_610,
        };
        let breakdown = stamps.breakdown();
        assert_eq!(breakdown.network_us, 500);
        assert_eq!(breakdown.parse_us, 20);
        assert_eq!(breakdown.factor_us, 80);
        assert_eq!(breakdown.dispatch_us, 10);
        assert_eq!(breakdown.total_us(), 610);
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        // exchange clock ahead of ours
        let stamps = StageTimestamps {
            exchange_us: 2_000,
            received_us: 1_500,
            parsed_us: 1_400,
            computed_us: 1_600,
            emitted_us: 1_600,
        };
        let breakdown = stamps.breakdown();
        assert_eq!(breakdown.network_us, 0);
        assert_eq!(breakdown.parse_us, 0);
        assert_eq!(breakdown.factor_us, 200);
        assert_eq!(breakdown.total_us(), 200);
    }

    #[test]
    fn test_display_format() {
        let breakdown = LatencyBreakdown {
            network_us: 1,
            parse_us: 2,
            factor_us: 3,
            dispatch_us: 4,
        };
        assert_eq!(
            breakdown.to_string(),
            "lat=10us net=1us parse=2us factor=3us comm=4us"
        );
    }
}
