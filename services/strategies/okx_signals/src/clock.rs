//! Time source for stage timestamps
//!
//! Every stage timestamp is taken in wall-clock microseconds since the Unix
//! epoch so that the network segment can be compared against the exchange
//! `ts`. Tests swap in a scripted clock for deterministic breakdowns.

use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock {
    /// Current time in microseconds since the Unix epoch
    fn now_us(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_us(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX))
            // clock set before 1970
            .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_epoch_micros() {
        let now = SystemClock.now_us();
        // 2020-01-01 in microseconds
        assert!(now > 1_577_836_800_000_000);
    }
}
