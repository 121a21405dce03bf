//! Trade prints and top-of-book snapshots

use std::fmt;

/// Convert an exchange millisecond timestamp to microseconds
#[inline]
pub fn millis_to_micros(ms: i64) -> i64 {
    ms.saturating_mul(1_000)
}

/// Aggressor side of a trade print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    Buy,
    Sell,
    /// Side missing or not recognised; treated as buy-initiated for volume sign
    Unknown,
}

impl TradeSide {
    /// Parse an exchange side string, case-insensitively
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("buy") {
            TradeSide::Buy
        } else if raw.eq_ignore_ascii_case("sell") {
            TradeSide::Sell
        } else {
            TradeSide::Unknown
        }
    }

    /// Volume sign: only an explicit sell is negative
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            TradeSide::Sell => -1.0,
            TradeSide::Buy | TradeSide::Unknown => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
            TradeSide::Unknown => "?",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width specifiers like {:>4} apply
        f.pad(self.as_str())
    }
}

/// A single executed trade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    pub ts_us: i64,
    pub side: TradeSide,
    /// Execution price; absent or unparseable prices are carried as `None`
    pub price: Option<f64>,
    pub size: f64,
}

impl Trade {
    /// Size signed by aggressor side (+buy, -sell)
    #[inline]
    pub fn signed_volume(&self) -> f64 {
        self.side.sign() * self.size
    }
}

/// One price level of the book
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

impl PriceLevel {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

/// Best bid and best ask at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookTop {
    pub ts_us: i64,
    pub best_bid: PriceLevel,
    pub best_ask: PriceLevel,
}

impl BookTop {
    pub fn new(ts_us: i64, best_bid: PriceLevel, best_ask: PriceLevel) -> Self {
        Self {
            ts_us,
            best_bid,
            best_ask,
        }
    }

    /// Ask minus bid, floored at zero for crossed books
    #[inline]
    pub fn spread(&self) -> f64 {
        (self.best_ask.price - self.best_bid.price).max(0.0)
    }

    #[inline]
    pub fn mid_price(&self) -> f64 {
        0.5 * (self.best_bid.price + self.best_ask.price)
    }

    /// Normalized top-level size imbalance in [-1, 1]; 0 when both sides are empty
    #[inline]
    pub fn imbalance(&self) -> f64 {
        let denom = self.best_bid.size + self.best_ask.size;
        if denom > 0.0 {
            (self.best_bid.size - self.best_ask.size) / denom
        } else {
            0.0
        }
    }
}
