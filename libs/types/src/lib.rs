//! # Streaming Signal Types
//!
//! Plain value types shared by the codec and the signal engine.
//!
//! ## Design Philosophy
//!
//! - **No I/O**: every type here is a pure value, cheap to copy or clone
//! - **Microsecond time base**: all timestamps are `i64` microseconds since the
//!   UNIX epoch, the same domain the exchange reports in (after scaling from ms)
//! - **Closed variants**: channel names and trade sides are decoded once into
//!   enums so the hot path matches instead of comparing strings
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{BookTop, PriceLevel, Direction, SignalSnapshot};
//!
//! let book = BookTop::new(
//!     1_700_000_000_000_000,
//!     PriceLevel::new(99.0, 3.0),
//!     PriceLevel::new(101.0, 1.0),
//! );
//! assert_eq!(book.mid_price(), 100.0);
//! assert_eq!(book.spread(), 2.0);
//! assert_eq!(book.imbalance(), 0.5);
//!
//! assert_eq!(Direction::from_probability(0.7), Direction::Long);
//! assert!((SignalSnapshot::confidence_for(0.7) - 0.4).abs() < 1e-12);
//! ```

pub mod latency;
pub mod market_data;
pub mod signal;
pub mod subscription;

pub use latency::{LatencyBreakdown, StageTimestamps};
pub use market_data::{millis_to_micros, BookTop, PriceLevel, Trade, TradeSide};
pub use signal::{Direction, FilterThresholds, SignalSnapshot};
pub use subscription::{ChannelKind, Subscription};
