//! # Per-Instrument Feature Pipeline
//!
//! ## Purpose
//!
//! Turns raw trade prints and book updates for one instrument into the model's
//! feature vector, trains the model from realised mid-price moves, and emits a
//! [`SignalSnapshot`] for every usable book update.
//!
//! ## Training Without Look-Ahead
//!
//! Each book update leaves behind a pending `(features, mid)` pair. The next book
//! update labels it (1 if mid rose, 0 if it fell) and trains on it; an unchanged
//! mid carries no label and the step is skipped. The probability reported for
//! the new update comes from its own features, so training always lags the
//! prediction by one update.
//!
//! ```text
//! book₀ → predict(f₀), pending=(f₀,m₀)
//! book₁ → update(f₀, m₁≷m₀), predict(f₁), pending=(f₁,m₁)
//! ```
//!
//! ## Malformed Input
//!
//! Parse steps return `None` instead of failing; a dropped entry leaves the
//! volume history, the model and the pending label untouched.

use codec::{RawBook, RawTrade, Scalar};
use types::{millis_to_micros, BookTop, Direction, PriceLevel, SignalSnapshot, Trade, TradeSide};

use crate::error::Result;
use crate::model::{FeatureVector, ModelParams, OnlineDirectionalModel, FEATURE_DIM};
use crate::volume::WindowedVolumeAggregator;

/// Number of volume horizons feeding the feature vector
pub const VOLUME_WINDOWS: usize = 3;

/// Construction parameters shared by every instrument's pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub trade_buffer_capacity: usize,
    pub windows_us: [i64; VOLUME_WINDOWS],
    pub model: ModelParams,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            trade_buffer_capacity: 4096,
            windows_us: [10_000, 50_000, 100_000],
            model: ModelParams::default(),
        }
    }
}

/// What a recorded trade looked like, for the caller's log line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeSummary {
    pub ts_us: i64,
    pub side: TradeSide,
    pub price: Option<f64>,
    pub signed_volume: f64,
    pub abs_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingLabel {
    features: FeatureVector,
    mid_price: f64,
}

#[derive(Debug)]
pub struct FeaturePipeline {
    instrument: String,
    trades: WindowedVolumeAggregator,
    windows_us: [i64; VOLUME_WINDOWS],
    model: OnlineDirectionalModel,
    pending: Option<PendingLabel>,
    latest_snapshot: Option<SignalSnapshot>,
}

impl FeaturePipeline {
    pub fn new(instrument: impl Into<String>, settings: &PipelineSettings) -> Result<Self> {
        Ok(Self {
            instrument: instrument.into(),
            trades: WindowedVolumeAggregator::new(settings.trade_buffer_capacity)?,
            windows_us: settings.windows_us,
            model: OnlineDirectionalModel::new(settings.model),
            pending: None,
            latest_snapshot: None,
        })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Append a trade print to the volume history
    pub fn record_trade(&mut self, entry: &RawTrade) -> Option<TradeSummary> {
        let trade = parse_trade(entry)?;
        Some(self.apply_trade(&trade))
    }

    pub fn apply_trade(&mut self, trade: &Trade) -> TradeSummary {
        let signed_volume = trade.signed_volume();
        self.trades.add_trade(trade.ts_us, signed_volume);
        TradeSummary {
            ts_us: trade.ts_us,
            side: trade.side,
            price: trade.price,
            signed_volume,
            abs_volume: signed_volume.abs(),
        }
    }

    /// Train on the pending label, predict on this update, and re-arm
    pub fn process_book(&mut self, entry: &RawBook) -> Option<SignalSnapshot> {
        let top = parse_book_top(entry)?;
        Some(self.apply_book(&top))
    }

    pub fn apply_book(&mut self, top: &BookTop) -> SignalSnapshot {
        let spread = top.spread();
        let imbalance = top.imbalance();
        let mid_price = top.mid_price();

        let mut volumes = [0.0; VOLUME_WINDOWS];
        self.trades
            .window_volumes_into(top.ts_us, &self.windows_us, &mut volumes);
        let features: FeatureVector = [imbalance, spread, volumes[0], volumes[1], volumes[2]];

        if let Some(pending) = self.pending.take() {
            if mid_price > pending.mid_price {
                self.model.update(&pending.features, 1.0);
            } else if mid_price < pending.mid_price {
                self.model.update(&pending.features, 0.0);
            }
        }

        let probability = self.model.predict(&features);
        self.pending = Some(PendingLabel {
            features,
            mid_price,
        });

        let snapshot = SignalSnapshot {
            mid_price,
            spread,
            imbalance_top1: imbalance,
            volume_10ms: volumes[0],
            volume_50ms: volumes[1],
            volume_100ms: volumes[2],
            probability,
            confidence: SignalSnapshot::confidence_for(probability),
            direction: Direction::from_probability(probability),
        };
        self.latest_snapshot = Some(snapshot);
        snapshot
    }

    /// Snapshot from the most recent usable book update
    pub fn latest_snapshot(&self) -> Option<&SignalSnapshot> {
        self.latest_snapshot.as_ref()
    }

    pub fn has_pending_label(&self) -> bool {
        self.pending.is_some()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn model(&self) -> &OnlineDirectionalModel {
        &self.model
    }
}

const _: () = assert!(FEATURE_DIM == 2 + VOLUME_WINDOWS);

/// Exchange `ts` (milliseconds) as microseconds
pub fn parse_ts_us(ts: Option<&Scalar>) -> Option<i64> {
    ts?.as_i64().map(millis_to_micros)
}

/// Trade with a usable timestamp and size; price is optional
pub fn parse_trade(entry: &RawTrade) -> Option<Trade> {
    let ts_us = parse_ts_us(entry.ts.as_ref())?;
    let size = entry.sz.as_ref()?.as_f64()?;
    let side = entry
        .side
        .as_deref()
        .map(TradeSide::parse)
        .unwrap_or(TradeSide::Unknown);
    let price = entry.px.as_ref().and_then(Scalar::as_f64);
    Some(Trade {
        ts_us,
        side,
        price,
        size,
    })
}

/// Best bid and ask of a book update; `None` if either side is empty or unparseable
pub fn parse_book_top(entry: &RawBook) -> Option<BookTop> {
    let ts_us = parse_ts_us(entry.ts.as_ref())?;
    let best_bid = parse_level(entry.bids.first()?)?;
    let best_ask = parse_level(entry.asks.first()?)?;
    Some(BookTop::new(ts_us, best_bid, best_ask))
}

fn parse_level(level: &[Scalar]) -> Option<PriceLevel> {
    let price = level.first()?.as_f64()?;
    let size = level.get(1)?.as_f64()?;
    Some(PriceLevel::new(price, size))
}
