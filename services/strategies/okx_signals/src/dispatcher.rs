//! # Stream Dispatcher
//!
//! ## Purpose
//!
//! Per-connection router between the transport and the analytics engine. Each
//! frame is decoded once; control events are logged and stop there, data
//! entries are routed by their decoded variant to the instrument's
//! [`FeaturePipeline`], with stage timestamps captured around each step.
//!
//! ## Architecture Role
//!
//! ```text
//! Frame → decode → Event  → [event] log line
//!                → Data   → Trade → FeaturePipeline::record_trade  → [trade] line
//!                         → Book  → FeaturePipeline::process_book  → [signal] line
//!                         → Other → ignored
//! ```
//!
//! ## State Ownership
//!
//! All per-instrument state lives in a [`SessionState`] built when the
//! dispatcher is created for a connection. Pipelines are keyed by instrument,
//! latency rings by `channel:instrument`; both are created on the first entry
//! with a usable timestamp and kept for the life of the connection.
//!
//! ## Failure Handling
//!
//! - Undecodable frame: one warning with a bounded preview, frame dropped
//! - Entry without a usable `ts`: skipped before any state is created
//! - Malformed trade/book fields: skipped silently, no sample recorded

use std::collections::HashMap;

use codec::{
    decode_message, encode_subscribe, preview, ControlEvent, Frame, InboundMessage, MarketEntry,
    PREVIEW_LIMIT,
};
use tracing::{debug, error, info, warn};
use types::{ChannelKind, LatencyBreakdown, SignalSnapshot, StageTimestamps, Subscription};

use crate::clock::{Clock, SystemClock};
use crate::config::StrategyConfig;
use crate::error::{Result, StrategyError};
use crate::filter::SignalFilter;
use crate::latency_instrumentation::LatencyInstrumentation;
use crate::pipeline::{parse_ts_us, FeaturePipeline, PipelineSettings, TradeSummary};

/// What happened to one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Payload could not be decoded
    Dropped,
    /// Control or informational message
    Event,
    /// Data message; `processed` entries produced a log line and a latency sample
    Data { entries: usize, processed: usize },
}

/// Pipelines and latency rings for one connection
#[derive(Debug)]
pub struct SessionState {
    pipelines: HashMap<String, FeaturePipeline>,
    latency: LatencyInstrumentation,
}

impl SessionState {
    pub fn new(latency: LatencyInstrumentation) -> Self {
        Self {
            pipelines: HashMap::new(),
            latency,
        }
    }

    pub fn pipeline(&self, inst_id: &str) -> Option<&FeaturePipeline> {
        self.pipelines.get(inst_id)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn latency(&self) -> &LatencyInstrumentation {
        &self.latency
    }
}

pub struct StreamDispatcher<C: Clock = SystemClock> {
    clock: C,
    subscriptions: Vec<Subscription>,
    settings: PipelineSettings,
    filter: SignalFilter,
    state: SessionState,
}

impl StreamDispatcher<SystemClock> {
    pub fn new(config: &StrategyConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> StreamDispatcher<C> {
    pub fn with_clock(config: &StrategyConfig, clock: C) -> Result<Self> {
        let settings = config.pipeline_settings();
        // surfaces bad capacities now rather than on the first entry
        FeaturePipeline::new("", &settings)?;
        let latency = LatencyInstrumentation::new(
            config.latency_window_capacity,
            config.percentile_targets.clone(),
        )?;
        Ok(Self {
            clock,
            subscriptions: config.subscriptions.clone(),
            settings,
            filter: SignalFilter::new(config.filter_thresholds),
            state: SessionState::new(latency),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Subscribe message to send once the connection is established
    pub fn subscribe_request(&self) -> Result<String> {
        Ok(encode_subscribe(&self.subscriptions)?)
    }

    pub fn log_subscribed(&self) {
        let channels: Vec<String> = self.subscriptions.iter().map(|s| s.to_string()).collect();
        info!("[startup] Subscribed to {}", channels.join(", "));
    }

    pub fn log_latency_summary(&self) {
        self.state.latency.log_summary();
    }

    /// Decode and route one frame; `received_us` is taken as soon as the frame arrives
    pub fn on_frame(&mut self, frame: &Frame, received_us: i64) -> FrameOutcome {
        let payload = frame.payload();
        let message = match decode_message(&payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    error = %e,
                    "[warn] Unable to decode message {}",
                    preview(&payload, PREVIEW_LIMIT)
                );
                return FrameOutcome::Dropped;
            }
        };
        let parsed_us = self.clock.now_us();

        match message {
            InboundMessage::Event(event) => {
                log_event(&event);
                FrameOutcome::Event
            }
            InboundMessage::Data(message) => {
                let mut processed = 0;
                for entry in &message.entries {
                    let stamps = EntryClock {
                        received_us,
                        parsed_us,
                    };
                    if self.process_entry(
                        &message.channel,
                        message.kind,
                        &message.inst_id,
                        entry,
                        stamps,
                    ) {
                        processed += 1;
                    }
                }
                FrameOutcome::Data {
                    entries: message.entries.len(),
                    processed,
                }
            }
        }
    }

    fn process_entry(
        &mut self,
        channel: &str,
        kind: ChannelKind,
        message_inst: &str,
        entry: &MarketEntry,
        stamps: EntryClock,
    ) -> bool {
        if kind == ChannelKind::Other {
            return false;
        }
        let Some(exchange_us) = parse_ts_us(entry.ts()) else {
            return false;
        };
        let inst_id = entry.inst_id().unwrap_or(message_inst);
        let key = format!("{channel}:{inst_id}");
        self.state.latency.ensure_key(&key);

        let pipeline = match pipeline_for(&mut self.state.pipelines, inst_id, &self.settings) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                error!("Failed to create pipeline for {}: {}", inst_id, e);
                return false;
            }
        };

        let mut timestamps = StageTimestamps {
            exchange_us,
            received_us: stamps.received_us,
            parsed_us: stamps.parsed_us,
            ..StageTimestamps::default()
        };

        match entry {
            MarketEntry::Trade(raw) => {
                let summary = pipeline.record_trade(raw);
                timestamps.computed_us = self.clock.now_us();
                let Some(summary) = summary else {
                    return false;
                };
                let signal_text = pipeline
                    .latest_snapshot()
                    .filter(|snapshot| self.filter.allow(snapshot))
                    .map(format_signal_suffix)
                    .unwrap_or_default();
                timestamps.emitted_us = self.clock.now_us();

                let breakdown = timestamps.breakdown();
                let stats = self.record(&key, &breakdown);
                info!(
                    "[trade] {} {:>4} px={} vol={:.4} {}{}{}",
                    inst_id,
                    summary.side,
                    format_price(&summary),
                    summary.abs_volume,
                    breakdown,
                    stats,
                    signal_text
                );
                true
            }
            MarketEntry::Book(raw) => {
                let snapshot = pipeline.process_book(raw);
                timestamps.computed_us = self.clock.now_us();
                let Some(snapshot) = snapshot else {
                    return false;
                };
                let allowed = self.filter.allow(&snapshot);
                timestamps.emitted_us = self.clock.now_us();

                let breakdown = timestamps.breakdown();
                let stats = self.record(&key, &breakdown);
                if allowed {
                    log_signal(inst_id, &snapshot, &breakdown, &stats);
                } else {
                    debug!(
                        "[book] {} filtered dir={} prob={:.3} conf={:.3} {}",
                        inst_id, snapshot.direction, snapshot.probability, snapshot.confidence, breakdown
                    );
                }
                true
            }
            MarketEntry::Other => false,
        }
    }

    fn record(&mut self, key: &str, breakdown: &LatencyBreakdown) -> String {
        self.state.latency.record(key, breakdown.total_us());
        self.state.latency.format_stats(key)
    }
}

#[derive(Debug, Clone, Copy)]
struct EntryClock {
    received_us: i64,
    parsed_us: i64,
}

fn pipeline_for<'a>(
    pipelines: &'a mut HashMap<String, FeaturePipeline>,
    inst_id: &str,
    settings: &PipelineSettings,
) -> Result<&'a mut FeaturePipeline> {
    if !pipelines.contains_key(inst_id) {
        let pipeline = FeaturePipeline::new(inst_id, settings)?;
        pipelines.insert(inst_id.to_string(), pipeline);
    }
    pipelines
        .get_mut(inst_id)
        .ok_or_else(|| StrategyError::configuration(format!("no pipeline for {inst_id}")))
}

fn log_event(event: &ControlEvent) {
    let arg = event
        .arg
        .as_ref()
        .map(|arg| arg.to_string())
        .unwrap_or_else(|| "{}".to_string());
    match (&event.code, &event.msg) {
        (Some(code), Some(msg)) if !code.is_empty() && code != "0" => {
            info!("[event] {} {} code={} msg={}", event.event, arg, code, msg)
        }
        _ => info!("[event] {} {}", event.event, arg),
    }
}

fn log_signal(inst_id: &str, snapshot: &SignalSnapshot, breakdown: &LatencyBreakdown, stats: &str) {
    info!(
        "[signal] {} mid={:.6} spread={:.6} imbalance={:.3} vol10={:.4} vol50={:.4} vol100={:.4} prob={:.3} conf={:.3} dir={} {}{}",
        inst_id,
        snapshot.mid_price,
        snapshot.spread,
        snapshot.imbalance_top1,
        snapshot.volume_10ms,
        snapshot.volume_50ms,
        snapshot.volume_100ms,
        snapshot.probability,
        snapshot.confidence,
        snapshot.direction,
        breakdown,
        stats
    );
}

fn format_signal_suffix(snapshot: &SignalSnapshot) -> String {
    format!(
        " signal={} p={:.3} conf={:.3}",
        snapshot.direction, snapshot.probability, snapshot.confidence
    )
}

fn format_price(summary: &TradeSummary) -> String {
    match summary.price {
        Some(price) if !price.is_nan() => format!("{price:.6}"),
        _ => "nan".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Advances by a fixed step on every read
    struct StepClock {
        now: Cell<i64>,
        step: i64,
    }

    impl Clock for StepClock {
        fn now_us(&self) -> i64 {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    fn dispatcher(start_us: i64) -> StreamDispatcher<StepClock> {
        StreamDispatcher::with_clock(
            &StrategyConfig::default(),
            StepClock {
                now: Cell::new(start_us),
                step: 10,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_subscribe_request() {
        let d = dispatcher(0);
        assert_eq!(
            d.subscribe_request().unwrap(),
            r#"{"op":"subscribe","args":[{"channel":"trades","instId":"HYPE-USDT"},{"channel":"books5","instId":"HYPE-USDT"}]}"#
        );
    }

    #[test]
    fn test_event_touches_no_state() {
        let mut d = dispatcher(0);
        let frame = Frame::Text(r#"{"event":"subscribe","arg":{"channel":"trades","instId":"HYPE-USDT"}}"#.into());
        assert_eq!(d.on_frame(&frame, 0), FrameOutcome::Event);
        assert_eq!(d.state().pipeline_count(), 0);
        assert!(d.state().latency().keys().is_empty());
    }

    #[test]
    fn test_trade_records_latency() {
        let mut d = dispatcher(1_700_000_000_100_000);
        let frame = Frame::Text(
            r#"{"arg":{"channel":"trades","instId":"HYPE-USDT"},"data":[{"ts":"1700000000000","side":"buy","px":"24.1","sz":"2"}]}"#.into(),
        );
        let outcome = d.on_frame(&frame, 1_700_000_000_050_000);
        assert_eq!(outcome, FrameOutcome::Data { entries: 1, processed: 1 });
        assert_eq!(d.state().latency().sample_count("trades:HYPE-USDT"), 1);
        assert_eq!(d.state().pipeline("HYPE-USDT").unwrap().trade_count(), 1);
    }

    #[test]
    fn test_entry_without_ts_creates_nothing() {
        let mut d = dispatcher(0);
        let frame = Frame::Text(
            r#"{"arg":{"channel":"books5","instId":"HYPE-USDT"},"data":[{"bids":[["1","1"]],"asks":[["2","1"]]}]}"#.into(),
        );
        assert_eq!(
            d.on_frame(&frame, 0),
            FrameOutcome::Data { entries: 1, processed: 0 }
        );
        assert_eq!(d.state().pipeline_count(), 0);
        assert!(d.state().latency().keys().is_empty());
    }

    #[test]
    fn test_other_channel_ignored() {
        let mut d = dispatcher(0);
        let frame = Frame::Text(
            r#"{"arg":{"channel":"tickers","instId":"HYPE-USDT"},"data":[{"ts":"1"}]}"#.into(),
        );
        assert_eq!(
            d.on_frame(&frame, 0),
            FrameOutcome::Data { entries: 1, processed: 0 }
        );
        assert_eq!(d.state().pipeline_count(), 0);
    }

    #[test]
    fn test_price_formatting() {
        let mut summary = TradeSummary {
            ts_us: 0,
            side: types::TradeSide::Buy,
            price: Some(1.5),
            signed_volume: 1.0,
            abs_volume: 1.0,
        };
        assert_eq!(format_price(&summary), "1.500000");
        summary.price = None;
        assert_eq!(format_price(&summary), "nan");
        summary.price = Some(f64::NAN);
        assert_eq!(format_price(&summary), "nan");
    }
}
