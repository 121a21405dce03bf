//! End-to-end routing through the stream dispatcher with a scripted clock

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use codec::Frame;
use okx_signals::{Clock, FrameOutcome, StrategyConfig, StreamDispatcher};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// Replays a fixed sequence of timestamps, then repeats the last one
struct ScriptedClock {
    ticks: Vec<i64>,
    next: Cell<usize>,
}

impl ScriptedClock {
    fn new(ticks: Vec<i64>) -> Self {
        Self {
            ticks,
            next: Cell::new(0),
        }
    }
}

impl Clock for ScriptedClock {
    fn now_us(&self) -> i64 {
        let index = self.next.get().min(self.ticks.len() - 1);
        self.next.set(self.next.get() + 1);
        self.ticks[index]
    }
}

/// Counts events at a given level
struct LevelCounter {
    level: Level,
    count: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for LevelCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == self.level {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn count_events<R>(level: Level, f: impl FnOnce() -> R) -> (R, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(LevelCounter {
        level,
        count: count.clone(),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, count.load(Ordering::SeqCst))
}

const TS_MS: i64 = 1_700_000_000_000;
const TS_US: i64 = TS_MS * 1_000;

fn trades_frame() -> Frame {
    Frame::Text(format!(
        r#"{{"arg":{{"channel":"trades","instId":"HYPE-USDT"}},"data":[
            {{"instId":"HYPE-USDT","px":"24.5","sz":"3","side":"buy","ts":"{TS_MS}"}},
            {{"instId":"HYPE-USDT","px":"24.4","sz":"1","side":"sell","ts":"{TS_MS}"}}
        ]}}"#
    ))
}

fn book_frame(ts_ms: i64, bid: &str, ask: &str) -> Frame {
    Frame::Text(format!(
        r#"{{"arg":{{"channel":"books5","instId":"HYPE-USDT"}},"data":[
            {{"bids":[["{bid}","4","0","1"]],"asks":[["{ask}","1","0","1"]],"ts":"{ts_ms}"}}
        ]}}"#
    ))
}

#[test]
fn test_stage_breakdown_from_scripted_clock() {
    // parsed, computed, emitted
    let clock = ScriptedClock::new(vec![TS_US + 1_300, TS_US + 1_350, TS_US + 1_360]);
    let mut dispatcher =
        StreamDispatcher::with_clock(&StrategyConfig::default(), clock).unwrap();

    let frame = book_frame(TS_MS, "24.0", "24.2");
    let outcome = dispatcher.on_frame(&frame, TS_US + 1_000);
    assert_eq!(outcome, FrameOutcome::Data { entries: 1, processed: 1 });

    let latency = dispatcher.state().latency();
    assert_eq!(latency.sample_count("books5:HYPE-USDT"), 1);
    // net 1000 + parse 300 + factor 50 + dispatch 10
    assert_eq!(latency.percentiles("books5:HYPE-USDT"), Some(vec![1_360.0, 1_360.0]));
}

#[test]
fn test_clock_skew_is_clamped() {
    // local clock behind the exchange
    let clock = ScriptedClock::new(vec![TS_US - 400, TS_US - 300, TS_US - 300]);
    let mut dispatcher =
        StreamDispatcher::with_clock(&StrategyConfig::default(), clock).unwrap();

    dispatcher.on_frame(&book_frame(TS_MS, "24.0", "24.2"), TS_US - 500);
    let latency = dispatcher.state().latency();
    // only parse (100) and factor (100) survive clamping
    assert_eq!(latency.percentiles("books5:HYPE-USDT"), Some(vec![200.0, 200.0]));
}

#[test]
fn test_trades_and_books_share_instrument_pipeline() {
    let mut dispatcher = StreamDispatcher::new(&StrategyConfig::default()).unwrap();

    dispatcher.on_frame(&trades_frame(), TS_US);
    dispatcher.on_frame(&book_frame(TS_MS + 1, "24.0", "24.2"), TS_US);

    let state = dispatcher.state();
    assert_eq!(state.pipeline_count(), 1);
    let pipeline = state.pipeline("HYPE-USDT").unwrap();
    assert_eq!(pipeline.trade_count(), 2);
    let snapshot = pipeline.latest_snapshot().unwrap();
    assert_eq!(snapshot.volume_10ms, 4.0);

    assert_eq!(
        state.latency().keys(),
        vec!["books5:HYPE-USDT", "trades:HYPE-USDT"]
    );
    assert_eq!(state.latency().sample_count("trades:HYPE-USDT"), 2);
    assert_eq!(state.latency().sample_count("books5:HYPE-USDT"), 1);
}

#[test]
fn test_entry_inst_id_overrides_arg() {
    let mut dispatcher = StreamDispatcher::new(&StrategyConfig::default()).unwrap();
    let frame = Frame::Text(format!(
        r#"{{"arg":{{"channel":"trades","instId":"HYPE-USDT"}},"data":[
            {{"instId":"BTC-USDT","sz":"1","side":"buy","ts":"{TS_MS}"}}
        ]}}"#
    ));
    dispatcher.on_frame(&frame, TS_US);
    assert!(dispatcher.state().pipeline("BTC-USDT").is_some());
    assert!(dispatcher.state().pipeline("HYPE-USDT").is_none());
    assert_eq!(dispatcher.state().latency().sample_count("trades:BTC-USDT"), 1);
}

#[test]
fn test_malformed_entries_record_no_latency() {
    let mut dispatcher = StreamDispatcher::new(&StrategyConfig::default()).unwrap();
    let frame = Frame::Text(format!(
        r#"{{"arg":{{"channel":"trades","instId":"HYPE-USDT"}},"data":[
            {{"side":"buy","sz":"1"}},
            {{"side":"buy","sz":"lots","ts":"{TS_MS}"}},
            {{"side":"buy","sz":"2","ts":"{TS_MS}"}}
        ]}}"#
    ));
    let outcome = dispatcher.on_frame(&frame, TS_US);
    assert_eq!(outcome, FrameOutcome::Data { entries: 3, processed: 1 });
    assert_eq!(dispatcher.state().latency().sample_count("trades:HYPE-USDT"), 1);
    assert_eq!(dispatcher.state().pipeline("HYPE-USDT").unwrap().trade_count(), 1);
}

#[test]
fn test_invalid_payload_warns_once_and_leaves_rings_untouched() {
    let mut dispatcher = StreamDispatcher::new(&StrategyConfig::default()).unwrap();
    dispatcher.on_frame(&trades_frame(), TS_US);
    dispatcher.on_frame(&book_frame(TS_MS, "24.0", "24.2"), TS_US);
    let before = dispatcher.state().latency().total_samples();
    let keys_before: Vec<String> = dispatcher
        .state()
        .latency()
        .keys()
        .into_iter()
        .map(str::to_string)
        .collect();

    let Frame::Text(full) = book_frame(TS_MS + 5, "24.1", "24.3") else {
        unreachable!()
    };
    let truncated = Frame::Text(full[..full.len() / 2].to_string());

    let (outcome, warnings) = count_events(Level::WARN, || dispatcher.on_frame(&truncated, TS_US));

    assert_eq!(outcome, FrameOutcome::Dropped);
    assert_eq!(warnings, 1);
    assert_eq!(dispatcher.state().latency().total_samples(), before);
    for key in &keys_before {
        assert!(dispatcher.state().latency().sample_count(key) > 0);
    }
    assert_eq!(dispatcher.state().latency().keys().len(), keys_before.len());
}

#[test]
fn test_event_frames_do_not_warn() {
    let mut dispatcher = StreamDispatcher::new(&StrategyConfig::default()).unwrap();
    let frame = Frame::Text(
        r#"{"event":"error","code":"60018","msg":"Wrong URL or channel","connId":"a4d3ae55"}"#
            .to_string(),
    );
    let (outcome, warnings) = count_events(Level::WARN, || dispatcher.on_frame(&frame, TS_US));
    assert_eq!(outcome, FrameOutcome::Event);
    assert_eq!(warnings, 0);
}
