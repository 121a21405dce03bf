//! # OKX Signals Strategy
//!
//! ## Purpose
//!
//! Streams OKX public trades and top-of-book updates, produces a per-instrument
//! directional signal from an online logistic model, and measures how long
//! every entry spends in each processing stage.
//!
//! ## Architecture Role
//!
//! ```text
//! WebSocketTransport → run_session → StreamDispatcher → FeaturePipeline (per instrument)
//!                                          │                  ├─ WindowedVolumeAggregator
//!                                          │                  └─ OnlineDirectionalModel
//!                                          ├─ SignalFilter
//!                                          └─ LatencyInstrumentation (RingBuffer per channel:instrument)
//! ```
//!
//! ## Concurrency
//!
//! Single-threaded per connection. All mutable state belongs to the connection's
//! dispatcher and is only touched from its session loop, so nothing is locked.
//!
//! ## Performance Profile
//!
//! - **Trade**: O(1) ring append
//! - **Book**: O(n) prefix sum over the trade history plus O(log n) per window
//! - **Latency percentiles**: computed per emitted line over at most
//!   `latency_window_capacity` samples

pub mod clock;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod latency_instrumentation;
pub mod model;
pub mod pipeline;
pub mod ring;
pub mod session;
pub mod volume;

pub use clock::{Clock, SystemClock};
pub use config::{resolve_config_path, StrategyConfig};
pub use connection::{FeedTransport, WebSocketTransport};
pub use dispatcher::{FrameOutcome, SessionState, StreamDispatcher};
pub use error::{Result, StrategyError};
pub use filter::SignalFilter;
pub use latency_instrumentation::{LatencyInstrumentation, LatencySummary};
pub use model::{FeatureVector, ModelParams, OnlineDirectionalModel, FEATURE_DIM};
pub use pipeline::{FeaturePipeline, PipelineSettings, TradeSummary};
pub use ring::RingBuffer;
pub use session::{run_session, SessionEnd};
pub use volume::WindowedVolumeAggregator;
