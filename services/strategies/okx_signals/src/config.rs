//! Strategy configuration
//!
//! Loaded from TOML, then environment overrides are applied, then the result is
//! validated once at startup. Every field has a default so a partial (or absent)
//! file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use types::{FilterThresholds, Subscription};
use url::Url;

use crate::error::{Result, StrategyError};
use crate::model::ModelParams;
use crate::pipeline::{PipelineSettings, VOLUME_WINDOWS};
use crate::volume::validate_windows;

pub const CONFIG_PATH_ENV: &str = "OKX_SIGNALS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "configs/okx_signals.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Public websocket endpoint
    pub ws_url: String,

    /// Channel/instrument pairs requested in the subscribe message
    pub subscriptions: Vec<Subscription>,

    /// Latency samples kept per channel:instrument key
    pub latency_window_capacity: usize,

    /// Trades kept per instrument for volume windows
    pub trade_buffer_capacity: usize,

    /// Volume horizons in microseconds, strictly increasing
    pub windows_us: [i64; VOLUME_WINDOWS],

    /// Percentile ranks shown on every processed-entry line
    pub percentile_targets: Vec<f64>,

    pub filter_thresholds: FilterThresholds,

    pub model: ModelParams,

    /// Seconds between `[latency]` summaries; 0 disables them
    pub report_interval_secs: u64,

    pub connect_timeout_ms: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://ws.okx.com:8443/ws/v5/public".to_string(),
            subscriptions: Subscription::trades_and_books(&["HYPE-USDT".to_string()]),
            latency_window_capacity: 2048,
            trade_buffer_capacity: 4096,
            windows_us: [10_000, 50_000, 100_000],
            percentile_targets: vec![50.0, 95.0],
            filter_thresholds: FilterThresholds::default(),
            model: ModelParams::default(),
            report_interval_secs: 10,
            connect_timeout_ms: 10_000,
        }
    }
}

impl StrategyConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            StrategyError::configuration(format!("Failed to parse TOML configuration: {e}"))
        })
    }

    /// Read `path` (defaults when it does not exist) and apply process environment overrides
    pub fn from_toml_with_env_overrides(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let text = fs::read_to_string(path)?;
            info!("Loaded configuration from {}", path.display());
            Self::from_toml_str(&text)?
        } else {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `OKX_WS_URL`, `OKX_SYMBOLS` and `OKX_REPORT_INTERVAL_SECS` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OKX_WS_URL") {
            self.ws_url = url;
        }

        if let Some(symbols) = lookup("OKX_SYMBOLS") {
            self.set_symbols(&symbols);
        }

        if let Some(secs) = lookup("OKX_REPORT_INTERVAL_SECS") {
            self.report_interval_secs = secs.trim().parse().map_err(|_| {
                StrategyError::configuration(format!(
                    "OKX_REPORT_INTERVAL_SECS must be a whole number of seconds, got {secs:?}"
                ))
            })?;
        }

        Ok(())
    }

    /// Replace subscriptions with `trades` + `books5` for each comma-separated symbol
    pub fn set_symbols(&mut self, symbols: &str) {
        let symbols: Vec<String> = symbols
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.subscriptions = Subscription::trades_and_books(&symbols);
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscriptions.is_empty() {
            return Err(StrategyError::configuration("No subscriptions configured"));
        }

        let url = Url::parse(&self.ws_url).map_err(|e| {
            StrategyError::configuration(format!("Invalid WebSocket URL {}: {e}", self.ws_url))
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(StrategyError::configuration(format!(
                "Invalid WebSocket URL scheme: {}",
                url.scheme()
            )));
        }

        if self.latency_window_capacity == 0 || self.trade_buffer_capacity == 0 {
            return Err(StrategyError::configuration(
                "Buffer capacities must be greater than zero",
            ));
        }

        validate_windows(&self.windows_us)?;

        if self
            .percentile_targets
            .iter()
            .any(|p| !(0.0..=100.0).contains(p))
        {
            return Err(StrategyError::configuration(
                "Percentile targets must be within [0, 100]",
            ));
        }

        self.model.validate()?;

        let thresholds = &self.filter_thresholds;
        if thresholds.max_probability_short > thresholds.min_probability_long {
            return Err(StrategyError::configuration(format!(
                "max_probability_short ({}) must not exceed min_probability_long ({})",
                thresholds.max_probability_short, thresholds.min_probability_long
            )));
        }

        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            trade_buffer_capacity: self.trade_buffer_capacity,
            windows_us: self.windows_us,
            model: self.model,
        }
    }

    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval_secs > 0).then(|| Duration::from_secs(self.report_interval_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// CLI path, else `$OKX_SIGNALS_CONFIG_PATH`, else the default path
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
