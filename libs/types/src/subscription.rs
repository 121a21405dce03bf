//! Channel subscriptions and channel classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `{channel, instId}` pair of a subscribe request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub channel: String,
    #[serde(rename = "instId")]
    pub inst_id: String,
}

impl Subscription {
    pub fn new(channel: impl Into<String>, inst_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            inst_id: inst_id.into(),
        }
    }

    /// Trades plus five-level book for every symbol, in symbol order
    pub fn trades_and_books(symbols: &[String]) -> Vec<Subscription> {
        symbols
            .iter()
            .flat_map(|symbol| {
                [
                    Subscription::new("trades", symbol.as_str()),
                    Subscription::new("books5", symbol.as_str()),
                ]
            })
            .collect()
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.inst_id)
    }
}

/// What kind of data a channel carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// `trades`
    Trades,
    /// Any channel whose name starts with `books` (`books`, `books5`, ...)
    Books,
    Other,
}

impl ChannelKind {
    pub fn from_channel(channel: &str) -> Self {
        if channel == "trades" {
            ChannelKind::Trades
        } else if channel.starts_with("books") {
            ChannelKind::Books
        } else {
            ChannelKind::Other
        }
    }
}
