//! Inbound message decoding
//!
//! A payload is parsed once into a [`serde_json::Value`], classified as either a
//! control event or a data message, and each data entry is then decoded into a
//! typed record according to the channel kind. Numeric fields stay as
//! [`Scalar`] so the pipeline owns the "missing or non-numeric" decision.

use serde::Deserialize;
use serde_json::{Map, Value};
use types::ChannelKind;

use crate::error::{CodecError, Result};

/// Channel reported when a data message carries no `arg.channel`
pub const UNKNOWN_CHANNEL: &str = "unknown";
/// Instrument reported when neither the message nor the entry names one
pub const UNKNOWN_INSTRUMENT: &str = "?";

/// JSON field that is sent either as a string or as a bare number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(f64),
}

impl Scalar {
    /// Numeric value, if the field holds one (strings are parsed after trimming)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Text(text) => text.trim().parse::<f64>().ok(),
            Scalar::Number(value) => Some(*value),
        }
    }

    /// Integer value; fractional numbers are rejected
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| integral(text.parse::<f64>().ok()?))
            }
            Scalar::Number(value) => integral(*value),
        }
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Trade print as sent on the `trades` channel
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTrade {
    #[serde(default)]
    pub ts: Option<Scalar>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub px: Option<Scalar>,
    #[serde(default)]
    pub sz: Option<Scalar>,
    #[serde(default, rename = "instId")]
    pub inst_id: Option<String>,
}

/// Order-book update as sent on `books*` channels; levels are `[price, size, ...]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawBook {
    #[serde(default)]
    pub ts: Option<Scalar>,
    #[serde(default)]
    pub bids: Vec<Vec<Scalar>>,
    #[serde(default)]
    pub asks: Vec<Vec<Scalar>>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "instId")]
    pub inst_id: Option<String>,
}

/// One decoded element of a data message's `data` array
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEntry {
    Trade(RawTrade),
    Book(RawBook),
    /// Entry on a channel this engine does not consume
    Other,
}

impl MarketEntry {
    /// Exchange timestamp field, before any numeric validation
    pub fn ts(&self) -> Option<&Scalar> {
        match self {
            MarketEntry::Trade(trade) => trade.ts.as_ref(),
            MarketEntry::Book(book) => book.ts.as_ref(),
            MarketEntry::Other => None,
        }
    }

    /// Entry-level instrument override
    pub fn inst_id(&self) -> Option<&str> {
        match self {
            MarketEntry::Trade(trade) => trade.inst_id.as_deref(),
            MarketEntry::Book(book) => book.inst_id.as_deref(),
            MarketEntry::Other => None,
        }
    }
}

/// Control or informational message (`subscribe` ack, `error`, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
    pub event: String,
    pub arg: Option<Value>,
    pub code: Option<String>,
    pub msg: Option<String>,
}

/// Market data for one channel/instrument pair
#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub channel: String,
    pub inst_id: String,
    pub kind: ChannelKind,
    pub entries: Vec<MarketEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Event(ControlEvent),
    Data(DataMessage),
}

/// Decode a frame payload
///
/// Fails only when the payload is not a JSON object. Data entries that do not
/// match the channel's record shape are dropped.
pub fn decode_message(payload: &[u8]) -> Result<InboundMessage> {
    let value: Value = serde_json::from_slice(payload)?;
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(CodecError::NotAnObject {
                found: json_kind(&other),
            })
        }
    };

    if let Some(event) = event_name(&object) {
        return Ok(InboundMessage::Event(ControlEvent {
            event,
            arg: object.remove("arg"),
            code: text_field(&object, "code"),
            msg: text_field(&object, "msg"),
        }));
    }

    let arg = object.get("arg");
    let channel = arg
        .and_then(|arg| arg.get("channel"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_CHANNEL)
        .to_string();
    let inst_id = arg
        .and_then(|arg| arg.get("instId"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_INSTRUMENT)
        .to_string();
    let kind = ChannelKind::from_channel(&channel);

    let entries = match object.remove("data") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| decode_entry(kind, item))
            .collect(),
        _ => Vec::new(),
    };

    Ok(InboundMessage::Data(DataMessage {
        channel,
        inst_id,
        kind,
        entries,
    }))
}

fn decode_entry(kind: ChannelKind, item: Value) -> Option<MarketEntry> {
    match kind {
        ChannelKind::Trades => RawTrade::deserialize(item).ok().map(MarketEntry::Trade),
        ChannelKind::Books => RawBook::deserialize(item).ok().map(MarketEntry::Book),
        ChannelKind::Other => Some(MarketEntry::Other),
    }
}

fn event_name(object: &Map<String, Value>) -> Option<String> {
    match object.get("event")? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
