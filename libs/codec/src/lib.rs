//! # OKX Public Channel Codec
//!
//! ## Purpose
//!
//! Byte-level boundary between the websocket transport and the signal engine:
//! - Extracts the JSON payload from a frame (text as-is, binary via raw deflate
//!   with a passthrough fallback)
//! - Decodes a payload once into a closed [`InboundMessage`]
//! - Decodes each data entry into a typed [`MarketEntry`] variant chosen by the
//!   channel kind, so routing downstream is a `match`, not string comparison
//! - Encodes the outgoing subscribe request
//!
//! ## Architecture Role
//!
//! ```text
//! transport Frame → [payload] → [decode_message] → InboundMessage::{Event, Data}
//!                                                           ↓
//!                                           MarketEntry::{Trade, Book, Other}
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Numeric validation of entry fields (the feature pipeline decides whether an
//!   entry is usable and drops it otherwise)
//! - Socket management or connection handling
//!
//! ## Example
//!
//! ```rust
//! use codec::{decode_message, InboundMessage, MarketEntry};
//!
//! let payload = br#"{"arg":{"channel":"trades","instId":"BTC-USDT"},
//!                    "data":[{"ts":"1700000000000","side":"buy","px":"1","sz":"2"}]}"#;
//! match decode_message(payload).unwrap() {
//!     InboundMessage::Data(message) => {
//!         assert_eq!(message.inst_id, "BTC-USDT");
//!         assert!(matches!(message.entries[0], MarketEntry::Trade(_)));
//!     }
//!     InboundMessage::Event(_) => unreachable!(),
//! }
//! ```

pub mod error;
pub mod frame;
pub mod inbound;
pub mod outbound;

pub use error::{CodecError, Result};
pub use frame::{inflate_raw, preview, Frame, PREVIEW_LIMIT};
pub use inbound::{
    decode_message, ControlEvent, DataMessage, InboundMessage, MarketEntry, RawBook, RawTrade,
    Scalar,
};
pub use outbound::{encode_subscribe, SubscribeRequest};
