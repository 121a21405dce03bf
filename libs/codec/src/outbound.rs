//! Outbound control messages

use serde::Serialize;
use types::Subscription;

use crate::error::{CodecError, Result};

/// `{"op": "subscribe", "args": [...]}`
#[derive(Debug, Serialize)]
pub struct SubscribeRequest<'a> {
    pub op: &'static str,
    pub args: &'a [Subscription],
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(args: &'a [Subscription]) -> Self {
        Self {
            op: "subscribe",
            args,
        }
    }
}

/// Encode the subscribe request sent once per connection
pub fn encode_subscribe(subscriptions: &[Subscription]) -> Result<String> {
    serde_json::to_string(&SubscribeRequest::new(subscriptions)).map_err(CodecError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_subscribe() {
        let subs = vec![
            Subscription::new("trades", "BTC-USDT"),
            Subscription::new("books5", "BTC-USDT"),
        ];
        let text = encode_subscribe(&subs).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "op": "subscribe",
                "args": [
                    {"channel": "trades", "instId": "BTC-USDT"},
                    {"channel": "books5", "instId": "BTC-USDT"}
                ]
            })
        );
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(
            encode_subscribe(&[]).unwrap(),
            r#"{"op":"subscribe","args":[]}"#
        );
    }
}
