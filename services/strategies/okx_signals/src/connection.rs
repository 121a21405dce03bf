//! WebSocket transport
//!
//! [`FeedTransport`] is the seam between the session loop and the network:
//! frames come out in arrival order, keepalive is handled inside
//! [`FeedTransport::next_frame`], and `Ok(None)` means the remote side closed.

use std::time::Duration;

use async_trait::async_trait;
use codec::Frame;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::{Result, StrategyError};

#[async_trait]
pub trait FeedTransport: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Next data frame; `None` once the connection has closed
    async fn next_frame(&mut self) -> Result<Option<Frame>>;

    async fn close(&mut self) -> Result<()>;
}

pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let (stream, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| StrategyError::ConnectionTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })??;
        info!("✅ WebSocket connected to {}", url);
        Ok(Self { stream })
    }
}

#[async_trait]
impl FeedTransport for WebSocketTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(Frame::Text(text))),
                Some(Ok(Message::Binary(bytes))) => return Ok(Some(Frame::Binary(bytes))),
                Some(Ok(Message::Ping(payload))) => {
                    self.stream.send(Message::Pong(payload)).await?;
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    debug!("Close frame received: {:?}", frame);
                    return Ok(None);
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
