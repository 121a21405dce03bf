//! Error types for the OKX signals strategy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Codec error: {0}")]
    Codec(#[from] codec::CodecError),

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },

    #[error("Connection closed by remote")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    pub fn configuration(message: impl Into<String>) -> Self {
        StrategyError::Configuration {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        StrategyError::Transport {
            message: message.into(),
        }
    }

    /// Errors that end the current connection; the caller decides whether to reconnect
    pub fn is_terminal_for_connection(&self) -> bool {
        matches!(
            self,
            StrategyError::Transport { .. }
                | StrategyError::WebSocket(_)
                | StrategyError::ConnectionTimeout { .. }
                | StrategyError::Disconnected
                | StrategyError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
