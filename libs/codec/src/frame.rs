//! Frame payload extraction

use std::borrow::Cow;
use std::io::Read;

use flate2::read::DeflateDecoder;

/// Maximum number of payload bytes echoed into a decode-failure warning
pub const PREVIEW_LIMIT: usize = 80;

/// A data frame delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Binary frames may carry raw-deflate compressed JSON
    Binary(Vec<u8>),
}

impl Frame {
    /// JSON payload bytes of the frame
    ///
    /// Binary frames are inflated when they are valid raw deflate; otherwise
    /// the bytes are returned untouched and left for the JSON decoder to judge.
    pub fn payload(&self) -> Cow<'_, [u8]> {
        match self {
            Frame::Text(text) => Cow::Borrowed(text.as_bytes()),
            Frame::Binary(bytes) => match inflate_raw(bytes) {
                Ok(inflated) => Cow::Owned(inflated),
                Err(_) => Cow::Borrowed(bytes.as_slice()),
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inflate a raw (headerless) deflate stream
pub fn inflate_raw(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut out = Vec::with_capacity(bytes.len() * 4);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Lossy UTF-8 rendering of at most `limit` leading bytes
pub fn preview(payload: &[u8], limit: usize) -> String {
    let end = payload.len().min(limit);
    String::from_utf8_lossy(&payload[..end]).into_owned()
}
