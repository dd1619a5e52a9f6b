//! Length-prefixed message framing over a byte stream.
//!
//! Every message is a fixed 64-byte header holding the payload length as
//! space-padded ASCII decimal, followed by exactly that many payload bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::DEFAULT_MAX_FRAME_LEN;

pub const HEADER_LEN: usize = 64;

/// Text a client sends as its very first frame.
pub const GREETING: &str = "hello";

/// Text a client may send in place of a per-tick record to leave.
pub const DISCONNECT_MESSAGE: &str = "!DISCONNECT";

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("connection closed by peer")]
    Closed,
    #[error("invalid length header {0:?}")]
    InvalidHeader(String),
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
    #[error("payload is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("payload json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => FrameError::Closed,
            _ => FrameError::Io(err),
        }
    }
}

/// Builds the header announcing a payload of `len` bytes.
pub fn encode_header(len: usize) -> [u8; HEADER_LEN] {
    let digits = len.to_string();
    let mut header = [b' '; HEADER_LEN];
    header[..digits.len()].copy_from_slice(digits.as_bytes());
    header
}

/// Reads the payload length back out of a header.
pub fn parse_header(header: &[u8]) -> Result<usize, FrameError> {
    let text = String::from_utf8_lossy(header);
    let trimmed = text.trim();
    trimmed
        .parse::<usize>()
        .map_err(|_| FrameError::InvalidHeader(trimmed.to_string()))
}

/// A byte stream speaking the framed protocol.
pub struct FramedStream<S> {
    inner: S,
    max_frame_len: usize,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self::with_max_frame_len(inner, DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(inner: S, max_frame_len: usize) -> Self {
        Self {
            inner,
            max_frame_len,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() > self.max_frame_len {
            return Err(FrameError::TooLarge {
                len: payload.len(),
                max: self.max_frame_len,
            });
        }

        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&encode_header(payload.len()));
        frame.extend_from_slice(payload);

        self.inner.write_all(&frame).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Blocks until a whole header and its payload have arrived.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut header = [0u8; HEADER_LEN];
        self.inner.read_exact(&mut header).await?;

        let len = parse_header(&header)?;
        if len > self.max_frame_len {
            return Err(FrameError::TooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let mut payload = vec![0u8; len];
        self.inner.read_exact(&mut payload).await?;
        Ok(payload)
    }

    pub async fn send_text(&mut self, text: &str) -> Result<(), FrameError> {
        self.write_frame(text.as_bytes()).await
    }

    pub async fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), FrameError> {
        let payload = serde_json::to_vec(value)?;
        self.write_frame(&payload).await
    }

    pub async fn recv_text(&mut self) -> Result<String, FrameError> {
        let payload = self.read_frame().await?;
        Ok(String::from_utf8(payload)?)
    }

    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> Result<T, FrameError> {
        let payload = self.read_frame().await?;
        Ok(serde_json::from_slice(&payload)?)
    }

    pub async fn shutdown(&mut self) -> Result<(), FrameError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
