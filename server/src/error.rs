use shared::FrameError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::AcquireError;

/// Why a single client session ended abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Framing(#[from] FrameError),
    #[error("protocol violation while {stage}: {detail}")]
    ProtocolViolation { stage: &'static str, detail: String },
    #[error("no frame received within {0:?}")]
    TimedOut(Duration),
    #[error("no free slot for {0}")]
    SlotUnavailable(SocketAddr),
}

impl SessionError {
    /// True for a peer that simply went away.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SessionError::Framing(FrameError::Closed))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("slot permits closed")]
    SlotsClosed(#[from] AcquireError),
}
