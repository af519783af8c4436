//! Error types for WHIP publishing.

use thiserror::Error;

/// Error type for WHIP publisher operations.
#[derive(Error, Debug)]
pub enum WhipError {
    /// Invalid SDP offer or answer.
    #[error("Invalid SDP: {0}")]
    InvalidSdp(String),

    /// WHIP signaling (HTTP) failure.
    #[error("Signaling error: {0}")]
    Signaling(String),

    /// STUN message construction or parsing failure.
    #[error("STUN error: {0}")]
    Stun(String),

    /// DTLS handshake or transport failure.
    #[error("DTLS error: {0}")]
    Dtls(String),

    /// SRTP keying or encryption failure.
    #[error("SRTP error: {0}")]
    Srtp(String),

    /// Unsupported codec or stream configuration.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Malformed input data (extradata, packets).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// ICE/DTLS handshake exceeded the configured timeout.
    #[error("Handshake timeout after {0} ms")]
    Timeout(u64),

    /// The peer closed the DTLS session; the publisher cannot continue.
    #[error("Peer disconnected: {0}")]
    Disconnected(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WhipError {
    /// Whether the error is fatal for the session.
    ///
    /// Everything except an EAGAIN-style IO error transitions the session to
    /// the failed state.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            WhipError::Io(e) => e.kind() != std::io::ErrorKind::WouldBlock,
            _ => true,
        }
    }

    /// Whether the error is the handshake timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, WhipError::Timeout(_))
    }
}

impl From<openssl::error::ErrorStack> for WhipError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        WhipError::Dtls(e.to_string())
    }
}

/// Result type for WHIP publisher operations.
pub type Result<T> = std::result::Result<T, WhipError>;
