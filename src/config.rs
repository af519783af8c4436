//! Publisher configuration.

use serde::{Deserialize, Serialize};

/// Default timeout in milliseconds for the combined ICE + DTLS handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 5000;

/// Default maximum size in bytes of RTP packets sent out.
///
/// Also used as the DTLS MTU. Some servers (pion) require a value no larger
/// than 1200.
pub const DEFAULT_PKT_SIZE: usize = 1200;

/// Packets smaller than this are likely to hurt throughput; a warning is
/// logged when `pkt_size` is configured below it.
pub const IDEAL_PKT_SIZE: usize = 532;

/// Configuration for a WHIP publishing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhipConfig {
    /// The WHIP endpoint URL (`https://...`). The SDP offer is POSTed here.
    pub endpoint: String,
    /// Timeout in milliseconds for the ICE and DTLS handshake.
    pub handshake_timeout_ms: u64,
    /// The maximum size, in bytes, of RTP packets that are sent out.
    pub pkt_size: usize,
    /// Optional Bearer token for WHIP authorization, sent on POST and DELETE.
    pub authorization: Option<String>,
    /// Override Opus timestamps with a fixed 960-tick step per packet.
    ///
    /// Encoder timestamps for Opus have been observed to deviate from the
    /// expected 20 ms step when the input went through an MP4 round trip,
    /// which makes Chrome play the stream with noise. When enabled (the
    /// default) the publisher ignores input pts and advances its own 48 kHz
    /// counter by 960 per packet. Disable to trust the input timestamps.
    pub audio_fixed_timestep: bool,
}

impl WhipConfig {
    /// Create a configuration for the given WHIP endpoint with defaults.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            pkt_size: DEFAULT_PKT_SIZE,
            authorization: None,
            audio_fixed_timestep: true,
        }
    }

    /// Set the handshake timeout in milliseconds.
    pub fn with_handshake_timeout_ms(mut self, ms: u64) -> Self {
        self.handshake_timeout_ms = ms;
        self
    }

    /// Set the maximum RTP packet size (and DTLS MTU).
    pub fn with_pkt_size(mut self, size: usize) -> Self {
        self.pkt_size = size;
        self
    }

    /// Set the Bearer token used for the `Authorization` header.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.authorization = Some(token.into());
        self
    }

    /// Control the Opus fixed-timestep override.
    pub fn with_audio_fixed_timestep(mut self, enabled: bool) -> Self {
        self.audio_fixed_timestep = enabled;
        self
    }

    /// The RTP payload budget: `pkt_size` minus the SRTP auth tag and
    /// padding reserve.
    pub fn max_rtp_size(&self) -> usize {
        self.pkt_size.saturating_sub(crate::srtp::SRTP_CHECKSUM_RESERVE)
    }
}
