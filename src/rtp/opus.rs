//! Opus RTP payloadization (RFC 7587).
//!
//! One Opus access unit per RTP packet. By default the timestamp ignores the
//! input pts and advances a private 48 kHz counter by 960 ticks (20 ms) per
//! packet; see the `audio_fixed_timestep` configuration option.

use super::RtpStream;
use rand::Rng;

/// Timestamp ticks per Opus packet at 48 kHz (20 ms frames).
pub const OPUS_SAMPLES_PER_PACKET: u32 = 960;

/// Opus packetizer for one audio stream.
#[derive(Debug)]
pub struct OpusPacketizer {
    stream: RtpStream,
    /// Monotonic 48 kHz counter used when the fixed timestep is active.
    jitter_base: u32,
    fixed_timestep: bool,
}

impl OpusPacketizer {
    pub fn new<R: Rng>(
        rng: &mut R,
        payload_type: u8,
        ssrc: u32,
        fixed_timestep: bool,
    ) -> Self {
        Self {
            stream: RtpStream::new(rng, payload_type, ssrc),
            jitter_base: 0,
            fixed_timestep,
        }
    }

    /// Packetize one Opus frame. `pts48k` is the input pts rescaled to the
    /// 48 kHz clock; it is ignored while the fixed timestep is active.
    pub fn packetize(&mut self, frame: &[u8], pts48k: i64) -> Vec<u8> {
        let timestamp = if self.fixed_timestep {
            let ts = self.jitter_base;
            self.jitter_base = self.jitter_base.wrapping_add(OPUS_SAMPLES_PER_PACKET);
            ts
        } else {
            pts48k as u32
        };

        let mut pkt = self.stream.begin_packet(false, timestamp, frame.len());
        pkt.extend_from_slice(frame);
        pkt
    }
}
