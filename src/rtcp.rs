//! RTCP classification and payload-specific feedback parsing.
//!
//! The publisher only consumes feedback: a decrypted compound RTCP packet is
//! walked and payload-specific feedback messages (PT 206) are surfaced so a
//! PLI or FIR can trigger a keyframe request. Everything else is reported for
//! logging and dropped.

/// RTCP packet types occupy [192, 223] in the second byte of the packet.
pub const RTCP_PT_START: u8 = 192;
pub const RTCP_PT_END: u8 = 223;

/// RTCP payload-specific feedback (RFC 4585).
pub const RTCP_PT_PSFB: u8 = 206;

/// A datagram is RTP or RTCP when the version bits say 2.
pub fn is_rtp_or_rtcp(buf: &[u8]) -> bool {
    buf.len() >= 12 && buf[0] & 0xC0 == 0x80
}

/// Whether the packet is RTCP rather than RTP.
pub fn is_rtcp(buf: &[u8]) -> bool {
    buf.len() >= 12 && (RTCP_PT_START..=RTCP_PT_END).contains(&buf[1])
}

/// Payload-specific feedback message types (RFC 4585 section 6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFeedback {
    /// Picture Loss Indication; the sender should produce a keyframe.
    Pli,
    /// Slice Loss Indication.
    Sli,
    /// Reference Picture Selection Indication.
    Rpsi,
    /// Full Intra Request (codec control, RFC 5104).
    Fir,
    /// Application layer feedback (REMB and friends).
    Afb,
    /// Unassigned FMT value.
    Other(u8),
}

impl PayloadFeedback {
    fn from_fmt(fmt: u8) -> Self {
        match fmt {
            1 => PayloadFeedback::Pli,
            2 => PayloadFeedback::Sli,
            3 => PayloadFeedback::Rpsi,
            4 => PayloadFeedback::Fir,
            15 => PayloadFeedback::Afb,
            other => PayloadFeedback::Other(other),
        }
    }

    /// Whether this feedback asks for a fresh keyframe.
    pub fn wants_keyframe(&self) -> bool {
        matches!(self, PayloadFeedback::Pli | PayloadFeedback::Fir)
    }
}

/// Walk a decrypted compound RTCP packet and collect payload-specific
/// feedback messages. Truncated chunks end the walk.
pub fn parse_feedback(mut buf: &[u8]) -> Vec<PayloadFeedback> {
    let mut feedback = Vec::new();

    while buf.len() >= 4 {
        if buf[0] & 0xC0 != 0x80 {
            break;
        }
        let fmt = buf[0] & 0x1F;
        let pt = buf[1];
        let length = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        let chunk_len = (length + 1) * 4;
        if chunk_len > buf.len() {
            break;
        }

        if pt == RTCP_PT_PSFB {
            feedback.push(PayloadFeedback::from_fmt(fmt));
        } else {
            tracing::debug!(pt, fmt, "ignoring RTCP packet type");
        }
        buf = &buf[chunk_len..];
    }

    feedback
}
