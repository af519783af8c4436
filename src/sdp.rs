//! SDP offer generation and answer parsing.
//!
//! The offer is a tight template: one BUNDLE group, `sendonly` audio and
//! video m-lines with ICE credentials, the DTLS certificate fingerprint and
//! `setup:passive`. The answer scan extracts the remote ICE credentials and
//! the first UDP host candidate; everything else in the answer is ignored.

use crate::codec::{AudioStream, VideoStream, H264_PROFILE_CONSTRAINED};
use crate::error::{Result, WhipError};
use rand::Rng;
use std::fmt::Write;

/// Fixed session id in the offer origin line; unused with ICE-Lite.
const SDP_SESSION_ID: &str = "4489045141692799359";

/// Fixed creator IP in the offer origin line; unused with ICE-Lite.
const SDP_CREATOR_IP: &str = "127.0.0.1";

/// RTP payload type for Opus, following Chrome's conventions.
pub const RTP_PAYLOAD_TYPE_OPUS: u8 = 111;

/// RTP payload type for H.264, following Chrome's conventions.
pub const RTP_PAYLOAD_TYPE_H264: u8 = 106;

/// ICE credentials and RTP identifiers generated for one session.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    /// Local ICE username fragment, 8 random hex chars.
    pub ice_ufrag: String,
    /// Local ICE password, 32 random hex chars.
    pub ice_pwd: String,
    pub audio_ssrc: u32,
    pub video_ssrc: u32,
    pub audio_payload_type: u8,
    pub video_payload_type: u8,
}

impl LocalIdentity {
    /// Generate fresh credentials and SSRCs.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            ice_ufrag: format!("{:08x}", rng.gen::<u32>()),
            ice_pwd: format!(
                "{:08x}{:08x}{:08x}{:08x}",
                rng.gen::<u32>(),
                rng.gen::<u32>(),
                rng.gen::<u32>(),
                rng.gen::<u32>()
            ),
            audio_ssrc: rng.gen::<u32>(),
            video_ssrc: rng.gen::<u32>(),
            audio_payload_type: RTP_PAYLOAD_TYPE_OPUS,
            video_payload_type: RTP_PAYLOAD_TYPE_H264,
        }
    }
}

/// Remote session parameters extracted from the SDP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescription {
    pub ice_ufrag: String,
    pub ice_pwd: String,
    /// Transport protocol of the selected candidate; always `udp`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

/// Generate the SDP offer from the local identity, certificate fingerprint
/// and negotiated codec parameters.
pub fn build_offer(
    identity: &LocalIdentity,
    fingerprint: &str,
    audio: Option<&AudioStream>,
    video: Option<&VideoStream>,
) -> String {
    let mut sdp = String::with_capacity(2048);

    write!(
        sdp,
        "v=0\r\n\
         o=FFmpeg {SDP_SESSION_ID} 2 IN IP4 {SDP_CREATOR_IP}\r\n\
         s=FFmpegPublishSession\r\n\
         t=0 0\r\n\
         a=group:BUNDLE 0 1\r\n\
         a=extmap-allow-mixed\r\n\
         a=msid-semantic: WMS\r\n"
    )
    .expect("writing to String cannot fail");

    if let Some(audio) = audio {
        write!(
            sdp,
            "m=audio 9 UDP/TLS/RTP/SAVPF {pt}\r\n\
             c=IN IP4 0.0.0.0\r\n\
             a=ice-ufrag:{ufrag}\r\n\
             a=ice-pwd:{pwd}\r\n\
             a=fingerprint:sha-256 {fingerprint}\r\n\
             a=setup:passive\r\n\
             a=mid:0\r\n\
             a=sendonly\r\n\
             a=msid:FFmpeg audio\r\n\
             a=rtcp-mux\r\n\
             a=rtpmap:{pt} opus/{rate}/{channels}\r\n\
             a=ssrc:{ssrc} cname:FFmpeg\r\n\
             a=ssrc:{ssrc} msid:FFmpeg audio\r\n",
            pt = identity.audio_payload_type,
            ufrag = identity.ice_ufrag,
            pwd = identity.ice_pwd,
            rate = audio.sample_rate,
            channels = audio.channels,
            ssrc = identity.audio_ssrc,
        )
        .expect("writing to String cannot fail");
    }

    if let Some(video) = video {
        let profile = video.profile & !H264_PROFILE_CONSTRAINED;
        let profile_iop = video.profile & H264_PROFILE_CONSTRAINED;
        write!(
            sdp,
            "m=video 9 UDP/TLS/RTP/SAVPF {pt}\r\n\
             c=IN IP4 0.0.0.0\r\n\
             a=ice-ufrag:{ufrag}\r\n\
             a=ice-pwd:{pwd}\r\n\
             a=fingerprint:sha-256 {fingerprint}\r\n\
             a=setup:passive\r\n\
             a=mid:1\r\n\
             a=sendonly\r\n\
             a=msid:FFmpeg video\r\n\
             a=rtcp-mux\r\n\
             a=rtcp-rsize\r\n\
             a=rtpmap:{pt} H264/90000\r\n\
             a=fmtp:{pt} level-asymmetry-allowed=1;packetization-mode=1;\
             profile-level-id={profile:02x}{profile_iop:02x}{level:02x}\r\n\
             a=ssrc:{ssrc} cname:FFmpeg\r\n\
             a=ssrc:{ssrc} msid:FFmpeg video\r\n",
            pt = identity.video_payload_type,
            ufrag = identity.ice_ufrag,
            pwd = identity.ice_pwd,
            level = video.level,
            ssrc = identity.video_ssrc,
        )
        .expect("writing to String cannot fail");
    }

    sdp
}

/// Parse the SDP answer: the first `ice-ufrag`, `ice-pwd`, and the first
/// `candidate` line advertising a UDP host candidate.
pub fn parse_answer(answer: &str) -> Result<RemoteDescription> {
    let mut ufrag: Option<String> = None;
    let mut pwd: Option<String> = None;
    let mut candidate: Option<(String, String, u16)> = None;

    for line in answer.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(value) = line.strip_prefix("a=ice-ufrag:") {
            if ufrag.is_none() {
                ufrag = Some(value.to_string());
            }
        } else if let Some(value) = line.strip_prefix("a=ice-pwd:") {
            if pwd.is_none() {
                pwd = Some(value.to_string());
            }
        } else if let Some(value) = line.strip_prefix("a=candidate:") {
            if candidate.is_none() {
                candidate = parse_candidate(value, answer)?;
            }
        }
    }

    let ice_pwd = pwd.filter(|p| !p.is_empty()).ok_or_else(|| {
        WhipError::InvalidSdp(format!("no remote ice pwd parsed from {answer}"))
    })?;
    let ice_ufrag = ufrag.filter(|u| !u.is_empty()).ok_or_else(|| {
        WhipError::InvalidSdp(format!("no remote ice ufrag parsed from {answer}"))
    })?;
    let (protocol, host, port) = candidate.ok_or_else(|| {
        WhipError::InvalidSdp(format!("no ice candidate parsed from {answer}"))
    })?;

    Ok(RemoteDescription {
        ice_ufrag,
        ice_pwd,
        protocol,
        host,
        port,
    })
}

/// Extract `(protocol, host, port)` from one candidate line, starting at the
/// case-insensitive `udp` token and requiring `typ host` after it. Candidate
/// lines without a UDP host pair are skipped (`Ok(None)`); a UDP candidate
/// with a non-UDP leading protocol token is an error.
fn parse_candidate(value: &str, answer: &str) -> Result<Option<(String, String, u16)>> {
    let lower = value.to_ascii_lowercase();
    let Some(udp_at) = lower.find("udp") else {
        return Ok(None);
    };
    if !lower[udp_at..].contains("host") {
        return Ok(None);
    }

    let mut fields = value[udp_at..].split_whitespace();
    let (Some(protocol), Some(priority), Some(host), Some(port)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(WhipError::InvalidSdp(format!(
            "failed to parse candidate line {value} from {answer}"
        )));
    };

    if !protocol.eq_ignore_ascii_case("udp") {
        return Err(WhipError::InvalidSdp(format!(
            "protocol {protocol} is not supported, choose udp"
        )));
    }
    let _priority: u32 = priority
        .parse()
        .map_err(|_| WhipError::InvalidSdp(format!("invalid candidate priority {priority}")))?;
    let port: u16 = port
        .parse()
        .map_err(|_| WhipError::InvalidSdp(format!("invalid candidate port {port}")))?;

    Ok(Some((protocol.to_string(), host.to_string(), port)))
}
