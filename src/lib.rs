//! WHIP (WebRTC-HTTP Ingestion Protocol) publisher.
//!
//! This crate implements the publishing side of WHIP for live streaming:
//! given encoded H.264 and Opus frames and an HTTPS endpoint, it negotiates
//! a one-way WebRTC session and delivers the media as SRTP over UDP.
//!
//! # Features
//!
//! - **SDP Negotiation**: offer synthesis and answer parsing
//! - **ICE-Lite**: single UDP host candidate with STUN binding checks
//! - **DTLS-SRTP**: passive-role handshake with keying-material export
//! - **RTP Packetization**: H.264 (STAP-A/FU-A) and Opus payloads
//! - **Feedback**: PLI/FIR handling to request encoder keyframes
//!
//! # Example
//!
//! ```no_run
//! use whip_publisher::{AudioParams, MediaPacket, TimeBase, VideoParams, WhipConfig, WhipSession};
//!
//! fn main() -> whip_publisher::Result<()> {
//!     let config = WhipConfig::new("https://example.com/whip/room")
//!         .with_bearer_token("secret");
//!     let video = VideoParams {
//!         profile: None,
//!         level: None,
//!         extradata: load_extradata(),
//!         video_delay: 0,
//!     };
//!     let audio = AudioParams::default();
//!
//!     let mut session = WhipSession::connect(config, Some(&video), Some(&audio))?;
//!     session.set_keyframe_request_callback(|| request_idr());
//!
//!     let (frame, pts) = next_video_frame();
//!     session.write(&MediaPacket::video(&frame, pts, TimeBase::VIDEO_90KHZ, true))?;
//!     session.close();
//!     Ok(())
//! }
//! # fn load_extradata() -> Vec<u8> { Vec::new() }
//! # fn request_idr() {}
//! # fn next_video_frame() -> (Vec<u8>, i64) { (Vec::new(), 0) }
//! ```
//!
//! # Protocol Overview
//!
//! 1. Generate a self-signed certificate and an SDP offer (`setup:passive`)
//! 2. POST the offer to the WHIP endpoint, parse the answer
//! 3. Connect UDP to the answer's first host candidate
//! 4. Send a STUN binding request; answer the peer's ICE-Lite checks
//! 5. Accept the peer's DTLS handshake, export SRTP keying material
//! 6. Packetize, encrypt and send RTP; react to RTCP feedback
//! 7. DELETE the session resource on teardown
//!
//! # Scheduling
//!
//! A session is single-threaded and cooperative: the caller that created it
//! drives every step through [`WhipSession::connect`] and
//! [`WhipSession::write`]. There are no background threads; inbound traffic
//! is polled once per write.

pub mod avc;
pub mod codec;
pub mod config;
pub mod dtls;
pub mod error;
pub mod packet;
pub mod rtcp;
pub mod rtp;
pub mod sdp;
pub mod session;
pub mod signal;
pub mod srtp;
pub mod stun;
pub mod udp;

pub use codec::{AudioParams, VideoParams};
pub use config::WhipConfig;
pub use error::{Result, WhipError};
pub use packet::{MediaKind, MediaPacket, PacketFlags, TimeBase};
pub use session::{SessionState, WhipSession};
