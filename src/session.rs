//! The WHIP publishing session.
//!
//! Owns the whole connection bring-up — codec validation, SDP offer/answer,
//! UDP transport, ICE-Lite binding, DTLS handshake, SRTP keying — and the
//! steady-state per-packet path: packetize, fix up, encrypt, send, while
//! answering binding requests and reacting to RTCP feedback from the peer.

use crate::codec::{self, AudioParams, AudioStream, VideoParams, VideoStream};
use crate::config::{WhipConfig, IDEAL_PKT_SIZE};
use crate::dtls::{self, DtlsCertificate, DtlsSession, DtlsState};
use crate::error::{Result, WhipError};
use crate::packet::{MediaKind, MediaPacket, TimeBase};
use crate::rtcp;
use crate::rtp::{H264Packetizer, OpusPacketizer};
use crate::sdp::{self, LocalIdentity, RemoteDescription};
use crate::signal::WhipSignaler;
use crate::srtp::{SrtpContext, SRTP_SUITE};
use crate::stun;
use crate::udp::{UdpTransport, MAX_UDP_BUFFER_SIZE};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sleep between EAGAIN polls in the handshake loop.
const HANDSHAKE_POLL_SLEEP: Duration = Duration::from_millis(5);

/// Reads attempted per handshake pass; with the 5 ms sleeps this gives a
/// 50 ms poll window.
const HANDSHAKE_READS_PER_PASS: usize = 10;

/// Connection state of the publishing session. States only move forward,
/// except the transition to `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// The initial state.
    Init,
    /// The SDP offer has been generated.
    Offer,
    /// The SDP answer has been received.
    Answer,
    /// The answer has been parsed; the remote transport is pinned.
    Negotiated,
    /// The UDP socket is connected to the remote candidate.
    UdpConnected,
    /// The ICE binding request has been sent.
    IceConnecting,
    /// The ICE binding response has been received.
    IceConnected,
    /// The DTLS handshake is complete.
    DtlsFinished,
    /// The SRTP contexts are keyed.
    SrtpFinished,
    /// Media can be sent.
    Ready,
    /// The session is failed.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Init => "init",
            SessionState::Offer => "offer",
            SessionState::Answer => "answer",
            SessionState::Negotiated => "negotiated",
            SessionState::UdpConnected => "udp-connected",
            SessionState::IceConnecting => "ice-connecting",
            SessionState::IceConnected => "ice-connected",
            SessionState::DtlsFinished => "dtls-finished",
            SessionState::SrtpFinished => "srtp-finished",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Wall-clock marks for the connection phases, logged at READY.
#[derive(Debug, Default, Clone, Copy)]
struct PhaseTimes {
    init: Option<Instant>,
    offer: Option<Instant>,
    answer: Option<Instant>,
    udp: Option<Instant>,
    ice: Option<Instant>,
    dtls: Option<Instant>,
    srtp: Option<Instant>,
}

/// A WHIP publishing session.
///
/// Created by [`WhipSession::connect`], which returns only once the session
/// is ready to send media. Single-threaded: one owner drives `write` and the
/// session performs all socket polling inside it.
pub struct WhipSession {
    config: WhipConfig,
    state: SessionState,
    identity: LocalIdentity,
    video: Option<VideoStream>,
    audio: Option<AudioStream>,

    signaler: WhipSignaler,
    resource_url: Option<String>,
    remote: Option<RemoteDescription>,

    udp: Option<Arc<UdpTransport>>,
    dtls: Option<DtlsSession>,
    dtls_closed: bool,

    srtp_audio_send: Option<SrtpContext>,
    srtp_video_send: Option<SrtpContext>,
    srtp_rtcp_send: Option<SrtpContext>,
    srtp_recv: Option<SrtpContext>,

    video_packetizer: Option<H264Packetizer>,
    audio_packetizer: Option<OpusPacketizer>,

    on_keyframe_request: Option<Box<dyn FnMut() + Send>>,

    certificate: DtlsCertificate,
    rng: StdRng,
    cipher_buf: Vec<u8>,
    started_at: Instant,
    phases: PhaseTimes,
}

impl WhipSession {
    /// Connect to the WHIP endpoint and bring the session up to READY.
    ///
    /// At least one of `video` and `audio` must be present. Returns once
    /// media can be written, or with the error that failed the session.
    pub fn connect(
        config: WhipConfig,
        video: Option<&VideoParams>,
        audio: Option<&AudioParams>,
    ) -> Result<Self> {
        let mut session = Self::init(config, video, audio)?;
        match session.run_connect() {
            Ok(()) => Ok(session),
            Err(e) => {
                session.set_failed();
                Err(e)
            }
        }
    }

    /// Validate inputs and build the initial session state.
    fn init(
        config: WhipConfig,
        video: Option<&VideoParams>,
        audio: Option<&AudioParams>,
    ) -> Result<Self> {
        let started_at = Instant::now();

        if video.is_none() && audio.is_none() {
            return Err(WhipError::Unsupported(
                "at least one stream is required".into(),
            ));
        }
        if config.pkt_size < IDEAL_PKT_SIZE {
            tracing::warn!(
                pkt_size = config.pkt_size,
                "pkt_size below {IDEAL_PKT_SIZE} may cause packet loss"
            );
        }

        let video = video.map(codec::parse_video).transpose()?;
        let audio = audio.map(codec::parse_audio).transpose()?;

        let signaler = WhipSignaler::new(&config.endpoint, config.authorization.clone())?;
        let certificate = DtlsCertificate::generate()?;
        let mut rng = StdRng::from_entropy();
        let identity = LocalIdentity::generate(&mut rng);

        let mut phases = PhaseTimes::default();
        phases.init = Some(Instant::now());
        tracing::debug!(
            state = %SessionState::Init,
            handshake_timeout = config.handshake_timeout_ms,
            pkt_size = config.pkt_size,
            "session initialized"
        );

        Ok(Self {
            config,
            state: SessionState::Init,
            identity,
            video,
            audio,
            signaler,
            resource_url: None,
            remote: None,
            udp: None,
            dtls: None,
            dtls_closed: false,
            srtp_audio_send: None,
            srtp_video_send: None,
            srtp_rtcp_send: None,
            srtp_recv: None,
            video_packetizer: None,
            audio_packetizer: None,
            on_keyframe_request: None,
            certificate,
            rng,
            cipher_buf: Vec::with_capacity(MAX_UDP_BUFFER_SIZE),
            started_at,
            phases,
        })
    }

    fn run_connect(&mut self) -> Result<()> {
        let offer = self.generate_offer();
        self.exchange_sdp(&offer)?;
        self.udp_connect()?;
        self.ice_dtls_handshake()?;
        self.setup_srtp()?;
        self.create_packetizers();

        let elapsed = self.started_at.elapsed().as_millis();
        let p = &self.phases;
        tracing::info!(
            state = %self.state,
            elapsed_ms = elapsed as u64,
            offer_ms = phase_ms(p.init, p.offer),
            answer_ms = phase_ms(p.offer, p.answer),
            udp_ms = phase_ms(p.answer, p.udp),
            ice_ms = phase_ms(p.udp, p.ice),
            dtls_ms = phase_ms(p.ice, p.dtls),
            srtp_ms = phase_ms(p.dtls, p.srtp),
            "session ready"
        );
        Ok(())
    }

    /// Build the SDP offer from local identity and codec parameters.
    fn generate_offer(&mut self) -> String {
        let offer = sdp::build_offer(
            &self.identity,
            self.certificate.fingerprint(),
            self.audio.as_ref(),
            self.video.as_ref(),
        );
        self.advance(SessionState::Offer);
        self.phases.offer = Some(Instant::now());
        tracing::debug!(state = %self.state, offer_len = offer.len(), "generated offer");
        offer
    }

    /// POST the offer, parse the answer, pin the remote transport.
    fn exchange_sdp(&mut self, offer: &str) -> Result<()> {
        let answer = self.signaler.exchange_sdp(offer)?;
        self.resource_url = answer.resource_url.clone();
        self.advance(SessionState::Answer);
        self.phases.answer = Some(Instant::now());

        let remote = sdp::parse_answer(&answer.sdp)?;
        tracing::info!(
            state = %self.state,
            ufrag = %remote.ice_ufrag,
            transport = format!("{}://{}:{}", remote.protocol, remote.host, remote.port),
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "answer negotiated"
        );
        self.remote = Some(remote);
        self.advance(SessionState::Negotiated);
        Ok(())
    }

    /// Open the UDP transport towards the selected candidate and create the
    /// DTLS session writing into it.
    fn udp_connect(&mut self) -> Result<()> {
        let remote = self.remote.as_ref().expect("negotiated before udp");
        let remote_host = remote.host.clone();
        let remote_port = remote.port;
        let udp = Arc::new(UdpTransport::connect(&remote_host, remote_port)?);

        let dtls_udp = udp.clone();
        let dtls = DtlsSession::new(
            &self.certificate,
            self.config.pkt_size,
            Box::new(move |record| {
                dtls_udp
                    .send(record)
                    .map_err(|e| std::io::Error::other(e.to_string()))
            }),
        )?;

        self.udp = Some(udp);
        self.dtls = Some(dtls);
        self.advance(SessionState::UdpConnected);
        self.phases.udp = Some(Instant::now());
        tracing::debug!(
            state = %self.state,
            remote = format!("udp://{}:{}", remote_host, remote_port),
            "UDP connected"
        );
        Ok(())
    }

    /// Drive ICE binding and the DTLS handshake until finished or timeout.
    fn ice_dtls_handshake(&mut self) -> Result<()> {
        if self.state < SessionState::UdpConnected {
            return Err(WhipError::Stun(format!(
                "UDP not connected, state={}",
                self.state
            )));
        }
        let deadline = Instant::now() + Duration::from_millis(self.config.handshake_timeout_ms);
        let mut buf = vec![0u8; MAX_UDP_BUFFER_SIZE];

        'handshake: loop {
            if self.state <= SessionState::IceConnecting {
                let remote = self.remote.as_ref().expect("negotiated");
                let username = format!("{}:{}", remote.ice_ufrag, self.identity.ice_ufrag);
                let request =
                    stun::create_binding_request(&mut self.rng, &username, &remote.ice_pwd);
                self.udp_ref().send(&request)?;
                self.advance(SessionState::IceConnecting);
            }

            loop {
                if self.state >= SessionState::DtlsFinished {
                    break 'handshake;
                }
                if Instant::now() >= deadline {
                    tracing::error!(
                        state = %self.state,
                        timeout_ms = self.config.handshake_timeout_ms,
                        "ICE/DTLS handshake timeout"
                    );
                    return Err(WhipError::Timeout(self.config.handshake_timeout_ms));
                }

                let mut received = None;
                for _ in 0..HANDSHAKE_READS_PER_PASS {
                    match self.udp_ref().recv(&mut buf)? {
                        Some(n) => {
                            received = Some(n);
                            break;
                        }
                        None => std::thread::sleep(HANDSHAKE_POLL_SLEEP),
                    }
                }
                let Some(n) = received else {
                    // Nothing in this poll window; resend from the top.
                    continue 'handshake;
                };

                self.handle_handshake_datagram(&buf[..n])?;
            }
        }
        Ok(())
    }

    fn handle_handshake_datagram(&mut self, datagram: &[u8]) -> Result<()> {
        if stun::is_binding_success(datagram) {
            if self.state < SessionState::IceConnected {
                self.advance(SessionState::IceConnected);
                self.phases.ice = Some(Instant::now());
                let remote = self.remote.as_ref().expect("negotiated");
                tracing::info!(
                    state = %self.state,
                    username = format!("{}:{}", remote.ice_ufrag, self.identity.ice_ufrag),
                    elapsed_ms = self.started_at.elapsed().as_millis() as u64,
                    "ICE connected"
                );
                // First binding response: start the DTLS accept path.
                self.dtls_mut().start()?;
                self.sync_dtls_state();
            }
            return Ok(());
        }

        if stun::is_binding_request(datagram) {
            return self.answer_binding_request(datagram);
        }

        if dtls::is_dtls_record(datagram) && self.state >= SessionState::IceConnected {
            self.dtls_mut().feed(datagram)?;
            self.sync_dtls_state();
        }
        Ok(())
    }

    /// Respond to the peer's binding request with a success response keyed
    /// with the local password. Requests failing the integrity check are
    /// dropped.
    fn answer_binding_request(&mut self, datagram: &[u8]) -> Result<()> {
        if !stun::verify_integrity(datagram, &self.identity.ice_pwd) {
            tracing::debug!("dropping binding request with bad integrity");
            return Ok(());
        }
        let Some(tid) = stun::transaction_id(datagram) else {
            return Ok(());
        };
        let response = stun::create_binding_response(&tid, &self.identity.ice_pwd);
        self.udp_ref().send(&response)
    }

    fn sync_dtls_state(&mut self) {
        match self.dtls_ref().state() {
            DtlsState::Finished if self.state < SessionState::DtlsFinished => {
                self.advance(SessionState::DtlsFinished);
                self.phases.dtls = Some(Instant::now());
                tracing::info!(
                    state = %self.state,
                    elapsed_ms = self.started_at.elapsed().as_millis() as u64,
                    "DTLS finished"
                );
            }
            DtlsState::Closed => {
                self.dtls_closed = true;
            }
            _ => {}
        }
    }

    /// Key the four SRTP contexts from the exported DTLS material.
    ///
    /// Audio, video and RTCP sends share the send key but keep separate
    /// rollover state; a single context decrypts inbound RTCP.
    fn setup_srtp(&mut self) -> Result<()> {
        let material = self
            .dtls_ref()
            .srtp_material()
            .ok_or_else(|| WhipError::Dtls("no keying material exported".into()))?;
        let (send_key, recv_key) = dtls::split_keying_material(material);
        self.install_srtp_keys(&send_key, &recv_key)?;

        self.advance(SessionState::SrtpFinished);
        self.phases.srtp = Some(Instant::now());
        tracing::debug!(
            state = %self.state,
            suite = SRTP_SUITE,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "SRTP contexts keyed"
        );
        Ok(())
    }

    fn install_srtp_keys(&mut self, send_key: &[u8; 30], recv_key: &[u8; 30]) -> Result<()> {
        let send_b64 = BASE64.encode(send_key);
        let recv_b64 = BASE64.encode(recv_key);
        self.srtp_audio_send = Some(SrtpContext::new(SRTP_SUITE, &send_b64)?);
        self.srtp_video_send = Some(SrtpContext::new(SRTP_SUITE, &send_b64)?);
        self.srtp_rtcp_send = Some(SrtpContext::new(SRTP_SUITE, &send_b64)?);
        self.srtp_recv = Some(SrtpContext::new(SRTP_SUITE, &recv_b64)?);
        Ok(())
    }

    fn create_packetizers(&mut self) {
        let max_rtp_size = self.config.max_rtp_size();
        if let Some(video) = &self.video {
            self.video_packetizer = Some(H264Packetizer::new(
                &mut self.rng,
                self.identity.video_payload_type,
                self.identity.video_ssrc,
                max_rtp_size,
                video.avc.nal_length_size,
            ));
        }
        if self.audio.is_some() {
            self.audio_packetizer = Some(OpusPacketizer::new(
                &mut self.rng,
                self.identity.audio_payload_type,
                self.identity.audio_ssrc,
                self.config.audio_fixed_timestep,
            ));
        }
        self.advance(SessionState::Ready);
    }

    /// Install the callback invoked when the peer requests a keyframe (PLI
    /// or FIR feedback).
    pub fn set_keyframe_request_callback(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_keyframe_request = Some(Box::new(callback));
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Local ICE/RTP identity, pinned for the session's lifetime.
    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// Send one encoded packet.
    ///
    /// Polls the socket once for inbound STUN/DTLS/RTCP first, injects the
    /// SPS/PPS unit before video keyframes, then packetizes, encrypts and
    /// writes each RTP packet.
    pub fn write(&mut self, packet: &MediaPacket<'_>) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(WhipError::Disconnected(format!(
                "cannot write in state {}",
                self.state
            )));
        }

        match self.write_inner(packet) {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_fatal() {
                    self.set_failed();
                }
                Err(e)
            }
        }
    }

    fn write_inner(&mut self, packet: &MediaPacket<'_>) -> Result<()> {
        self.poll_socket()?;
        if self.dtls_closed {
            return Err(WhipError::Disconnected("DTLS session closed by peer".into()));
        }
        if packet.flags.contains(crate::packet::PacketFlags::CORRUPT) {
            return Ok(());
        }

        match packet.kind {
            MediaKind::Video => self.write_video(packet),
            MediaKind::Audio => self.write_audio(packet),
        }
    }

    fn write_video(&mut self, packet: &MediaPacket<'_>) -> Result<()> {
        if self.video_packetizer.is_none() {
            return Err(WhipError::Unsupported("no video stream negotiated".into()));
        }
        let timestamp = packet.time_base.convert(packet.pts, TimeBase::VIDEO_90KHZ) as u32;

        // The parameter sets travel ahead of every IDR, with its timestamp.
        if packet.is_keyframe() {
            let unit = self
                .video
                .as_ref()
                .expect("video stream present")
                .avc
                .parameter_set_unit();
            let packets = self
                .video_packetizer
                .as_mut()
                .expect("packetizer present")
                .packetize(&unit, timestamp);
            self.send_packets(packets)?;
        }

        let packets = self
            .video_packetizer
            .as_mut()
            .expect("packetizer present")
            .packetize(packet.data, timestamp);
        self.send_packets(packets)
    }

    fn write_audio(&mut self, packet: &MediaPacket<'_>) -> Result<()> {
        let Some(packetizer) = self.audio_packetizer.as_mut() else {
            return Err(WhipError::Unsupported("no audio stream negotiated".into()));
        };
        let pts48k = packet.time_base.convert(packet.pts, TimeBase::AUDIO_48KHZ);
        let rtp = packetizer.packetize(packet.data, pts48k);
        self.send_packets(vec![rtp])
    }

    fn send_packets(&mut self, packets: Vec<Vec<u8>>) -> Result<()> {
        for mut packet in packets {
            self.send_rtp(&mut packet)?;
        }
        Ok(())
    }

    /// The post-packetizer hook: validate, fix up STAP-A, pick the SRTP
    /// context, encrypt and send.
    fn send_rtp(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        // Not RTP version 2: drop silently.
        if !rtcp::is_rtp_or_rtcp(buf) {
            return Ok(());
        }

        let is_rtcp = rtcp::is_rtcp(buf);
        let payload_type = buf[1] & 0x7F;
        let is_video = payload_type == self.identity.video_payload_type;
        if !is_rtcp
            && !is_video
            && payload_type != self.identity.audio_payload_type
        {
            return Ok(());
        }

        // A STAP-A aggregate never carries the marker, and its NRI must match
        // the first inner NAL's.
        if is_video && buf.len() > 12 && buf[12] & 0x1F == 24 {
            buf[1] &= 0x7F;
            if buf.len() > 15 && (buf[15] & 0x60) != (buf[12] & 0x60) {
                buf[12] = (buf[12] & 0x80) | (buf[15] & 0x60) | (buf[12] & 0x1F);
            }
        }

        let mut cipher = std::mem::take(&mut self.cipher_buf);
        let encrypted = {
            let ctx = if is_rtcp {
                self.srtp_rtcp_send.as_mut()
            } else if is_video {
                self.srtp_video_send.as_mut()
            } else {
                self.srtp_audio_send.as_mut()
            };
            let Some(ctx) = ctx else {
                self.cipher_buf = cipher;
                return Err(WhipError::Srtp("SRTP context not keyed".into()));
            };
            if is_rtcp {
                ctx.encrypt_rtcp(buf, &mut cipher)
            } else {
                ctx.encrypt_rtp(buf, &mut cipher)
            }
        };

        let result = match encrypted {
            Ok(n) if n >= buf.len() => self.udp_ref().send(&cipher[..n]),
            Ok(n) => {
                // The suite appends a tag; a shrink means the transform went
                // wrong. Drop the packet.
                tracing::warn!(plain = buf.len(), cipher = n, "encrypt shrank packet");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(plain = buf.len(), error = %e, "failed to encrypt packet");
                Ok(())
            }
        };
        self.cipher_buf = cipher;
        result
    }

    /// One non-blocking receive: feed DTLS records (alerts arrive this way),
    /// answer binding requests, decrypt RTCP and react to feedback.
    fn poll_socket(&mut self) -> Result<()> {
        let mut buf = [0u8; MAX_UDP_BUFFER_SIZE];
        let Some(n) = self.udp_ref().recv(&mut buf)? else {
            return Ok(());
        };
        let datagram = &buf[..n];

        if dtls::is_dtls_record(datagram) {
            self.dtls_mut().feed(datagram)?;
            self.sync_dtls_state();
            return Ok(());
        }
        if stun::is_binding_request(datagram) {
            return self.answer_binding_request(datagram);
        }
        if rtcp::is_rtp_or_rtcp(datagram) && rtcp::is_rtcp(datagram) {
            self.handle_rtcp(datagram);
        }
        Ok(())
    }

    fn handle_rtcp(&mut self, datagram: &[u8]) {
        let Some(recv) = self.srtp_recv.as_ref() else {
            return;
        };
        let plain = match recv.decrypt_rtcp(datagram) {
            Ok(plain) => plain,
            Err(e) => {
                tracing::debug!(error = %e, "dropping undecryptable RTCP");
                return;
            }
        };

        for feedback in rtcp::parse_feedback(&plain) {
            if feedback.wants_keyframe() {
                tracing::debug!(?feedback, "peer requested a keyframe");
                if let Some(callback) = self.on_keyframe_request.as_mut() {
                    callback();
                }
            } else {
                tracing::debug!(?feedback, "ignoring payload-specific feedback");
            }
        }
    }

    /// Tear the session down: DELETE the WHIP resource if one was returned.
    /// Failures are logged, not surfaced. Also runs on drop.
    pub fn close(&mut self) {
        if let Some(url) = self.resource_url.take() {
            match self.signaler.dispose(&url) {
                Ok(()) => tracing::info!(resource = %url, "disposed WHIP resource"),
                Err(e) => tracing::warn!(resource = %url, error = %e, "failed to dispose resource"),
            }
        }
    }

    fn set_failed(&mut self) {
        if self.state != SessionState::Failed {
            tracing::error!(state = %self.state, "session failed");
            self.state = SessionState::Failed;
        }
    }

    /// Move the state forward; states never decrease and `Failed` is only
    /// entered through [`Self::set_failed`].
    fn advance(&mut self, next: SessionState) {
        debug_assert!(next < SessionState::Failed);
        if self.state != SessionState::Failed && next > self.state {
            self.state = next;
        }
    }

    fn udp_ref(&self) -> &UdpTransport {
        self.udp.as_ref().expect("UDP transport connected")
    }

    fn dtls_ref(&self) -> &DtlsSession {
        self.dtls.as_ref().expect("DTLS session created")
    }

    fn dtls_mut(&mut self) -> &mut DtlsSession {
        self.dtls.as_mut().expect("DTLS session created")
    }
}

impl Drop for WhipSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for WhipSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhipSession")
            .field("state", &self.state)
            .field("endpoint", &self.config.endpoint)
            .field("resource_url", &self.resource_url)
            .finish()
    }
}

fn phase_ms(from: Option<Instant>, to: Option<Instant>) -> u64 {
    match (from, to) {
        (Some(a), Some(b)) => b.saturating_duration_since(a).as_millis() as u64,
        _ => 0,
    }
}
