//! End-to-end publishing against an in-process WHIP peer.
//!
//! The mock peer plays the server side of the whole protocol: it answers the
//! HTTP POST with an SDP answer pointing at its own UDP socket, replies to
//! the STUN binding request, runs a real DTLS client handshake against the
//! session, and finally decrypts the SRTP media it receives.

use aes::cipher::{KeyIvInit, StreamCipher};
use openssl::ssl::{ErrorCode, Ssl, SslContext, SslMethod, SslStream, SslVerifyMode};
use std::io::{self, Read, Write};
use std::net::{TcpListener, UdpSocket};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use whip_publisher::{
    stun, AudioParams, MediaPacket, TimeBase, VideoParams, WhipConfig, WhipSession,
};

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

const PEER_UFRAG: &str = "peer91f9";
const PEER_PWD: &str = "peerpwd9m9n836187b00d1gm3946234w";

fn avcc_extradata(sps: &[u8], pps: &[u8]) -> Vec<u8> {
    let mut out = vec![1, 0x42, 0xc0, 0x1e, 0xff, 0xe1];
    out.extend_from_slice(&(sps.len() as u16).to_be_bytes());
    out.extend_from_slice(sps);
    out.push(1);
    out.extend_from_slice(&(pps.len() as u16).to_be_bytes());
    out.extend_from_slice(pps);
    out
}

/// Serve the WHIP POST and the teardown DELETE on one listener.
fn spawn_http_server(udp_port: u16) -> (std::thread::JoinHandle<Vec<String>>, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let http_port = listener.local_addr().unwrap().port();

    let handle = std::thread::spawn(move || {
        let mut requests = Vec::new();
        for _ in 0..2 {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_http_request(&mut stream);
            let is_post = request.starts_with("POST");

            if is_post {
                let answer = format!(
                    "v=0\r\n\
                     o=- 0 2 IN IP4 0.0.0.0\r\n\
                     s=MockWhipSession\r\n\
                     t=0 0\r\n\
                     a=ice-lite\r\n\
                     m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
                     a=ice-ufrag:{PEER_UFRAG}\r\n\
                     a=ice-pwd:{PEER_PWD}\r\n\
                     a=setup:active\r\n\
                     a=recvonly\r\n\
                     a=candidate:0 1 udp 2130706431 127.0.0.1 {udp_port} typ host generation 0\r\n\
                     m=video 9 UDP/TLS/RTP/SAVPF 106\r\n\
                     a=recvonly\r\n"
                );
                let response = format!(
                    "HTTP/1.1 201 Created\r\n\
                     Content-Type: application/sdp\r\n\
                     Location: /whip/resource/e2e\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{answer}",
                    answer.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
            } else {
                stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .unwrap();
            }
            requests.push(request);
            if !is_post {
                break;
            }
        }
        requests
    });

    (handle, http_port)
}

fn read_http_request(stream: &mut std::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 2048];
    loop {
        let n = stream.read(&mut buf).unwrap();
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(body_at) = text.find("\r\n\r\n") {
            let content_length = text
                .lines()
                .find_map(|l| {
                    l.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if data.len() >= body_at + 4 + content_length {
                break;
            }
        }
        if n == 0 {
            break;
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Datagram endpoint for the peer's DTLS client: skips non-DTLS traffic.
struct DtlsEndpoint {
    socket: UdpSocket,
    session_addr: std::net::SocketAddr,
}

impl Read for DtlsEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut scratch = [0u8; 4096];
        loop {
            match self.socket.recv_from(&mut scratch) {
                Ok((n, _)) => {
                    if n > 13 && scratch[0] >= 20 && scratch[0] < 64 {
                        let take = n.min(buf.len());
                        buf[..take].copy_from_slice(&scratch[..take]);
                        return Ok(take);
                    }
                    // STUN retransmit or similar; keep reading.
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Write for DtlsEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send_to(buf, self.session_addr)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct PeerReport {
    send_master: [u8; 30],
    media: Vec<Vec<u8>>,
}

/// The UDP half of the mock peer: STUN, DTLS client, media capture.
fn run_peer(socket: UdpSocket, media_packets: usize) -> PeerReport {
    socket
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let mut buf = [0u8; 4096];

    // ICE: answer the publisher's binding request. The HTTP exchange runs
    // first, so allow a generous wait.
    let deadline = Instant::now() + Duration::from_secs(5);
    let (session_addr, tid) = loop {
        match socket.recv_from(&mut buf) {
            Ok((n, from)) if stun::is_binding_request(&buf[..n]) => {
                break (from, stun::transaction_id(&buf[..n]).unwrap());
            }
            Ok(_) => {}
            Err(_) => assert!(Instant::now() < deadline, "no binding request seen"),
        }
    };
    let response = stun::create_binding_response(&tid, PEER_PWD);
    socket.send_to(&response, session_addr).unwrap();

    // DTLS: client role against the publisher's passive session.
    let mut ctx = SslContext::builder(SslMethod::dtls()).unwrap();
    ctx.set_tlsext_use_srtp("SRTP_AES128_CM_SHA1_80").unwrap();
    ctx.set_verify(SslVerifyMode::NONE);
    let ctx = ctx.build();
    let mut ssl = Ssl::new(&ctx).unwrap();
    ssl.set_connect_state();
    let endpoint = DtlsEndpoint {
        socket,
        session_addr,
    };
    let mut stream = SslStream::new(ssl, endpoint).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match stream.do_handshake() {
            Ok(()) => break,
            Err(e) if e.code() == ErrorCode::WANT_READ => {
                assert!(Instant::now() < deadline, "DTLS client handshake timed out");
            }
            Err(e) => panic!("DTLS client handshake failed: {e}"),
        }
    }

    let mut material = [0u8; 60];
    stream
        .ssl()
        .export_keying_material(&mut material, "EXTRACTOR-dtls_srtp", None)
        .unwrap();
    // The publisher is the DTLS server, so it sends with server_key/salt.
    let mut send_master = [0u8; 30];
    send_master[..16].copy_from_slice(&material[16..32]);
    send_master[16..].copy_from_slice(&material[32 + 14..]);

    // Capture encrypted media.
    let socket = &stream.get_ref().socket;
    let mut media = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while media.len() < media_packets && Instant::now() < deadline {
        match socket.recv_from(&mut buf) {
            Ok((n, _)) if n >= 12 && buf[0] & 0xC0 == 0x80 => {
                media.push(buf[..n].to_vec());
            }
            _ => {}
        }
    }

    PeerReport { send_master, media }
}

/// AES-CM key derivation, mirroring RFC 3711 with derivation rate 0.
fn kdf(master_key: &[u8; 16], master_salt: &[u8; 14], label: u8, len: usize) -> Vec<u8> {
    let mut iv = [0u8; 16];
    iv[..14].copy_from_slice(master_salt);
    iv[7] ^= label;
    let mut out = vec![0u8; len];
    let mut cipher = Aes128Ctr::new(master_key.into(), &iv.into());
    cipher.apply_keystream(&mut out);
    out
}

/// Decrypt one SRTP packet sent with `send_master` (ROC 0), returning the
/// plaintext payload.
fn decrypt_rtp(send_master: &[u8; 30], packet: &[u8]) -> Vec<u8> {
    let master_key: [u8; 16] = send_master[..16].try_into().unwrap();
    let master_salt: [u8; 14] = send_master[16..].try_into().unwrap();
    let cipher_key: [u8; 16] = kdf(&master_key, &master_salt, 0, 16).try_into().unwrap();
    let salt: [u8; 14] = kdf(&master_key, &master_salt, 2, 14).try_into().unwrap();

    let mut iv = [0u8; 16];
    iv[4..8].copy_from_slice(&packet[8..12]); // SSRC
    iv[12..14].copy_from_slice(&packet[2..4]); // seq, ROC 0
    for i in 0..14 {
        iv[i] ^= salt[i];
    }

    let mut payload = packet[12..packet.len() - 10].to_vec();
    let mut cipher = Aes128Ctr::new((&cipher_key).into(), &iv.into());
    cipher.apply_keystream(&mut payload);
    payload
}

#[test]
fn test_publish_end_to_end() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let udp = UdpSocket::bind("127.0.0.1:0").unwrap();
    let udp_port = udp.local_addr().unwrap().port();
    let (http_thread, http_port) = spawn_http_server(udp_port);

    let (report_tx, report_rx) = mpsc::channel();
    let peer_thread = std::thread::spawn(move || {
        report_tx.send(run_peer(udp, 3)).unwrap();
    });

    let sps = [0x67u8, 0x42, 0xc0, 0x1e, 0xd9, 0x40];
    let pps = [0x68u8, 0xce, 0x3c, 0x80];
    let video = VideoParams {
        profile: None,
        level: None,
        extradata: avcc_extradata(&sps, &pps),
        video_delay: 0,
    };
    let audio = AudioParams::default();

    let config = WhipConfig::new(format!("http://127.0.0.1:{http_port}/whip/live"))
        .with_bearer_token("e2e-token");
    let mut session =
        WhipSession::connect(config, Some(&video), Some(&audio)).expect("session connects");
    assert_eq!(session.state().to_string(), "ready");

    // One AVCC IDR (SPS/PPS get injected ahead of it) and one Opus frame.
    let idr_nal = [0x65u8, 0x88, 0x84, 0x00, 0x21, 0xa0, 0x3f];
    let mut idr = (idr_nal.len() as u32).to_be_bytes().to_vec();
    idr.extend_from_slice(&idr_nal);
    session
        .write(&MediaPacket::video(&idr, 0, TimeBase::VIDEO_90KHZ, true))
        .unwrap();
    session
        .write(&MediaPacket::audio(b"opus-frame", 0, TimeBase::AUDIO_48KHZ))
        .unwrap();

    let report = report_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("peer finished");
    peer_thread.join().unwrap();

    assert!(report.media.len() >= 3, "expected >= 3 media datagrams");
    let video_packets: Vec<_> = report
        .media
        .iter()
        .filter(|p| p[1] & 0x7F == 106)
        .collect();
    let audio_packets: Vec<_> = report
        .media
        .iter()
        .filter(|p| p[1] & 0x7F == 111)
        .collect();
    assert_eq!(video_packets.len(), 2);
    assert_eq!(audio_packets.len(), 1);

    // First video packet: STAP-A aggregating SPS and PPS, marker cleared.
    let stap = decrypt_rtp(&report.send_master, video_packets[0]);
    assert_eq!(stap[0] & 0x1F, 24);
    assert_eq!(video_packets[0][1] & 0x80, 0);
    assert_eq!(&stap[1..3], &(sps.len() as u16).to_be_bytes());
    assert_eq!(&stap[3..3 + sps.len()], &sps);
    let pps_at = 3 + sps.len() + 2;
    assert_eq!(&stap[pps_at..pps_at + pps.len()], &pps);

    // Second video packet: the IDR itself, marker set.
    let idr_plain = decrypt_rtp(&report.send_master, video_packets[1]);
    assert_eq!(idr_plain, idr_nal);
    assert_eq!(video_packets[1][1] & 0x80, 0x80);

    // Audio rides its own SSRC and stays 12 + payload + 10 bytes long.
    assert_eq!(audio_packets[0].len(), 12 + "opus-frame".len() + 10);
    let opus_plain = decrypt_rtp(&report.send_master, audio_packets[0]);
    assert_eq!(opus_plain, b"opus-frame");

    // Teardown DELETEs the resource returned in Location.
    session.close();
    drop(session);
    let requests = http_thread.join().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("POST /whip/live"));
    assert!(requests[0].contains("e2e-token"));
    assert!(requests[1].starts_with("DELETE /whip/resource/e2e"));
}
