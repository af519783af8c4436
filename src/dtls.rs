//! DTLS transport for SRTP keying.
//!
//! Wraps OpenSSL in the passive (accept) role: the offer advertises
//! `a=setup:passive`, so the peer is the DTLS client and this side answers.
//! Records move through an in-memory datagram pump — inbound datagrams are
//! queued by [`DtlsSession::feed`], outbound records are handed one by one to
//! a write callback so that every record leaves the host as its own UDP
//! datagram and handshake flights never get concatenated past the MTU.
//!
//! After the handshake, 60 bytes of keying material are exported with the
//! `EXTRACTOR-dtls_srtp` label and split into the SRTP send/recv keys.

use crate::error::{Result, WhipError};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{
    ErrorCode, Ssl, SslContext, SslMethod, SslOptions, SslStream, SslVerifyMode,
};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// Keying material exported after the handshake:
/// `client_key(16) | server_key(16) | client_salt(14) | server_salt(14)`.
pub const DTLS_SRTP_MATERIAL_LEN: usize = 60;

/// SRTP master key length within the exported material.
pub const DTLS_SRTP_KEY_LEN: usize = 16;

/// SRTP master salt length within the exported material.
pub const DTLS_SRTP_SALT_LEN: usize = 14;

/// Export label for DTLS-SRTP keying material (RFC 5764).
const KEYING_MATERIAL_LABEL: &str = "EXTRACTOR-dtls_srtp";

/// The SRTP profile negotiated in the DTLS handshake. OpenSSL calls the
/// AES_CM_128_HMAC_SHA1_80 suite `SRTP_AES128_CM_SHA1_80`.
const SRTP_PROFILE: &str = "SRTP_AES128_CM_SHA1_80";

/// Curves offered for the handshake, matching a browser ClientHello's
/// supported groups.
const CURVE_LIST: &str = "X25519:P-256:P-384:P-521";

/// Common name on the self-signed certificate.
const CERT_CN: &str = "ffmpeg.org";

/// Certificate validity in days.
const CERT_EXPIRE_DAYS: u32 = 365;

/// DTLS session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtlsState {
    /// Created, handshake not started.
    New,
    /// Accept path entered, flights in progress.
    Handshaking,
    /// Handshake complete, keying material exported.
    Finished,
    /// Peer sent close-notify; the session is over.
    Closed,
    /// Fatal alert or handshake error.
    Failed,
}

/// Whether a datagram is a DTLS record: content types occupy 20..=63 and a
/// record is never shorter than its 13-byte header.
pub fn is_dtls_record(buf: &[u8]) -> bool {
    buf.len() > 13 && buf[0] >= 20 && buf[0] < 64
}

/// Self-signed certificate and key used for the DTLS handshake and the SDP
/// fingerprint.
pub struct DtlsCertificate {
    pkey: PKey<Private>,
    cert: X509,
    fingerprint: String,
}

impl DtlsCertificate {
    /// Generate a fresh ECDSA P-256 key and self-signed certificate.
    pub fn generate() -> Result<Self> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
        let eckey = EcKey::generate(&group)?;
        let pkey = PKey::from_ec_key(eckey)?;

        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_text("CN", CERT_CN)?;
        let name = name.build();

        let mut serial = BigNum::new()?;
        serial.rand(64, MsbOption::MAYBE_ZERO, false)?;
        let serial = serial.to_asn1_integer()?;
        let not_before = Asn1Time::days_from_now(0)?;
        let not_after = Asn1Time::days_from_now(CERT_EXPIRE_DAYS)?;

        let mut builder = X509Builder::new()?;
        builder.set_version(2)?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;
        builder.set_pubkey(&pkey)?;
        builder.sign(&pkey, MessageDigest::sha1())?;
        let cert = builder.build();

        let digest = cert.digest(MessageDigest::sha256())?;
        let fingerprint = digest
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":");

        tracing::debug!(fingerprint = %fingerprint, "generated DTLS certificate");
        Ok(Self {
            pkey,
            cert,
            fingerprint,
        })
    }

    /// SHA-256 fingerprint of the certificate, upper-hex bytes joined by `:`,
    /// as placed in the SDP offer.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Callback invoked with each outbound DTLS record.
pub type WriteCallback = Box<dyn FnMut(&[u8]) -> io::Result<()> + Send>;

/// In-memory datagram BIO: reads pop queued inbound datagrams, writes hand
/// each record to the callback unfragmented.
struct RecordPump {
    inbound: VecDeque<Vec<u8>>,
    on_write: WriteCallback,
    /// Last outbound (content type, handshake type), for ARQ accounting.
    last_out: (u8, u8),
    /// Number of retransmitted outbound records observed.
    arq_packets: u32,
}

impl RecordPump {
    fn trace(direction: &str, data: &[u8]) -> (u8, u8) {
        let content_type = data.first().copied().unwrap_or(0);
        let size = if data.len() >= 13 {
            u16::from_be_bytes([data[11], data[12]])
        } else {
            0
        };
        let handshake_type = if data.len() >= 14 { data[13] } else { 0 };
        tracing::trace!(
            direction,
            len = data.len(),
            content_type,
            size,
            handshake_type,
            "DTLS record"
        );
        (content_type, handshake_type)
    }
}

impl Read for RecordPump {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbound.pop_front() {
            Some(datagram) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(n)
            }
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Write for RecordPump {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let out = Self::trace("send", buf);
        if out == self.last_out && out.0 != 0 {
            self.arq_packets += 1;
        }
        self.last_out = out;
        (self.on_write)(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Passive-role DTLS session over an in-memory datagram pump.
pub struct DtlsSession {
    stream: SslStream<RecordPump>,
    state: DtlsState,
    srtp_material: Option<[u8; DTLS_SRTP_MATERIAL_LEN]>,
}

impl DtlsSession {
    /// Build the accept-role session. `mtu` bounds every handshake flight so
    /// each record fits one UDP datagram; `on_write` sends a record.
    pub fn new(certificate: &DtlsCertificate, mtu: usize, on_write: WriteCallback) -> Result<Self> {
        let mut ctx = SslContext::builder(SslMethod::dtls())?;
        ctx.set_groups_list(CURVE_LIST)?;
        ctx.set_cipher_list("ALL")?;
        ctx.set_certificate(&certificate.cert)?;
        ctx.set_private_key(&certificate.pkey)?;
        // The peer presents a self-signed certificate; accept it and let the
        // SDP fingerprint carry the trust.
        ctx.set_verify_callback(
            SslVerifyMode::PEER | SslVerifyMode::CLIENT_ONCE,
            |_preverified, _ctx| true,
        );
        ctx.set_verify_depth(4);
        ctx.set_read_ahead(true);
        ctx.set_tlsext_use_srtp(SRTP_PROFILE)?;
        ctx.set_options(SslOptions::NO_QUERY_MTU);
        let ctx = ctx.build();

        let mut ssl = Ssl::new(&ctx)?;
        ssl.set_mtu(mtu as u32)?;
        ssl.set_accept_state();

        let pump = RecordPump {
            inbound: VecDeque::new(),
            on_write,
            last_out: (0, 0),
            arq_packets: 0,
        };
        let stream = SslStream::new(ssl, pump)?;

        Ok(Self {
            stream,
            state: DtlsState::New,
            srtp_material: None,
        })
    }

    /// Current session state.
    pub fn state(&self) -> DtlsState {
        self.state
    }

    /// Number of retransmitted outbound records.
    pub fn arq_packets(&self) -> u32 {
        self.stream.get_ref().arq_packets
    }

    /// Enter the accept path. Called once, after the first successful ICE
    /// binding response.
    pub fn start(&mut self) -> Result<()> {
        if self.state != DtlsState::New {
            return Ok(());
        }
        self.state = DtlsState::Handshaking;
        self.drive()
    }

    /// Queue one inbound datagram and drive the state machine.
    pub fn feed(&mut self, datagram: &[u8]) -> Result<()> {
        RecordPump::trace("recv", datagram);
        self.stream.get_mut().inbound.push_back(datagram.to_vec());
        self.drive()
    }

    /// Exported SRTP keying material, available once `state() == Finished`.
    pub fn srtp_material(&self) -> Option<&[u8; DTLS_SRTP_MATERIAL_LEN]> {
        self.srtp_material.as_ref()
    }

    fn drive(&mut self) -> Result<()> {
        match self.state {
            DtlsState::Handshaking => self.drive_handshake(),
            DtlsState::Finished => self.drain_records(),
            // New (start not called), Closed and Failed consume nothing.
            _ => Ok(()),
        }
    }

    fn drive_handshake(&mut self) -> Result<()> {
        match self.stream.do_handshake() {
            Ok(()) => {
                let mut material = [0u8; DTLS_SRTP_MATERIAL_LEN];
                self.stream
                    .ssl()
                    .export_keying_material(&mut material, KEYING_MATERIAL_LABEL, None)
                    .map_err(|e| {
                        self.state = DtlsState::Failed;
                        WhipError::Dtls(format!("keying material export failed: {e}"))
                    })?;
                self.srtp_material = Some(material);
                self.state = DtlsState::Finished;
                tracing::info!(arq = self.arq_packets(), "DTLS handshake finished");
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::WANT_READ => Ok(()),
            Err(e) => {
                self.state = DtlsState::Failed;
                Err(WhipError::Dtls(format!("handshake failed: {e}")))
            }
        }
    }

    /// Read application-side records after the handshake. This is how alerts
    /// arrive: close-notify shows up as a zero return.
    fn drain_records(&mut self) -> Result<()> {
        let mut scratch = [0u8; 2048];
        loop {
            match self.stream.ssl_read(&mut scratch) {
                Ok(0) => {
                    self.state = DtlsState::Closed;
                    tracing::debug!("DTLS close-notify received");
                    return Ok(());
                }
                Ok(n) => {
                    tracing::trace!(len = n, "discarding DTLS application data");
                }
                Err(e) if e.code() == ErrorCode::WANT_READ => return Ok(()),
                Err(e) if e.code() == ErrorCode::ZERO_RETURN => {
                    self.state = DtlsState::Closed;
                    tracing::debug!("DTLS close-notify received");
                    return Ok(());
                }
                Err(e) => {
                    self.state = DtlsState::Failed;
                    return Err(WhipError::Dtls(format!("DTLS read failed: {e}")));
                }
            }
        }
    }
}

impl std::fmt::Debug for DtlsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DtlsSession")
            .field("state", &self.state)
            .field("arq_packets", &self.arq_packets())
            .finish()
    }
}

/// Split the exported keying material into send and receive master keys.
///
/// The offer pins `a=setup:passive`, so this host is the DTLS server: the
/// send key is `server_key ‖ server_salt` and the receive key is
/// `client_key ‖ client_salt`. Reversing this interoperates with nobody.
pub fn split_keying_material(
    material: &[u8; DTLS_SRTP_MATERIAL_LEN],
) -> ([u8; 30], [u8; 30]) {
    let client_key = &material[..DTLS_SRTP_KEY_LEN];
    let server_key = &material[DTLS_SRTP_KEY_LEN..2 * DTLS_SRTP_KEY_LEN];
    let client_salt = &material[2 * DTLS_SRTP_KEY_LEN..2 * DTLS_SRTP_KEY_LEN + DTLS_SRTP_SALT_LEN];
    let server_salt = &material[2 * DTLS_SRTP_KEY_LEN + DTLS_SRTP_SALT_LEN..];

    let mut send_key = [0u8; 30];
    send_key[..DTLS_SRTP_KEY_LEN].copy_from_slice(server_key);
    send_key[DTLS_SRTP_KEY_LEN..].copy_from_slice(server_salt);

    let mut recv_key = [0u8; 30];
    recv_key[..DTLS_SRTP_KEY_LEN].copy_from_slice(client_key);
    recv_key[DTLS_SRTP_KEY_LEN..].copy_from_slice(client_salt);

    (send_key, recv_key)
}
