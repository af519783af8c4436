//! SRTP packet protection (RFC 3711, AES-CM-128 + HMAC-SHA1-80).
//!
//! Each context is one-directional and keyed from a 30-byte master
//! key + salt, handed over base64-encoded the same way the keying material
//! leaves the DTLS layer. RTP and RTCP use separately derived session keys;
//! outbound contexts track the rollover counter / SRTCP index themselves and
//! therefore must see every sequence number exactly once, in order.

use crate::error::{Result, WhipError};
use aes::cipher::{KeyIvInit, StreamCipher};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type HmacSha1 = Hmac<Sha1>;

/// The only supported crypto suite.
pub const SRTP_SUITE: &str = "AES_CM_128_HMAC_SHA1_80";

/// Auth tag length for HMAC-SHA1-80 (80 bits).
pub const SRTP_AUTH_TAG_LEN: usize = 10;

/// Bytes reserved per packet for the SRTP checksum and padding when sizing
/// RTP payloads against the MTU.
pub const SRTP_CHECKSUM_RESERVE: usize = 16;

/// Master key length for AES-128.
pub const SRTP_MASTER_KEY_LEN: usize = 16;

/// Master salt length.
pub const SRTP_MASTER_SALT_LEN: usize = 14;

/// One master key + salt.
pub const SRTP_MASTER_LEN: usize = SRTP_MASTER_KEY_LEN + SRTP_MASTER_SALT_LEN;

/// Key derivation labels (RFC 3711 section 4.3).
const LABEL_RTP_CIPHER: u8 = 0x00;
const LABEL_RTP_AUTH: u8 = 0x01;
const LABEL_RTP_SALT: u8 = 0x02;
const LABEL_RTCP_CIPHER: u8 = 0x03;
const LABEL_RTCP_AUTH: u8 = 0x04;
const LABEL_RTCP_SALT: u8 = 0x05;

const RTP_HEADER_SIZE: usize = 12;
const RTCP_HEADER_SIZE: usize = 8;

#[derive(Clone)]
struct SessionKeys {
    cipher_key: [u8; 16],
    auth_key: [u8; 20],
    salt: [u8; 14],
}

/// One-directional SRTP/SRTCP context.
pub struct SrtpContext {
    rtp: SessionKeys,
    rtcp: SessionKeys,
    /// Rollover counter for outbound RTP.
    roc: u32,
    last_seq: Option<u16>,
    /// 31-bit index for outbound SRTCP.
    srtcp_index: u32,
}

impl SrtpContext {
    /// Create a context from a base64-encoded 30-byte master key + salt.
    ///
    /// The suite must be [`SRTP_SUITE`]; the base64 handoff mirrors how the
    /// keying material is passed around after the DTLS export.
    pub fn new(suite: &str, base64_key: &str) -> Result<Self> {
        if suite != SRTP_SUITE {
            return Err(WhipError::Srtp(format!("unsupported crypto suite {suite}")));
        }
        let material = BASE64
            .decode(base64_key)
            .map_err(|e| WhipError::Srtp(format!("invalid base64 key: {e}")))?;
        if material.len() != SRTP_MASTER_LEN {
            return Err(WhipError::Srtp(format!(
                "master key material must be {SRTP_MASTER_LEN} bytes, got {}",
                material.len()
            )));
        }

        let mut master_key = [0u8; SRTP_MASTER_KEY_LEN];
        let mut master_salt = [0u8; SRTP_MASTER_SALT_LEN];
        master_key.copy_from_slice(&material[..SRTP_MASTER_KEY_LEN]);
        master_salt.copy_from_slice(&material[SRTP_MASTER_KEY_LEN..]);

        Ok(Self {
            rtp: SessionKeys {
                cipher_key: derive(&master_key, &master_salt, LABEL_RTP_CIPHER),
                auth_key: derive(&master_key, &master_salt, LABEL_RTP_AUTH),
                salt: derive(&master_key, &master_salt, LABEL_RTP_SALT),
            },
            rtcp: SessionKeys {
                cipher_key: derive(&master_key, &master_salt, LABEL_RTCP_CIPHER),
                auth_key: derive(&master_key, &master_salt, LABEL_RTCP_AUTH),
                salt: derive(&master_key, &master_salt, LABEL_RTCP_SALT),
            },
            roc: 0,
            last_seq: None,
            srtcp_index: 0,
        })
    }

    /// Encrypt an RTP packet into `out`, returning the ciphertext length.
    ///
    /// Output layout: `header || encrypted payload || auth tag`. The output
    /// is always `SRTP_AUTH_TAG_LEN` longer than the input.
    pub fn encrypt_rtp(&mut self, packet: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        let header_len = rtp_header_len(packet)
            .ok_or_else(|| WhipError::Srtp("RTP packet too short to encrypt".into()))?;

        let seq = u16::from_be_bytes([packet[2], packet[3]]);
        let ssrc = u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]]);

        // The sender owns the sequence space, so a backwards step is a wrap.
        if let Some(last) = self.last_seq {
            if seq < last {
                self.roc = self.roc.wrapping_add(1);
            }
        }
        self.last_seq = Some(seq);

        out.clear();
        out.extend_from_slice(packet);

        let iv = rtp_iv(&self.rtp.salt, ssrc, self.roc, seq);
        let mut cipher = Aes128Ctr::new((&self.rtp.cipher_key).into(), &iv.into());
        cipher.apply_keystream(&mut out[header_len..]);

        let mut mac = HmacSha1::new_from_slice(&self.rtp.auth_key).expect("any key length");
        mac.update(out);
        mac.update(&self.roc.to_be_bytes());
        let tag = mac.finalize().into_bytes();
        out.extend_from_slice(&tag[..SRTP_AUTH_TAG_LEN]);

        Ok(out.len())
    }

    /// Encrypt an RTCP packet into `out`, returning the ciphertext length.
    ///
    /// Output layout: `header || encrypted payload || E+index(4) || auth tag`.
    pub fn encrypt_rtcp(&mut self, packet: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        if packet.len() < RTCP_HEADER_SIZE {
            return Err(WhipError::Srtp("RTCP packet too short to encrypt".into()));
        }
        let ssrc = u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]);
        let index = self.srtcp_index;

        out.clear();
        out.extend_from_slice(packet);

        let iv = rtcp_iv(&self.rtcp.salt, ssrc, index);
        let mut cipher = Aes128Ctr::new((&self.rtcp.cipher_key).into(), &iv.into());
        cipher.apply_keystream(&mut out[RTCP_HEADER_SIZE..]);

        out.extend_from_slice(&(0x8000_0000u32 | index).to_be_bytes());

        let mut mac = HmacSha1::new_from_slice(&self.rtcp.auth_key).expect("any key length");
        mac.update(out);
        let tag = mac.finalize().into_bytes();
        out.extend_from_slice(&tag[..SRTP_AUTH_TAG_LEN]);

        self.srtcp_index = index.wrapping_add(1) & 0x7FFF_FFFF;
        Ok(out.len())
    }

    /// Verify and decrypt an inbound SRTCP packet.
    pub fn decrypt_rtcp(&self, packet: &[u8]) -> Result<Vec<u8>> {
        if packet.len() < RTCP_HEADER_SIZE + 4 + SRTP_AUTH_TAG_LEN {
            return Err(WhipError::Srtp("SRTCP packet too short".into()));
        }

        let tag_at = packet.len() - SRTP_AUTH_TAG_LEN;
        let mut mac = HmacSha1::new_from_slice(&self.rtcp.auth_key).expect("any key length");
        mac.update(&packet[..tag_at]);
        let expected = mac.finalize().into_bytes();
        if expected[..SRTP_AUTH_TAG_LEN] != packet[tag_at..] {
            return Err(WhipError::Srtp("SRTCP auth tag mismatch".into()));
        }

        let index_at = tag_at - 4;
        let e_index = u32::from_be_bytes([
            packet[index_at],
            packet[index_at + 1],
            packet[index_at + 2],
            packet[index_at + 3],
        ]);
        let ssrc = u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]);

        let mut plain = packet[..index_at].to_vec();
        if e_index & 0x8000_0000 != 0 {
            let iv = rtcp_iv(&self.rtcp.salt, ssrc, e_index & 0x7FFF_FFFF);
            let mut cipher = Aes128Ctr::new((&self.rtcp.cipher_key).into(), &iv.into());
            cipher.apply_keystream(&mut plain[RTCP_HEADER_SIZE..]);
        }
        Ok(plain)
    }
}

impl std::fmt::Debug for SrtpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("SrtpContext")
            .field("roc", &self.roc)
            .field("srtcp_index", &self.srtcp_index)
            .finish()
    }
}

/// AES-CM key derivation PRF (RFC 3711 section 4.3.1, derivation rate 0).
fn derive<const N: usize>(
    master_key: &[u8; SRTP_MASTER_KEY_LEN],
    master_salt: &[u8; SRTP_MASTER_SALT_LEN],
    label: u8,
) -> [u8; N] {
    let mut iv = [0u8; 16];
    iv[..SRTP_MASTER_SALT_LEN].copy_from_slice(master_salt);
    iv[7] ^= label;

    let mut out = [0u8; N];
    let mut cipher = Aes128Ctr::new(master_key.into(), &iv.into());
    cipher.apply_keystream(&mut out);
    out
}

/// Full RTP header length: fixed part, CSRC list and extension.
fn rtp_header_len(packet: &[u8]) -> Option<usize> {
    if packet.len() < RTP_HEADER_SIZE {
        return None;
    }
    let csrc_count = (packet[0] & 0x0F) as usize;
    let mut len = RTP_HEADER_SIZE + csrc_count * 4;
    if packet[0] & 0x10 != 0 {
        if packet.len() < len + 4 {
            return None;
        }
        let ext_words =
            u16::from_be_bytes([packet[len + 2], packet[len + 3]]) as usize;
        len += 4 + ext_words * 4;
    }
    (packet.len() >= len).then_some(len)
}

/// SRTP IV: `(salt XOR (ssrc << 64 | roc << 16 | seq)) << 16` (RFC 3711 4.1.1).
fn rtp_iv(salt: &[u8; 14], ssrc: u32, roc: u32, seq: u16) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[4..8].copy_from_slice(&ssrc.to_be_bytes());
    iv[8..12].copy_from_slice(&roc.to_be_bytes());
    iv[12..14].copy_from_slice(&seq.to_be_bytes());
    for i in 0..14 {
        iv[i] ^= salt[i];
    }
    iv
}

/// SRTCP IV: like the RTP one with the 31-bit index as packet index.
fn rtcp_iv(salt: &[u8; 14], ssrc: u32, index: u32) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[4..8].copy_from_slice(&ssrc.to_be_bytes());
    iv[10..14].copy_from_slice(&index.to_be_bytes());
    for i in 0..14 {
        iv[i] ^= salt[i];
    }
    iv
}
