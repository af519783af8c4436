//! STUN binding messages for ICE-Lite connectivity.
//!
//! Implements the subset of RFC 5389 the publisher needs: Binding Request
//! with USERNAME, USE-CANDIDATE, MESSAGE-INTEGRITY (HMAC-SHA1) and
//! FINGERPRINT (CRC-32 XOR "STUN"), and the Binding Success response sent
//! back for the peer's ICE-Lite checks.

use byteorder::{BigEndian, WriteBytesExt};
use crc::{Crc, CRC_32_ISO_HDLC};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// The magic cookie for STUN messages.
pub const STUN_MAGIC_COOKIE: u32 = 0x2112A442;

/// STUN message header size: type (2) + length (2) + cookie (4) + tid (12).
pub const STUN_HEADER_SIZE: usize = 20;

/// FINGERPRINT XOR mask, the ASCII bytes "STUN".
const FINGERPRINT_XOR: u32 = 0x5354554E;

const BINDING_REQUEST: u16 = 0x0001;
const BINDING_SUCCESS: u16 = 0x0101;

/// STUN attributes, comprehension-required range (0x0000-0x7FFF).
const ATTR_USERNAME: u16 = 0x0006;
const ATTR_MESSAGE_INTEGRITY: u16 = 0x0008;
const ATTR_USE_CANDIDATE: u16 = 0x0025;
const ATTR_FINGERPRINT: u16 = 0x8028;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Build a Binding Request with a random transaction ID.
///
/// `username` is `{remote_ufrag}:{local_ufrag}` and the MESSAGE-INTEGRITY is
/// keyed with the remote ICE password.
pub fn create_binding_request<R: Rng>(rng: &mut R, username: &str, remote_pwd: &str) -> Vec<u8> {
    let mut tid = [0u8; 12];
    rng.fill(&mut tid);
    create_binding_request_with_tid(&tid, username, remote_pwd)
}

/// Build a Binding Request with an explicit transaction ID.
pub fn create_binding_request_with_tid(
    tid: &[u8; 12],
    username: &str,
    remote_pwd: &str,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    write_header(&mut buf, BINDING_REQUEST, tid);

    // USERNAME, zero-padded to a 4-byte boundary.
    buf.write_u16::<BigEndian>(ATTR_USERNAME).unwrap();
    buf.write_u16::<BigEndian>(username.len() as u16).unwrap();
    buf.extend_from_slice(username.as_bytes());
    let pad = (4 - username.len() % 4) % 4;
    buf.extend(std::iter::repeat(0u8).take(pad));

    // USE-CANDIDATE, zero length.
    buf.write_u16::<BigEndian>(ATTR_USE_CANDIDATE).unwrap();
    buf.write_u16::<BigEndian>(0).unwrap();

    append_integrity(&mut buf, remote_pwd);
    append_fingerprint(&mut buf);
    buf
}

/// Build a Binding Success response for an inbound request, echoing the
/// request's transaction ID. The MESSAGE-INTEGRITY is keyed with the local
/// ICE password.
pub fn create_binding_response(tid: &[u8; 12], local_pwd: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_header(&mut buf, BINDING_SUCCESS, tid);
    append_integrity(&mut buf, local_pwd);
    append_fingerprint(&mut buf);
    buf
}

fn write_header(buf: &mut Vec<u8>, msg_type: u16, tid: &[u8; 12]) {
    buf.write_u16::<BigEndian>(msg_type).unwrap();
    buf.write_u16::<BigEndian>(0).unwrap(); // length, patched per attribute
    buf.write_u32::<BigEndian>(STUN_MAGIC_COOKIE).unwrap();
    buf.extend_from_slice(tid);
}

/// Append MESSAGE-INTEGRITY: the header length is first rewritten to cover
/// everything up to and including this attribute, then the HMAC-SHA1 is
/// computed over the bytes preceding the attribute value.
fn append_integrity(buf: &mut Vec<u8>, pwd: &str) {
    buf.write_u16::<BigEndian>(ATTR_MESSAGE_INTEGRITY).unwrap();
    buf.write_u16::<BigEndian>(20).unwrap();
    let size = buf.len() + 20;
    patch_length(buf, size);

    let mut mac = HmacSha1::new_from_slice(pwd.as_bytes()).expect("any key length is valid");
    mac.update(&buf[..size - 24]);
    let tag = mac.finalize().into_bytes();
    buf.extend_from_slice(&tag[..20]);
}

/// Append FINGERPRINT: CRC-32/IEEE over the whole message excluding the
/// fingerprint attribute, XOR'd with "STUN".
fn append_fingerprint(buf: &mut Vec<u8>) {
    buf.write_u16::<BigEndian>(ATTR_FINGERPRINT).unwrap();
    buf.write_u16::<BigEndian>(4).unwrap();
    let size = buf.len() + 4;
    patch_length(buf, size);

    let crc = CRC32.checksum(&buf[..size - 8]);
    buf.write_u32::<BigEndian>(crc ^ FINGERPRINT_XOR).unwrap();
}

fn patch_length(buf: &mut [u8], total_size: usize) {
    let length = (total_size - STUN_HEADER_SIZE) as u16;
    buf[2..4].copy_from_slice(&length.to_be_bytes());
}

/// A Binding Request is encoded into the first 16 bits as 0x0001.
pub fn is_binding_request(buf: &[u8]) -> bool {
    buf.len() >= STUN_HEADER_SIZE && buf[0] == 0x00 && buf[1] == 0x01
}

/// A Binding Success response is encoded into the first 16 bits as 0x0101.
pub fn is_binding_success(buf: &[u8]) -> bool {
    buf.len() >= STUN_HEADER_SIZE && buf[0] == 0x01 && buf[1] == 0x01
}

/// Extract the 12-byte transaction ID.
pub fn transaction_id(buf: &[u8]) -> Option<[u8; 12]> {
    if buf.len() < STUN_HEADER_SIZE {
        return None;
    }
    let mut tid = [0u8; 12];
    tid.copy_from_slice(&buf[8..20]);
    Some(tid)
}

/// Verify the MESSAGE-INTEGRITY of an inbound message against `pwd`.
///
/// The header length is adjusted to the value it had when the tag was
/// computed (covering up to and including MESSAGE-INTEGRITY, excluding any
/// trailing FINGERPRINT). Messages without the attribute fail the check.
pub fn verify_integrity(buf: &[u8], pwd: &str) -> bool {
    if buf.len() < STUN_HEADER_SIZE + 4 {
        return false;
    }
    let msg_len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
    let attrs_end = (STUN_HEADER_SIZE + msg_len).min(buf.len());

    let mut pos = STUN_HEADER_SIZE;
    while pos + 4 <= attrs_end {
        let attr_type = u16::from_be_bytes([buf[pos], buf[pos + 1]]);
        let attr_len = u16::from_be_bytes([buf[pos + 2], buf[pos + 3]]) as usize;
        let value = pos + 4;

        if attr_type == ATTR_MESSAGE_INTEGRITY && attr_len == 20 {
            if value + 20 > buf.len() {
                return false;
            }
            let mut signed = buf[..pos + 4].to_vec();
            patch_length(&mut signed, pos + 24);

            let mut mac =
                HmacSha1::new_from_slice(pwd.as_bytes()).expect("any key length is valid");
            mac.update(&signed[..pos]);
            let tag = mac.finalize().into_bytes();
            return tag[..20] == buf[value..value + 20];
        }

        pos = value + (attr_len + 3) / 4 * 4;
    }
    false
}

/// Verify the trailing FINGERPRINT attribute.
pub fn verify_fingerprint(buf: &[u8]) -> bool {
    if buf.len() < STUN_HEADER_SIZE + 8 {
        return false;
    }
    let fp_pos = buf.len() - 8;
    let attr_type = u16::from_be_bytes([buf[fp_pos], buf[fp_pos + 1]]);
    if attr_type != ATTR_FINGERPRINT {
        return false;
    }
    let stored = u32::from_be_bytes([
        buf[buf.len() - 4],
        buf[buf.len() - 3],
        buf[buf.len() - 2],
        buf[buf.len() - 1],
    ]);
    CRC32.checksum(&buf[..fp_pos]) ^ FINGERPRINT_XOR == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    const TID: [u8; 12] = [9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0xAA, 0xBB];

    #[test]
    fn test_request_layout() {
        let req = create_binding_request_with_tid(&TID, "Xabc:00c0ffee", "Ypwd32aaaabbbbccccddddeeeeffff00");

        assert!(is_binding_request(&req));
        assert!(!is_binding_success(&req));
        assert_eq!(transaction_id(&req), Some(TID));
        assert_eq!(
            u32::from_be_bytes([req[4], req[5], req[6], req[7]]),
            STUN_MAGIC_COOKIE
        );
        // Header length covers everything after the 20-byte header.
        let length = u16::from_be_bytes([req[2], req[3]]) as usize;
        assert_eq!(length, req.len() - STUN_HEADER_SIZE);
    }

    #[test]
    fn test_request_integrity_and_fingerprint_verify() {
        let pwd = "bi8k19m9n836187b00d1gm3946234w85";
        let req = create_binding_request_with_tid(&TID, "remote:local", pwd);
        assert!(verify_integrity(&req, pwd));
        assert!(!verify_integrity(&req, "wrong-password"));
        assert!(verify_fingerprint(&req));

        // Corrupt one payload byte: both checks must fail.
        let mut bad = req.clone();
        bad[24] ^= 0xFF;
        assert!(!verify_integrity(&bad, pwd));
        assert!(!verify_fingerprint(&bad));
    }

    #[test]
    fn test_request_rebuild_is_byte_identical() {
        let a = create_binding_request_with_tid(&TID, "Xabc:cafebabe", "0123456789abcdef0123456789abcdef");
        let b = create_binding_request_with_tid(&TID, "Xabc:cafebabe", "0123456789abcdef0123456789abcdef");
        assert_eq!(a, b);
    }

    #[test]
    fn test_response_echoes_tid_and_signs_with_local_pwd() {
        let pwd = "local-ice-password-32-bytes-long";
        let resp = create_binding_response(&TID, pwd);
        assert!(is_binding_success(&resp));
        assert_eq!(transaction_id(&resp), Some(TID));
        assert!(verify_integrity(&resp, pwd));
        assert!(verify_fingerprint(&resp));
    }

    #[test]
    fn test_username_padding() {
        // 9-byte username pads to 12; the attribute boundary stays aligned.
        let req = create_binding_request_with_tid(&TID, "abcd:wxyz", "pwd");
        let attr_len = u16::from_be_bytes([req[22], req[23]]) as usize;
        assert_eq!(attr_len, 9);
        assert_eq!(&req[24 + 9..24 + 12], &[0, 0, 0]);
        assert!(verify_fingerprint(&req));
    }

    #[test]
    fn test_classification_needs_full_header() {
        assert!(!is_binding_request(&[0x00, 0x01]));
        assert!(!is_binding_success(&[0x01, 0x01, 0x00]));
    }
}
