//! H.264 extradata handling.
//!
//! Parses the ISOM AVCC form of H.264 extradata (AVCDecoderConfigurationRecord)
//! to extract the SPS/PPS and the NAL length size, and re-emits the parameter
//! sets as an access unit that can be fed through the RTP packetizer before
//! each IDR frame. Annex-B extradata is detected and passed through untouched.

use crate::error::{Result, WhipError};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

/// H.264 NAL unit types the publisher cares about.
pub const NAL_SPS: u8 = 7;
pub const NAL_PPS: u8 = 8;
pub const NAL_IDR: u8 = 5;

/// Parsed H.264 sequence header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcConfig {
    /// Size in bytes of the NAL length prefix for AVCC packets.
    /// Zero means the stream is annex-B and packets carry start codes.
    pub nal_length_size: usize,
    /// The single SPS NAL unit, without any prefix.
    pub sps: Vec<u8>,
    /// The single PPS NAL unit, without any prefix.
    pub pps: Vec<u8>,
    /// The raw extradata as handed in, used verbatim for annex-B insertion.
    pub extradata: Vec<u8>,
}

impl AvcConfig {
    /// Parse H.264 extradata.
    ///
    /// AVCC is recognized by a leading version byte of 1; anything else must
    /// contain an annex-B start code. AVCC extradata must carry exactly one
    /// SPS and one PPS, and a NAL length size of 1, 2 or 4.
    pub fn parse(extradata: &[u8]) -> Result<Self> {
        if extradata.is_empty() {
            return Err(WhipError::InvalidData("empty H.264 extradata".into()));
        }

        if extradata.len() < 4 || extradata[0] != 1 {
            // Not ISOM, may be annex-B.
            if !has_annexb_startcode(extradata) {
                return Err(WhipError::InvalidData(
                    "H.264 extradata must be ISOM or annex-B".into(),
                ));
            }
            return Ok(Self {
                nal_length_size: 0,
                sps: Vec::new(),
                pps: Vec::new(),
                extradata: extradata.to_vec(),
            });
        }

        let mut r = &extradata[1..];
        let mut skip = [0u8; 3];
        r.read_exact(&mut skip) // profile, profile compat, level
            .map_err(|_| truncated())?;

        // 6 bits reserved + 2 bits nal size length - 1.
        let nal_length_size = (r.read_u8().map_err(|_| truncated())? & 0x03) as usize + 1;
        if nal_length_size == 3 {
            return Err(WhipError::InvalidData(format!(
                "invalid NAL length size={nal_length_size}"
            )));
        }

        // 3 bits reserved + 5 bits number of SPS.
        let nb_sps = r.read_u8().map_err(|_| truncated())? & 0x1f;
        if nb_sps != 1 {
            return Err(WhipError::InvalidData(format!(
                "invalid number of SPS={nb_sps}, expected 1"
            )));
        }
        let sps = read_parameter_set(&mut r)?;

        let nb_pps = r.read_u8().map_err(|_| truncated())?;
        if nb_pps != 1 {
            return Err(WhipError::InvalidData(format!(
                "invalid number of PPS={nb_pps}, expected 1"
            )));
        }
        let pps = read_parameter_set(&mut r)?;

        Ok(Self {
            nal_length_size,
            sps,
            pps,
            extradata: extradata.to_vec(),
        })
    }

    /// Whether the stream is annex-B (start codes) rather than AVCC.
    pub fn is_annexb(&self) -> bool {
        self.nal_length_size == 0
    }

    /// Build the SPS/PPS access unit inserted before each IDR frame.
    ///
    /// Annex-B streams reuse the extradata bytes as-is. AVCC streams get each
    /// parameter set behind a big-endian `nal_length_size` prefix.
    pub fn parameter_set_unit(&self) -> Vec<u8> {
        if self.is_annexb() {
            return self.extradata.clone();
        }

        let n = self.nal_length_size;
        let mut out = Vec::with_capacity(2 * n + self.sps.len() + self.pps.len());
        for nal in [&self.sps, &self.pps] {
            for i in 0..n {
                out.push((nal.len() >> (8 * (n - i - 1))) as u8);
            }
            out.extend_from_slice(nal);
        }
        out
    }
}

fn read_parameter_set(r: &mut &[u8]) -> Result<Vec<u8>> {
    let size = r.read_u16::<BigEndian>().map_err(|_| truncated())? as usize;
    if size == 0 || r.len() < size {
        return Err(WhipError::InvalidData(format!(
            "invalid parameter set size={size}, remaining={}",
            r.len()
        )));
    }
    let mut buf = vec![0u8; size];
    r.read_exact(&mut buf).map_err(|_| truncated())?;
    Ok(buf)
}

fn truncated() -> WhipError {
    WhipError::InvalidData("truncated AVCC extradata".into())
}

/// Whether `data` contains a 3- or 4-byte annex-B start code.
pub fn has_annexb_startcode(data: &[u8]) -> bool {
    data.windows(3).any(|w| w == [0, 0, 1])
}

/// Find the position and length of the next start code at or after `from`.
pub fn next_startcode(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 {
            if data[i + 2] == 1 {
                return Some((i, 3));
            }
            if i + 4 <= data.len() && data[i + 2] == 0 && data[i + 3] == 1 {
                return Some((i, 4));
            }
        }
        i += 1;
    }
    None
}

/// Split an access unit into NAL units, handling both annex-B start codes
/// and `nal_length_size`-prefixed AVCC layouts.
pub fn split_nal_units(data: &[u8], nal_length_size: usize) -> Vec<&[u8]> {
    let mut nalus = Vec::new();

    if nal_length_size == 0 {
        let Some((first, sc_len)) = next_startcode(data, 0) else {
            return nalus;
        };
        let mut start = first + sc_len;
        while start < data.len() {
            let (end, next) = match next_startcode(data, start) {
                Some((pos, sc)) => (pos, pos + sc),
                None => (data.len(), data.len()),
            };
            // Strip trailing zero bytes that belong to the next start code.
            let mut end = end;
            while end > start && data[end - 1] == 0 {
                end -= 1;
            }
            if end > start {
                nalus.push(&data[start..end]);
            }
            start = next;
        }
        return nalus;
    }

    let mut pos = 0usize;
    while pos + nal_length_size <= data.len() {
        let mut size = 0usize;
        for i in 0..nal_length_size {
            size = (size << 8) | data[pos + i] as usize;
        }
        pos += nal_length_size;
        if size == 0 || pos + size > data.len() {
            break;
        }
        nalus.push(&data[pos..pos + size]);
        pos += size;
    }
    nalus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avcc_extradata(nal_length_size_minus_one: u8, sps: &[u8], pps: &[u8]) -> Vec<u8> {
        let mut out = vec![
            1,    // version
            0x42, // profile
            0xc0, // profile compat
            0x1e, // level
            0xfc | nal_length_size_minus_one,
            0xe0 | 1, // one SPS
        ];
        out.extend_from_slice(&(sps.len() as u16).to_be_bytes());
        out.extend_from_slice(sps);
        out.push(1); // one PPS
        out.extend_from_slice(&(pps.len() as u16).to_be_bytes());
        out.extend_from_slice(pps);
        out
    }

    #[test]
    fn test_parse_avcc() {
        let sps = [0x67, 0x42, 0xc0, 0x1e, 0xd9];
        let pps = [0x68, 0xce, 0x3c, 0x80];
        let extradata = avcc_extradata(3, &sps, &pps);

        let avc = AvcConfig::parse(&extradata).unwrap();
        assert_eq!(avc.nal_length_size, 4);
        assert_eq!(avc.sps, sps);
        assert_eq!(avc.pps, pps);
        assert!(!avc.is_annexb());
    }

    #[test]
    fn test_reject_nal_length_size_three() {
        let extradata = avcc_extradata(2, &[0x67, 1], &[0x68, 2]);
        let err = AvcConfig::parse(&extradata).unwrap_err();
        assert!(matches!(err, WhipError::InvalidData(_)));
    }

    #[test]
    fn test_reject_multiple_sps() {
        let mut extradata = avcc_extradata(3, &[0x67, 1], &[0x68, 2]);
        extradata[5] = 0xe0 | 2;
        assert!(AvcConfig::parse(&extradata).is_err());
    }

    #[test]
    fn test_annexb_passthrough() {
        let extradata = [0, 0, 0, 1, 0x67, 0x42, 0, 0, 1, 0x68, 0xce];
        let avc = AvcConfig::parse(&extradata).unwrap();
        assert!(avc.is_annexb());
        assert_eq!(avc.parameter_set_unit(), extradata);
    }

    #[test]
    fn test_reject_garbage() {
        let err = AvcConfig::parse(&[0x65, 0x88, 0x11]).unwrap_err();
        assert!(matches!(err, WhipError::InvalidData(_)));
    }

    #[test]
    fn test_parameter_set_unit_roundtrip() {
        // Parse AVCC and re-emit: 2 * nal_length_size + sps + pps bytes.
        let sps = [0x67, 0x42, 0xc0, 0x1e];
        let pps = [0x68, 0xce, 0x3c];
        let extradata = avcc_extradata(3, &sps, &pps);
        let avc = AvcConfig::parse(&extradata).unwrap();

        let unit = avc.parameter_set_unit();
        assert_eq!(unit.len(), 2 * 4 + sps.len() + pps.len());
        assert_eq!(&unit[..4], &[0, 0, 0, 4]);
        assert_eq!(&unit[4..8], &sps);
        assert_eq!(&unit[8..12], &[0, 0, 0, 3]);
        assert_eq!(&unit[12..], &pps);

        let nalus = split_nal_units(&unit, 4);
        assert_eq!(nalus, vec![&sps[..], &pps[..]]);
    }

    #[test]
    fn test_split_annexb() {
        let au = [0, 0, 0, 1, 0x65, 1, 2, 3, 0, 0, 1, 0x41, 9];
        let nalus = split_nal_units(&au, 0);
        assert_eq!(nalus.len(), 2);
        assert_eq!(nalus[0], &[0x65, 1, 2, 3]);
        assert_eq!(nalus[1], &[0x41, 9]);
    }

    #[test]
    fn test_split_avcc_two_byte_prefix() {
        let au = [0, 3, 0x65, 1, 2, 0, 2, 0x41, 9];
        let nalus = split_nal_units(&au, 2);
        assert_eq!(nalus.len(), 2);
        assert_eq!(nalus[0], &[0x65, 1, 2]);
        assert_eq!(nalus[1], &[0x41, 9]);
    }
}
