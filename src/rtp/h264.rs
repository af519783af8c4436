//! H.264 RTP payloadization (RFC 6184, packetization-mode 1).
//!
//! Small NAL units of an access unit are aggregated into STAP-A packets,
//! anything that does not fit the payload budget is fragmented with FU-A.
//! The input access unit may be annex-B (start codes) or AVCC
//! (length-prefixed); the marker bit is set on the last packet of the unit.

use super::RtpStream;
use crate::avc::split_nal_units;
use rand::Rng;

/// STAP-A NAL unit type.
pub const NAL_TYPE_STAP_A: u8 = 24;

/// FU-A NAL unit type.
pub const NAL_TYPE_FU_A: u8 = 28;

/// H.264 packetizer for one video stream.
#[derive(Debug)]
pub struct H264Packetizer {
    stream: RtpStream,
    /// Payload budget per packet (MTU minus RTP header and SRTP reserve).
    max_payload: usize,
    /// AVCC length-prefix size, 0 for annex-B input.
    nal_length_size: usize,
}

impl H264Packetizer {
    pub fn new<R: Rng>(
        rng: &mut R,
        payload_type: u8,
        ssrc: u32,
        max_rtp_size: usize,
        nal_length_size: usize,
    ) -> Self {
        Self {
            stream: RtpStream::new(rng, payload_type, ssrc),
            max_payload: max_rtp_size.saturating_sub(super::RTP_HEADER_SIZE),
            nal_length_size,
        }
    }

    /// Packetize one access unit. All packets share `timestamp` (90 kHz) and
    /// the last one carries the marker bit.
    pub fn packetize(&mut self, access_unit: &[u8], timestamp: u32) -> Vec<Vec<u8>> {
        let nalus = split_nal_units(access_unit, self.nal_length_size);
        let mut packets = Vec::new();
        let mut pending: Vec<&[u8]> = Vec::new();
        let mut pending_size = 0usize; // sum of 2-byte lengths + NAL bytes

        for nalu in nalus {
            if nalu.is_empty() {
                continue;
            }

            if nalu.len() <= self.max_payload {
                // Would this NAL overflow the aggregate? 1 byte STAP-A header
                // plus a 2-byte size per NAL.
                if !pending.is_empty() && 1 + pending_size + 2 + nalu.len() > self.max_payload {
                    self.flush_aggregate(&mut packets, &mut pending, timestamp);
                    pending_size = 0;
                }
                pending_size += 2 + nalu.len();
                pending.push(nalu);
            } else {
                self.flush_aggregate(&mut packets, &mut pending, timestamp);
                pending_size = 0;
                self.fragment_fu_a(&mut packets, nalu, timestamp);
            }
        }
        self.flush_aggregate(&mut packets, &mut pending, timestamp);

        if let Some(last) = packets.last_mut() {
            last[1] |= 0x80;
        }
        packets
    }

    /// Emit the buffered NALs: a single-NAL packet for one, STAP-A otherwise.
    fn flush_aggregate(
        &mut self,
        packets: &mut Vec<Vec<u8>>,
        pending: &mut Vec<&[u8]>,
        timestamp: u32,
    ) {
        match pending.len() {
            0 => {}
            1 => {
                let nalu = pending[0];
                let mut pkt = self.stream.begin_packet(false, timestamp, nalu.len());
                pkt.extend_from_slice(nalu);
                packets.push(pkt);
            }
            _ => {
                let total: usize = 1 + pending.iter().map(|n| 2 + n.len()).sum::<usize>();
                let mut pkt = self.stream.begin_packet(false, timestamp, total);
                // STAP-A header carries the highest NRI of the members.
                let mut header = NAL_TYPE_STAP_A;
                for nalu in pending.iter() {
                    header |= nalu[0] & 0x60;
                }
                pkt.push(header);
                for nalu in pending.iter() {
                    pkt.extend_from_slice(&(nalu.len() as u16).to_be_bytes());
                    pkt.extend_from_slice(nalu);
                }
                packets.push(pkt);
            }
        }
        pending.clear();
    }

    /// Fragment one oversized NAL into FU-A packets.
    fn fragment_fu_a(&mut self, packets: &mut Vec<Vec<u8>>, nalu: &[u8], timestamp: u32) {
        let indicator = (nalu[0] & 0xE0) | NAL_TYPE_FU_A;
        let nal_type = nalu[0] & 0x1F;
        let budget = self.max_payload.saturating_sub(2);
        if budget == 0 {
            tracing::warn!(len = nalu.len(), "payload budget too small, dropping NAL");
            return;
        }

        let body = &nalu[1..];
        let mut offset = 0usize;
        while offset < body.len() {
            let take = (body.len() - offset).min(budget);
            let start = offset == 0;
            let end = offset + take == body.len();

            let mut pkt = self.stream.begin_packet(false, timestamp, 2 + take);
            pkt.push(indicator);
            pkt.push(nal_type | if start { 0x80 } else { 0 } | if end { 0x40 } else { 0 });
            pkt.extend_from_slice(&body[offset..offset + take]);
            packets.push(pkt);
            offset += take;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn packetizer(max_rtp_size: usize) -> H264Packetizer {
        H264Packetizer::new(&mut StdRng::seed_from_u64(3), 106, 0x1234, max_rtp_size, 0)
    }

    fn annexb(nalus: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for n in nalus {
            out.extend_from_slice(&[0, 0, 0, 1]);
            out.extend_from_slice(n);
        }
        out
    }

    #[test]
    fn test_small_nalus_aggregate_to_stap_a() {
        let mut p = packetizer(1184);
        let sps = [0x67, 0x42, 0xc0, 0x1e];
        let pps = [0x68, 0xce, 0x3c, 0x80];
        let au = annexb(&[&sps, &pps]);

        let packets = p.packetize(&au, 9000);
        assert_eq!(packets.len(), 1);
        let payload = &packets[0][12..];
        assert_eq!(payload[0] & 0x1F, NAL_TYPE_STAP_A);
        // NRI lifted from the members (0x40 from 0x67/0x68).
        assert_eq!(payload[0] & 0x60, 0x40);
        assert_eq!(&payload[1..3], &[0, 4]);
        assert_eq!(&payload[3..7], &sps);
        assert_eq!(&payload[7..9], &[0, 4]);
        assert_eq!(&payload[9..], &pps);
    }

    #[test]
    fn test_single_nal_packet() {
        let mut p = packetizer(1184);
        let idr = [0x65, 1, 2, 3, 4];
        let packets = p.packetize(&annexb(&[&idr]), 0);
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0][12..], &idr);
        // Marker set on the last packet of the access unit.
        assert_eq!(packets[0][1] & 0x80, 0x80);
    }

    #[test]
    fn test_large_nal_fragments_to_fu_a() {
        // max_rtp_size 32 -> payload 20 -> FU body budget 18.
        let mut p = packetizer(32);
        let mut idr = vec![0x65];
        idr.extend((0..50).map(|i| i as u8));
        let packets = p.packetize(&annexb(&[&idr]), 0);

        assert_eq!(packets.len(), 3); // 50 bytes / 18
        for (i, pkt) in packets.iter().enumerate() {
            let payload = &pkt[12..];
            assert!(payload.len() <= 20);
            assert_eq!(payload[0] & 0x1F, NAL_TYPE_FU_A);
            assert_eq!(payload[0] & 0x60, 0x65 & 0x60);
            let fu_header = payload[1];
            assert_eq!(fu_header & 0x1F, 5); // original type
            assert_eq!(fu_header & 0x80 != 0, i == 0); // start
            assert_eq!(fu_header & 0x40 != 0, i == packets.len() - 1); // end
        }
        // Only the last packet has the marker.
        assert_eq!(packets[0][1] & 0x80, 0);
        assert_eq!(packets[2][1] & 0x80, 0x80);
        // Reassembly matches the original NAL body.
        let body: Vec<u8> = packets.iter().flat_map(|p| p[14..].to_vec()).collect();
        assert_eq!(body, idr[1..]);
    }

    #[test]
    fn test_mixed_unit_aggregates_then_fragments() {
        let mut p = packetizer(40);
        let sps = [0x67, 1];
        let pps = [0x68, 2];
        let mut idr = vec![0x65];
        idr.extend((0..64).map(|i| i as u8));
        let au = annexb(&[&sps, &pps, &idr]);

        let packets = p.packetize(&au, 0);
        // First packet: STAP-A with SPS+PPS, then FU-A fragments.
        assert_eq!(packets[0][12] & 0x1F, NAL_TYPE_STAP_A);
        assert!(packets.len() > 2);
        for pkt in &packets[1..] {
            assert_eq!(pkt[12] & 0x1F, NAL_TYPE_FU_A);
        }
    }

    #[test]
    fn test_avcc_input() {
        let mut p = H264Packetizer::new(&mut StdRng::seed_from_u64(4), 106, 1, 1184, 4);
        let nal = [0x41, 9, 9, 9];
        let mut au = (nal.len() as u32).to_be_bytes().to_vec();
        au.extend_from_slice(&nal);
        let packets = p.packetize(&au, 0);
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0][12..], &nal);
    }

    #[test]
    fn test_sequence_is_monotonic_across_units() {
        let mut p = packetizer(1184);
        let a = p.packetize(&annexb(&[&[0x65, 1]]), 0);
        let b = p.packetize(&annexb(&[&[0x41, 2]]), 3000);
        let seq_a = u16::from_be_bytes([a[0][2], a[0][3]]);
        let seq_b = u16::from_be_bytes([b[0][2], b[0][3]]);
        assert_eq!(seq_b, seq_a.wrapping_add(1));
    }
}
