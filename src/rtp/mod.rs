//! RTP packetization.
//!
//! One packetizer per stream turns encoded access units into RTP packets
//! with the session's payload type and SSRC. Sequence numbers are strictly
//! monotonic per stream and every packet of an access unit shares its
//! timestamp; the initial sequence number and the timestamp offset are
//! randomized per RFC 3550.

pub mod h264;
pub mod opus;

pub use h264::H264Packetizer;
pub use opus::OpusPacketizer;

use byteorder::{BigEndian, WriteBytesExt};
use rand::Rng;

/// Fixed RTP header size: V/P/X/CC (1) + M/PT (1) + seq (2) + ts (4) + SSRC (4).
pub const RTP_HEADER_SIZE: usize = 12;

/// Sequence, timestamp and identity state shared by the packetizers.
#[derive(Debug)]
pub struct RtpStream {
    payload_type: u8,
    ssrc: u32,
    sequence: u16,
    timestamp_offset: u32,
}

impl RtpStream {
    /// Create a stream with a random initial sequence and timestamp offset.
    pub fn new<R: Rng>(rng: &mut R, payload_type: u8, ssrc: u32) -> Self {
        Self {
            payload_type,
            ssrc,
            sequence: rng.gen::<u16>() & 0x0fff,
            timestamp_offset: rng.gen::<u32>(),
        }
    }

    /// The next sequence number, for tests and diagnostics.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    /// Start a packet: write the 12-byte header and return the buffer.
    ///
    /// `media_timestamp` is in the stream clock (90 kHz video, 48 kHz audio);
    /// the random offset is added here.
    fn begin_packet(&mut self, marker: bool, media_timestamp: u32, capacity: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RTP_HEADER_SIZE + capacity);
        buf.push(0x80); // V=2, no padding, no extension, no CSRC
        buf.push(self.payload_type | if marker { 0x80 } else { 0 });
        buf.write_u16::<BigEndian>(self.sequence).unwrap();
        buf.write_u32::<BigEndian>(self.timestamp_offset.wrapping_add(media_timestamp))
            .unwrap();
        buf.write_u32::<BigEndian>(self.ssrc).unwrap();
        self.sequence = self.sequence.wrapping_add(1);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_header_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut stream = RtpStream::new(&mut rng, 106, 0xAABBCCDD);
        let seq = stream.sequence();
        let pkt = stream.begin_packet(true, 1000, 0);

        assert_eq!(pkt.len(), RTP_HEADER_SIZE);
        assert_eq!(pkt[0], 0x80);
        assert_eq!(pkt[1], 0x80 | 106);
        assert_eq!(u16::from_be_bytes([pkt[2], pkt[3]]), seq);
        assert_eq!(
            u32::from_be_bytes([pkt[8], pkt[9], pkt[10], pkt[11]]),
            0xAABBCCDD
        );
        assert_eq!(stream.sequence(), seq.wrapping_add(1));
    }

    #[test]
    fn test_timestamp_offset_applied() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut stream = RtpStream::new(&mut rng, 111, 1);
        let a = stream.begin_packet(false, 0, 0);
        let b = stream.begin_packet(false, 960, 0);
        let ts_a = u32::from_be_bytes([a[4], a[5], a[6], a[7]]);
        let ts_b = u32::from_be_bytes([b[4], b[5], b[6], b[7]]);
        assert_eq!(ts_b.wrapping_sub(ts_a), 960);
    }
}
