//! Encoded media packets handed to the publisher.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Flags for packet properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u32 {
        /// This packet contains a keyframe (IDR for H.264).
        const KEYFRAME = 0x0001;
        /// Packet data is corrupted and should not be sent.
        const CORRUPT = 0x0002;
    }
}

/// The stream a packet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A rational time base for packet timestamps, e.g. 1/90000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBase {
    pub num: u32,
    pub den: u32,
}

impl TimeBase {
    /// Standard 90 kHz video clock (1/90000).
    pub const VIDEO_90KHZ: Self = Self { num: 1, den: 90000 };

    /// 48 kHz audio clock (1/48000).
    pub const AUDIO_48KHZ: Self = Self { num: 1, den: 48000 };

    /// Create a new time base from numerator and denominator.
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Rescale `value` from this time base to `target`, rounding to nearest.
    pub fn convert(&self, value: i64, target: TimeBase) -> i64 {
        if self == &target {
            return value;
        }
        let num = self.num as i128 * target.den as i128;
        let den = self.den as i128 * target.num as i128;
        if den == 0 {
            return 0;
        }
        let scaled = value as i128 * num;
        let half = den.abs() / 2;
        let rounded = if scaled >= 0 { scaled + half } else { scaled - half };
        (rounded / den) as i64
    }
}

/// An encoded media packet.
///
/// The publisher borrows the payload; ownership stays with the encoder side.
#[derive(Clone)]
pub struct MediaPacket<'a> {
    /// The encoded payload. H.264 in annex-B or AVCC form, or one Opus frame.
    pub data: &'a [u8],
    /// Which stream the packet belongs to.
    pub kind: MediaKind,
    /// Presentation timestamp in `time_base` units.
    pub pts: i64,
    /// The time base for `pts`.
    pub time_base: TimeBase,
    /// Packet flags.
    pub flags: PacketFlags,
}

impl<'a> MediaPacket<'a> {
    /// Create a video packet.
    pub fn video(data: &'a [u8], pts: i64, time_base: TimeBase, keyframe: bool) -> Self {
        let mut flags = PacketFlags::empty();
        if keyframe {
            flags.insert(PacketFlags::KEYFRAME);
        }
        Self {
            data,
            kind: MediaKind::Video,
            pts,
            time_base,
            flags,
        }
    }

    /// Create an audio packet.
    pub fn audio(data: &'a [u8], pts: i64, time_base: TimeBase) -> Self {
        Self {
            data,
            kind: MediaKind::Audio,
            pts,
            time_base,
            flags: PacketFlags::empty(),
        }
    }

    /// Check if this is a keyframe packet.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEYFRAME)
    }

    /// The packet size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for MediaPacket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPacket")
            .field("kind", &self.kind)
            .field("size", &self.data.len())
            .field("pts", &self.pts)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_to_video_clock() {
        // 1/1000 (milliseconds) to 1/90000: 40 ms -> 3600 ticks.
        let ms = TimeBase::new(1, 1000);
        assert_eq!(ms.convert(40, TimeBase::VIDEO_90KHZ), 3600);
    }

    #[test]
    fn test_rescale_identity() {
        let tb = TimeBase::AUDIO_48KHZ;
        assert_eq!(tb.convert(960, tb), 960);
    }

    #[test]
    fn test_rescale_rounds_to_nearest() {
        // 1/3 s in 1/1000 -> 333.33 in 1/1000? Use 1 tick of 1/3 to 1/1000.
        let third = TimeBase::new(1, 3);
        assert_eq!(third.convert(1, TimeBase::new(1, 1000)), 333);
        assert_eq!(third.convert(2, TimeBase::new(1, 1000)), 667);
    }

    #[test]
    fn test_keyframe_flag() {
        let data = [0u8; 4];
        let pkt = MediaPacket::video(&data, 0, TimeBase::VIDEO_90KHZ, true);
        assert!(pkt.is_keyframe());
        let pkt = MediaPacket::audio(&data, 0, TimeBase::AUDIO_48KHZ);
        assert!(!pkt.is_keyframe());
    }
}
