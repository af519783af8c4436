//! Codec parameter validation.
//!
//! The publisher accepts exactly one H.264 video stream (baseline or
//! constrained baseline, no B-frames) and one stereo 48 kHz Opus audio
//! stream. Anything else is rejected at init.

use crate::avc::AvcConfig;
use crate::error::{Result, WhipError};

/// H.264 constrained-profile flag, OR'd into the profile value.
pub const H264_PROFILE_CONSTRAINED: u16 = 1 << 9;

/// H.264 baseline profile_idc.
pub const H264_PROFILE_BASELINE: u16 = 66;

/// Fallback profile byte when the encoder did not report one.
pub const H264_DEFAULT_PROFILE: u16 = 0x42;

/// Fallback level (3.0) when the encoder did not report one.
pub const H264_DEFAULT_LEVEL: u8 = 30;

/// Parameters of the H.264 video stream to publish.
#[derive(Debug, Clone)]
pub struct VideoParams {
    /// H.264 profile_idc, possibly OR'd with [`H264_PROFILE_CONSTRAINED`].
    /// `None` falls back to baseline (0x42) in the SDP.
    pub profile: Option<u16>,
    /// H.264 level_idc (e.g. 30 for 3.0). `None` falls back to 30.
    pub level: Option<u8>,
    /// Codec extradata: AVCC record or annex-B SPS/PPS.
    pub extradata: Vec<u8>,
    /// Number of reorder frames; anything above zero means B-frames.
    pub video_delay: u32,
}

/// Parameters of the Opus audio stream to publish.
#[derive(Debug, Clone)]
pub struct AudioParams {
    /// Sample rate; must be 48000.
    pub sample_rate: u32,
    /// Channel count; must be 2.
    pub channels: u8,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
        }
    }
}

/// Validated video stream state carried by the session.
#[derive(Debug, Clone)]
pub struct VideoStream {
    pub profile: u16,
    pub level: u8,
    pub avc: AvcConfig,
}

/// Validated audio stream state carried by the session.
#[derive(Debug, Clone)]
pub struct AudioStream {
    pub sample_rate: u32,
    pub channels: u8,
}

/// Check the video parameters and parse the extradata.
pub fn parse_video(par: &VideoParams) -> Result<VideoStream> {
    if par.video_delay > 0 {
        return Err(WhipError::Unsupported("B-frames are not supported".into()));
    }

    if let Some(profile) = par.profile {
        if profile & !H264_PROFILE_CONSTRAINED != H264_PROFILE_BASELINE {
            return Err(WhipError::Unsupported(format!(
                "H.264 profile {profile} is not baseline"
            )));
        }
    }

    let avc = AvcConfig::parse(&par.extradata)?;

    Ok(VideoStream {
        profile: par.profile.unwrap_or(H264_DEFAULT_PROFILE),
        level: par.level.unwrap_or(H264_DEFAULT_LEVEL),
        avc,
    })
}

/// Check the audio parameters.
pub fn parse_audio(par: &AudioParams) -> Result<AudioStream> {
    if par.channels != 2 {
        return Err(WhipError::Unsupported(format!(
            "audio channels {} not supported, choose stereo",
            par.channels
        )));
    }
    if par.sample_rate != 48000 {
        return Err(WhipError::Unsupported(format!(
            "audio sample rate {} not supported, choose 48000",
            par.sample_rate
        )));
    }
    Ok(AudioStream {
        sample_rate: par.sample_rate,
        channels: par.channels,
    })
}
