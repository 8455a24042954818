use serde::{Deserialize, Serialize};

use crate::BLOCKS_PER_SECOND;

/// One of the two capture sources the core arbitrates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Microphone,
    #[serde(rename = "bgm")]
    BackgroundMusic,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::BackgroundMusic => "bgm",
        }
    }
}

/// Data path selected by the current enable flags.
///
/// Never stored: always derived from the two per-source `enabled` flags so it
/// cannot drift from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    MicOnly,
    BgmOnly,
    Mixed,
    None,
}

impl MixMode {
    pub fn from_flags(microphone_enabled: bool, bgm_enabled: bool) -> Self {
        match (microphone_enabled, bgm_enabled) {
            (true, true) => Self::Mixed,
            (true, false) => Self::MicOnly,
            (false, true) => Self::BgmOnly,
            (false, false) => Self::None,
        }
    }

    /// Whether frames go through the frame queues and the mixer.
    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Mixed)
    }

    /// Whether `source` is delivered downstream without mixing in this mode.
    pub fn is_passthrough_for(&self, source: SourceKind) -> bool {
        matches!(
            (self, source),
            (Self::MicOnly, SourceKind::Microphone) | (Self::BgmOnly, SourceKind::BackgroundMusic)
        )
    }
}

/// Voice-activity tag carried by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VadActivity {
    Active,
    Passive,
    #[default]
    Unknown,
}

/// Sample rate and channel count of an interleaved i16 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl StreamFormat {
    pub const fn new(sample_rate_hz: u32, channels: u16) -> Self {
        Self {
            sample_rate_hz,
            channels,
        }
    }

    pub fn samples_per_channel_10ms(&self) -> usize {
        (self.sample_rate_hz / BLOCKS_PER_SECOND) as usize
    }

    /// Interleaved samples in one 10 ms block.
    pub fn samples_per_10ms(&self) -> usize {
        self.samples_per_channel_10ms() * self.channels as usize
    }
}

/// One block of PCM owned by exactly one queue or consumer at a time.
///
/// Deliberately not `Clone`: a frame moves from the capture callback into a
/// queue and from the queue into the mixer.
#[derive(Debug, PartialEq, Eq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub samples_per_channel: usize,
    pub channels: u16,
    pub sample_rate_hz: u32,
    pub vad: VadActivity,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, channels: u16, sample_rate_hz: u32, vad: VadActivity) -> Self {
        let samples_per_channel = if channels == 0 {
            0
        } else {
            samples.len() / channels as usize
        };
        Self {
            samples,
            samples_per_channel,
            channels,
            sample_rate_hz,
            vad,
        }
    }

    /// Copy a device delivery into an owned frame.
    pub fn from_captured(audio: &CapturedAudio<'_>) -> Self {
        let total = (audio.samples_per_channel * audio.channels as usize).min(audio.samples.len());
        Self {
            samples: audio.samples[..total].to_vec(),
            samples_per_channel: audio.samples_per_channel,
            channels: audio.channels,
            sample_rate_hz: audio.sample_rate_hz,
            vad: VadActivity::Active,
        }
    }

    /// 10 ms of silence in `format`.
    pub fn silence(format: StreamFormat) -> Self {
        Self::new(
            vec![0; format.samples_per_10ms()],
            format.channels,
            format.sample_rate_hz,
            VadActivity::Passive,
        )
    }

    pub fn format(&self) -> StreamFormat {
        StreamFormat::new(self.sample_rate_hz, self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A single delivery from a capture device, borrowed for the callback's duration.
#[derive(Debug, Clone, Copy)]
pub struct CapturedAudio<'a> {
    /// Interleaved samples.
    pub samples: &'a [i16],
    pub samples_per_channel: usize,
    pub bytes_per_sample: usize,
    pub channels: u16,
    pub sample_rate_hz: u32,
    pub total_delay_ms: u32,
    pub clock_drift: i32,
    pub current_mic_level: u32,
    pub key_pressed: bool,
}

impl CapturedAudio<'_> {
    pub fn format(&self) -> StreamFormat {
        StreamFormat::new(self.sample_rate_hz, self.channels)
    }
}

/// Audio handed to the downstream record consumer.
#[derive(Debug, Clone, Copy)]
pub struct RecordedAudio<'a> {
    pub samples: &'a [i16],
    pub samples_per_channel: usize,
    pub bytes_per_sample: usize,
    pub channels: u16,
    pub sample_rate_hz: u32,
    pub total_delay_ms: u32,
}

/// What the render device asks for on each pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayoutRequest {
    pub samples_per_channel: usize,
    pub bytes_per_sample: usize,
    pub channels: u16,
    pub sample_rate_hz: u32,
}

impl PlayoutRequest {
    pub fn format(&self) -> StreamFormat {
        StreamFormat::new(self.sample_rate_hz, self.channels)
    }

    pub fn total_samples(&self) -> usize {
        self.samples_per_channel * self.channels as usize
    }
}

/// What the core wrote into the render buffer.
///
/// The timing fields are always zero: rendered audio is never time-stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayoutDelivery {
    pub samples_per_channel: usize,
    pub elapsed_time_ms: i64,
    pub ntp_time_ms: i64,
}

/// One pull from the downstream playout producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayoutChunk {
    /// Interleaved samples written; zero means nothing this tick.
    pub samples: usize,
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl PlayoutChunk {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn format(&self) -> StreamFormat {
        StreamFormat::new(self.sample_rate_hz, self.channels)
    }
}

/// Which physical endpoint a device service should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSelector {
    Default,
    #[default]
    DefaultCommunication,
    Index(u16),
}
