use std::fmt;

use serde::{Deserialize, Serialize};

use super::audio_models::{MixMode, SourceKind};
use super::error::AudioError;

/// A device-service call the core issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOperation {
    Init,
    Terminate,
    InitRecording,
    StartRecording,
    StopRecording,
    InitPlayout,
    StartPlayout,
    StopPlayout,
    RegisterCallback,
    SetStereoRecording,
    SetStereoPlayout,
    SetRecordingDevice,
    SetPlayoutDevice,
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Terminate => "Terminate",
            Self::InitRecording => "InitRecording",
            Self::StartRecording => "StartRecording",
            Self::StopRecording => "StopRecording",
            Self::InitPlayout => "InitPlayout",
            Self::StartPlayout => "StartPlayout",
            Self::StopPlayout => "StopPlayout",
            Self::RegisterCallback => "RegisterAudioCallback",
            Self::SetStereoRecording => "SetStereoRecording",
            Self::SetStereoPlayout => "SetStereoPlayout",
            Self::SetRecordingDevice => "SetRecordingDevice",
            Self::SetPlayoutDevice => "SetPlayoutDevice",
        };
        f.write_str(name)
    }
}

/// Direction of a resampled stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    Record,
    Playout,
}

/// A failure the core absorbed instead of surfacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    DeviceFailure {
        source: SourceKind,
        operation: DeviceOperation,
        error: AudioError,
    },
    ResampleFailure {
        direction: StreamDirection,
        error: AudioError,
    },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceFailure {
                source,
                operation,
                error,
            } => write!(f, "{} device {} failed: {}", source.label(), operation, error),
            Self::ResampleFailure { direction, error } => {
                write!(f, "{:?} resample failed: {}", direction, error)
            }
        }
    }
}

/// Point-in-time counters for one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    pub session_id: String,
    pub created_at: String,
    pub mode: Option<MixMode>,
    pub microphone_frames: u64,
    pub bgm_frames: u64,
    pub mixer_ticks: u64,
    pub mixed_deliveries: u64,
    pub passthrough_deliveries: u64,
    pub discarded_frames: u64,
    pub queue_evictions: u64,
    pub playout_ticks: u64,
    pub silence_ticks: u64,
    pub resample_failures: u64,
    pub device_failures: u64,
}

impl PipelineDiagnostics {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
