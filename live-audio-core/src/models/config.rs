use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::{DeviceSelector, StreamFormat};
use super::error::AudioError;
use crate::{BLOCKS_PER_SECOND, FRAME_QUEUE_CAPACITY, LIVENESS_TIMEOUT_SECS, MAX_BLOCK_SAMPLES};

/// Upper bound for `queue_capacity` (10 s of 10 ms frames).
pub const MAX_QUEUE_CAPACITY: usize = 1000;

/// Upper bound for `housekeeping_interval_ms`.
pub const MAX_HOUSEKEEPING_INTERVAL_MS: u64 = 1000;

/// Configuration for an `AudioPipeline`.
///
/// Every field has a default, so a partial JSON document is enough:
/// ```json
/// { "liveness_timeout_secs": 3, "bgm_enabled": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfiguration {
    /// Output format of the built-in mixer.
    pub mix_format: StreamFormat,

    /// Frames buffered per source in mixed mode (default: 30).
    pub queue_capacity: usize,

    /// Seconds without a delivery before the microphone path counts as stalled.
    pub liveness_timeout_secs: i64,

    /// Period of the housekeeping thread, in milliseconds.
    pub housekeeping_interval_ms: u64,

    pub stereo_recording: bool,
    pub stereo_playout: bool,

    pub recording_device: DeviceSelector,
    pub playout_device: DeviceSelector,

    /// Initial microphone enable flag.
    pub microphone_enabled: bool,

    /// Initial background-music enable flag.
    pub bgm_enabled: bool,
}

impl PipelineConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        validate_format("mix", self.mix_format)?;
        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.queue_capacity) {
            return Err(format!(
                "queue capacity must be between 1 and {} frames, got {}",
                MAX_QUEUE_CAPACITY, self.queue_capacity
            ));
        }
        if self.liveness_timeout_secs <= 0 {
            return Err("liveness timeout must be positive".into());
        }
        if !(1..=MAX_HOUSEKEEPING_INTERVAL_MS).contains(&self.housekeeping_interval_ms) {
            return Err(format!(
                "housekeeping interval must be between 1 and {} ms, got {}",
                MAX_HOUSEKEEPING_INTERVAL_MS, self.housekeeping_interval_ms
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, AudioError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AudioError::ConfigurationFailed(format!("invalid configuration: {}", e)))?;
        config.validate().map_err(AudioError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_millis(self.housekeeping_interval_ms)
    }
}

/// Check that a stream format is something the 10 ms block machinery can carry.
pub fn validate_format(label: &str, format: StreamFormat) -> Result<(), String> {
    if ![1, 2].contains(&format.channels) {
        return Err(format!("unsupported {} channel count: {}", label, format.channels));
    }
    if format.sample_rate_hz < 8000 || format.sample_rate_hz % BLOCKS_PER_SECOND != 0 {
        return Err(format!("unsupported {} sample rate: {}", label, format.sample_rate_hz));
    }
    if format.samples_per_10ms() > MAX_BLOCK_SAMPLES {
        return Err(format!(
            "{} block of {} samples exceeds the {} sample limit",
            label,
            format.samples_per_10ms(),
            MAX_BLOCK_SAMPLES
        ));
    }
    Ok(())
}

impl Default for PipelineConfiguration {
    fn default() -> Self {
        Self {
            mix_format: StreamFormat::new(48000, 2),
            queue_capacity: FRAME_QUEUE_CAPACITY,
            liveness_timeout_secs: LIVENESS_TIMEOUT_SECS,
            housekeeping_interval_ms: 10,
            stereo_recording: true,
            stereo_playout: true,
            recording_device: DeviceSelector::DefaultCommunication,
            playout_device: DeviceSelector::DefaultCommunication,
            microphone_enabled: true,
            bgm_enabled: true,
        }
    }
}
