use thiserror::Error;

/// Errors produced by the audio core and by the device services it drives.
///
/// Only `ConfigurationFailed` ever crosses the public pipeline API. Everything
/// else is swallowed on the data path and reported to the diagnostics sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("device not available")]
    DeviceNotAvailable,

    #[error("device operation failed: {0}")]
    DeviceFailure(String),

    #[error("resample produced no output ({from_hz} Hz/{from_channels}ch -> {to_hz} Hz/{to_channels}ch)")]
    ResampleFailure {
        from_hz: u32,
        from_channels: u16,
        to_hz: u32,
        to_channels: u16,
    },

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
