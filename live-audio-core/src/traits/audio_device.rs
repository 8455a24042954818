use std::sync::Arc;

use crate::models::audio_models::{CapturedAudio, DeviceSelector, PlayoutDelivery, PlayoutRequest};
use crate::models::error::AudioError;

/// Real-time callbacks a device service invokes on its own threads.
///
/// Both methods run on hard real-time threads and must return well within
/// one 10 ms period.
pub trait AudioTransport: Send + Sync {
    /// A capture device delivered one block. Returns the mic level to feed
    /// back to hardware AGC.
    fn recorded_data_is_available(&self, audio: &CapturedAudio<'_>) -> u32;

    /// A render device needs one block written into `out`.
    ///
    /// Transports that only receive capture audio answer with silence.
    fn need_more_play_data(&self, request: &PlayoutRequest, out: &mut [i16]) -> PlayoutDelivery {
        let total = request.total_samples().min(out.len());
        out[..total].fill(0);
        PlayoutDelivery {
            samples_per_channel: request.samples_per_channel,
            ..Default::default()
        }
    }
}

/// Platform capture/render device service.
///
/// Implemented outside this crate (WASAPI, Core Audio, ALSA, a file-backed
/// test device...). Every call may block; the core only issues them from
/// configuration call sites, never from inside an `AudioTransport` callback.
pub trait AudioDevice: Send + Sync {
    fn init(&self) -> Result<(), AudioError>;
    fn terminate(&self) -> Result<(), AudioError>;

    fn set_recording_device(&self, device: DeviceSelector) -> Result<(), AudioError>;
    fn set_playout_device(&self, device: DeviceSelector) -> Result<(), AudioError>;

    fn init_recording(&self) -> Result<(), AudioError>;
    fn start_recording(&self) -> Result<(), AudioError>;
    fn stop_recording(&self) -> Result<(), AudioError>;
    fn recording(&self) -> bool;

    fn init_playout(&self) -> Result<(), AudioError>;
    fn start_playout(&self) -> Result<(), AudioError>;
    fn stop_playout(&self) -> Result<(), AudioError>;
    fn playing(&self) -> bool;

    fn set_stereo_recording(&self, enable: bool) -> Result<(), AudioError>;
    fn set_stereo_playout(&self, enable: bool) -> Result<(), AudioError>;

    /// Replace the transport receiving this device's callbacks. `None`
    /// detaches: the device keeps running but its audio goes nowhere.
    fn register_audio_callback(&self, callback: Option<Arc<dyn AudioTransport>>) -> Result<(), AudioError>;
}
