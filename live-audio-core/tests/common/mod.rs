//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use live_audio_core::{
    AudioDevice, AudioError, AudioTransport, CapturedAudio, Clock, DeviceSelector, DiagnosticEvent, DiagnosticsSink,
    PlayoutChunk, PlayoutDelivery, PlayoutRequest, PlayoutSource, RecordCallback, RecordedAudio, StreamFormat,
};
use parking_lot::{Mutex, RwLock};

/// In-memory device service. Records every call and lets the test drive the
/// registered transport as if it were the platform's audio thread.
#[derive(Default)]
pub struct FakeDevice {
    calls: Mutex<Vec<&'static str>>,
    recording: AtomicBool,
    playing: AtomicBool,
    fail_start_recording: AtomicBool,
    transport: RwLock<Option<Arc<dyn AudioTransport>>>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn fail_start_recording(&self, fail: bool) {
        self.fail_start_recording.store(fail, Ordering::SeqCst);
    }

    pub fn has_transport(&self) -> bool {
        self.transport.read().is_some()
    }

    /// Deliver one 10 ms block of `value` in `format`. Returns the mic level
    /// the transport handed back, or `None` when nothing is registered.
    pub fn capture(&self, value: i16, format: StreamFormat, mic_level: u32) -> Option<u32> {
        let samples = vec![value; format.samples_per_10ms()];
        self.capture_samples(&samples, format, mic_level)
    }

    pub fn capture_samples(&self, samples: &[i16], format: StreamFormat, mic_level: u32) -> Option<u32> {
        let transport = self.transport.read().clone()?;
        Some(transport.recorded_data_is_available(&CapturedAudio {
            samples,
            samples_per_channel: samples.len() / format.channels as usize,
            bytes_per_sample: 2,
            channels: format.channels,
            sample_rate_hz: format.sample_rate_hz,
            total_delay_ms: 20,
            clock_drift: 0,
            current_mic_level: mic_level,
            key_pressed: false,
        }))
    }

    /// Pull one render block into a buffer of `buffer_len` samples pre-filled
    /// with `fill`.
    pub fn render(&self, request: PlayoutRequest, buffer_len: usize, fill: i16) -> Option<(Vec<i16>, PlayoutDelivery)> {
        let transport = self.transport.read().clone()?;
        let mut out = vec![fill; buffer_len];
        let delivery = transport.need_more_play_data(&request, &mut out);
        Some((out, delivery))
    }

    fn log(&self, call: &'static str) {
        self.calls.lock().push(call);
    }
}

impl AudioDevice for FakeDevice {
    fn init(&self) -> Result<(), AudioError> {
        self.log("init");
        Ok(())
    }

    fn terminate(&self) -> Result<(), AudioError> {
        self.log("terminate");
        Ok(())
    }

    fn set_recording_device(&self, _device: DeviceSelector) -> Result<(), AudioError> {
        self.log("set_recording_device");
        Ok(())
    }

    fn set_playout_device(&self, _device: DeviceSelector) -> Result<(), AudioError> {
        self.log("set_playout_device");
        Ok(())
    }

    fn init_recording(&self) -> Result<(), AudioError> {
        self.log("init_recording");
        Ok(())
    }

    fn start_recording(&self) -> Result<(), AudioError> {
        self.log("start_recording");
        if self.fail_start_recording.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceFailure("start rejected".into()));
        }
        self.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_recording(&self) -> Result<(), AudioError> {
        self.log("stop_recording");
        self.recording.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn init_playout(&self) -> Result<(), AudioError> {
        self.log("init_playout");
        Ok(())
    }

    fn start_playout(&self) -> Result<(), AudioError> {
        self.log("start_playout");
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_playout(&self) -> Result<(), AudioError> {
        self.log("stop_playout");
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn set_stereo_recording(&self, _enable: bool) -> Result<(), AudioError> {
        self.log("set_stereo_recording");
        Ok(())
    }

    fn set_stereo_playout(&self, _enable: bool) -> Result<(), AudioError> {
        self.log("set_stereo_playout");
        Ok(())
    }

    fn register_audio_callback(&self, callback: Option<Arc<dyn AudioTransport>>) -> Result<(), AudioError> {
        self.log("register_audio_callback");
        *self.transport.write() = callback;
        Ok(())
    }
}

/// Clock the test moves by hand.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(start)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub samples: Vec<i16>,
    pub samples_per_channel: usize,
    pub channels: u16,
    pub sample_rate_hz: u32,
}

/// Record consumer keeping everything it was handed.
#[derive(Default)]
pub struct CollectingRecorder {
    deliveries: Mutex<Vec<Delivery>>,
}

impl CollectingRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.deliveries.lock().len()
    }
}

impl RecordCallback for CollectingRecorder {
    fn on_record_audio(&self, audio: &RecordedAudio<'_>) {
        self.deliveries.lock().push(Delivery {
            samples: audio.samples.to_vec(),
            samples_per_channel: audio.samples_per_channel,
            channels: audio.channels,
            sample_rate_hz: audio.sample_rate_hz,
        });
    }
}

/// Playout producer emitting a constant 10 ms block, or nothing when muted.
pub struct ConstantSource {
    value: i16,
    format: StreamFormat,
    muted: AtomicBool,
}

impl ConstantSource {
    pub fn new(value: i16, format: StreamFormat) -> Arc<Self> {
        Arc::new(Self {
            value,
            format,
            muted: AtomicBool::new(false),
        })
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }
}

impl PlayoutSource for ConstantSource {
    fn on_need_play_audio(&self, buffer: &mut [i16]) -> PlayoutChunk {
        if self.muted.load(Ordering::SeqCst) {
            return PlayoutChunk::empty();
        }
        let count = self.format.samples_per_10ms().min(buffer.len());
        buffer[..count].fill(self.value);
        PlayoutChunk {
            samples: count,
            sample_rate_hz: self.format.sample_rate_hz,
            channels: self.format.channels,
        }
    }
}

/// Diagnostics sink keeping every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn report(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}
