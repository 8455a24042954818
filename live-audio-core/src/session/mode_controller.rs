use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{SourceKind, StreamFormat};
use crate::models::config::validate_format;
use crate::models::diagnostics::DeviceOperation;
use crate::models::error::AudioError;
use crate::session::state::{PipelineShared, RecordTarget};
use crate::traits::audio_device::{AudioDevice, AudioTransport};
use crate::traits::record_callback::RecordCallback;

/// Switches the capture data path between passthrough, mixed and silent.
///
/// Every device call happens under the record-group mutex, so Start/Stop
/// sequences from concurrent control calls never interleave. Audio callbacks
/// never take that mutex; they only read the atomic enable flags.
pub(crate) struct MixModeController {
    shared: Arc<PipelineShared>,
    microphone: Arc<dyn AudioDevice>,
    bgm: Arc<dyn AudioDevice>,
    bgm_bypass: Arc<dyn AudioTransport>,
    bgm_queued: Arc<dyn AudioTransport>,
    record_group: Mutex<()>,
}

impl MixModeController {
    pub fn new(
        shared: Arc<PipelineShared>,
        microphone: Arc<dyn AudioDevice>,
        bgm: Arc<dyn AudioDevice>,
        bgm_bypass: Arc<dyn AudioTransport>,
    ) -> Self {
        let bgm_queued: Arc<dyn AudioTransport> = shared.bgm_participant.clone();
        Self {
            shared,
            microphone,
            bgm,
            bgm_bypass,
            bgm_queued,
            record_group: Mutex::new(()),
        }
    }

    fn device(&self, source: SourceKind) -> &Arc<dyn AudioDevice> {
        match source {
            SourceKind::Microphone => &self.microphone,
            SourceKind::BackgroundMusic => &self.bgm,
        }
    }

    pub fn set_audio_enable(&self, microphone_enabled: bool, bgm_enabled: bool) {
        let _group = self.record_group.lock();
        let shared = &self.shared;
        let before = shared.mode();

        // BGM routing changes before the flags do.
        self.route_bgm(microphone_enabled, bgm_enabled);

        shared.microphone.set_enabled(microphone_enabled);
        shared.bgm.set_enabled(bgm_enabled);

        self.apply_source(SourceKind::Microphone, microphone_enabled);
        self.apply_source(SourceKind::BackgroundMusic, bgm_enabled);

        shared.clear_queues();

        let after = shared.mode();
        if before != after {
            log::info!("mix mode {:?} -> {:?}", before, after);
        } else {
            log::debug!("mix mode unchanged ({:?})", after);
        }
    }

    /// Point the BGM device at the mixer queue when the microphone is on, or
    /// at the bypass tap when it is off.
    pub fn route_bgm(&self, microphone_enabled: bool, bgm_enabled: bool) {
        let shared = &self.shared;
        shared.bgm_participant.set_accepting(bgm_enabled && microphone_enabled);
        let route = if microphone_enabled {
            Arc::clone(&self.bgm_queued)
        } else {
            Arc::clone(&self.bgm_bypass)
        };
        let registered = self.bgm.register_audio_callback(Some(route));
        shared.check_device(SourceKind::BackgroundMusic, DeviceOperation::RegisterCallback, registered);
    }

    fn apply_source(&self, source: SourceKind, enabled: bool) {
        if enabled {
            self.ensure_recording(source);
        } else {
            self.stop_recording(source);
        }
    }

    /// InitRecording, SetStereoRecording, StartRecording unless the device is
    /// already recording. Stops at the first failure.
    fn ensure_recording(&self, source: SourceKind) -> bool {
        let device = self.device(source);
        if device.recording() {
            return true;
        }

        let shared = &self.shared;
        let stereo = shared.config.stereo_recording;
        let ok = shared.check_device(source, DeviceOperation::InitRecording, device.init_recording())
            && shared.check_device(
                source,
                DeviceOperation::SetStereoRecording,
                device.set_stereo_recording(stereo),
            )
            && shared.check_device(source, DeviceOperation::StartRecording, device.start_recording());

        if ok {
            log::debug!("{} recording started", source.label());
        }
        ok
    }

    fn stop_recording(&self, source: SourceKind) {
        let device = self.device(source);
        if !device.recording() {
            return;
        }
        if self
            .shared
            .check_device(source, DeviceOperation::StopRecording, device.stop_recording())
        {
            log::debug!("{} recording stopped", source.label());
        }
    }

    /// Install the record consumer and bring up the enabled capture devices.
    pub fn start_audio_record(
        &self,
        callback: Arc<dyn RecordCallback>,
        sample_rate_hz: u32,
        channels: u16,
    ) -> Result<(), AudioError> {
        let format = StreamFormat::new(sample_rate_hz, channels);
        validate_format("record", format).map_err(AudioError::ConfigurationFailed)?;

        let _group = self.record_group.lock();
        let shared = &self.shared;
        shared.record.store(Some(Arc::new(RecordTarget { callback, format })));
        shared.record_adapter.lock().reset();

        for source in [SourceKind::Microphone, SourceKind::BackgroundMusic] {
            if shared.source(source).is_enabled() {
                self.ensure_recording(source);
            }
        }

        log::info!("record path started at {} Hz x {}", sample_rate_hz, channels);
        Ok(())
    }

    /// Detach the record consumer and stop both capture devices.
    pub fn stop_audio_record(&self) {
        let _group = self.record_group.lock();
        let previous = self.shared.record.take();
        self.stop_recording(SourceKind::Microphone);
        self.stop_recording(SourceKind::BackgroundMusic);
        if previous.is_some() {
            log::info!("record path stopped");
        }
    }

    /// Stop both capture devices. Used by pipeline shutdown.
    pub fn stop_all(&self) {
        let _group = self.record_group.lock();
        self.stop_recording(SourceKind::Microphone);
        self.stop_recording(SourceKind::BackgroundMusic);
    }
}
