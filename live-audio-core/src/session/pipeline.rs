use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::audio_models::{MixMode, SourceKind};
use crate::models::config::PipelineConfiguration;
use crate::models::diagnostics::{DeviceOperation, PipelineDiagnostics};
use crate::models::error::AudioError;
use crate::processing::frame_mixer::FrameMixer;
use crate::processing::frame_queue::QueueParticipant;
use crate::processing::handler_slot::HandlerSlot;
use crate::processing::linear_resampler::LinearResampler;
use crate::processing::resample_adapter::ResampleAdapter;
use crate::session::capture_path::{CaptureTap, MixedOutput};
use crate::session::liveness::LivenessMonitor;
use crate::session::mode_controller::MixModeController;
use crate::session::render_path::{DuplexTransport, RenderSource};
use crate::session::state::{PipelineCounters, PipelineShared, SourceState};
use crate::traits::audio_device::{AudioDevice, AudioTransport};
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::diagnostics_sink::{DiagnosticsSink, LogDiagnostics};
use crate::traits::mixer::MixerEngine;
use crate::traits::pipeline_delegate::PipelineDelegate;
use crate::traits::record_callback::{PlayoutSource, RecordCallback};
use crate::traits::resampler::ResamplerFactory;

/// Replaceable collaborators of an `AudioPipeline`.
///
/// `Default` gives the built-in `FrameMixer`, `SystemClock`, `LogDiagnostics`
/// and `LinearResampler`.
pub struct PipelineComponents {
    /// `None` builds a `FrameMixer` at the configured mix format.
    pub mixer: Option<Arc<dyn MixerEngine>>,
    pub clock: Arc<dyn Clock>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
    pub resampler_factory: ResamplerFactory,
}

impl Default for PipelineComponents {
    fn default() -> Self {
        Self {
            mixer: None,
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(LogDiagnostics),
            resampler_factory: LinearResampler::factory(),
        }
    }
}

/// Dual-source capture and playback pipeline.
///
/// Owns both capture devices, the per-source queues, the mixer, the record
/// and playout handler slots, both resample adapters and the housekeeping
/// thread. Built explicitly by the application and shared by handle; all
/// methods take `&self`.
///
/// ```text
/// [Mic device] → CaptureTap ─┬─ mixed ──→ [Mic queue] ─┐
///                            │                          ├→ mixer tick → RecordCallback
/// [BGM device] ──────────────┼─ mixed ──→ [BGM queue] ─┘
///      └──→ CaptureTap (bypass)
///                            └─ passthrough → ResampleAdapter → RecordCallback
///
/// PlayoutSource → ResampleAdapter → [Mic device render]
/// ```
pub struct AudioPipeline {
    shared: Arc<PipelineShared>,
    controller: MixModeController,
    microphone: Arc<dyn AudioDevice>,
    bgm: Arc<dyn AudioDevice>,
    track_group: Mutex<()>,
    delegate: Arc<HandlerSlot<dyn PipelineDelegate>>,
    housekeeping_running: Arc<AtomicBool>,
    housekeeping_handle: Mutex<Option<thread::JoinHandle<()>>>,
    shut_down: AtomicBool,
    session_id: Uuid,
    created_at: DateTime<Utc>,
}

impl AudioPipeline {
    /// Build a pipeline with the default components.
    pub fn new(
        microphone: Arc<dyn AudioDevice>,
        bgm: Arc<dyn AudioDevice>,
        config: PipelineConfiguration,
    ) -> Result<Self, AudioError> {
        Self::with_components(microphone, bgm, config, PipelineComponents::default())
    }

    pub fn with_components(
        microphone: Arc<dyn AudioDevice>,
        bgm: Arc<dyn AudioDevice>,
        config: PipelineConfiguration,
        components: PipelineComponents,
    ) -> Result<Self, AudioError> {
        config.validate().map_err(AudioError::ConfigurationFailed)?;

        let PipelineComponents {
            mixer,
            clock,
            diagnostics,
            resampler_factory,
        } = components;

        let mixer = mixer.unwrap_or_else(|| {
            Arc::new(FrameMixer::with_resampler(
                config.mix_format,
                Arc::clone(&resampler_factory),
            ))
        });

        let shared = Arc::new(PipelineShared {
            microphone: SourceState::new(config.microphone_enabled),
            bgm: SourceState::new(config.bgm_enabled),
            mic_participant: Arc::new(QueueParticipant::new(
                SourceKind::Microphone,
                config.queue_capacity,
                Arc::clone(&clock),
            )),
            bgm_participant: Arc::new(QueueParticipant::new(
                SourceKind::BackgroundMusic,
                config.queue_capacity,
                Arc::clone(&clock),
            )),
            mixer,
            record: Arc::new(HandlerSlot::empty()),
            track: HandlerSlot::empty(),
            record_adapter: Mutex::new(ResampleAdapter::new(resampler_factory())),
            track_adapter: Mutex::new(ResampleAdapter::new(resampler_factory())),
            liveness: LivenessMonitor::new(config.liveness_timeout_secs),
            counters: Arc::new(PipelineCounters::default()),
            config,
            clock,
            diagnostics,
        });

        Self::init_devices(&shared, &microphone, &bgm);

        let duplex: Arc<dyn AudioTransport> = Arc::new(DuplexTransport::new(
            CaptureTap::new(SourceKind::Microphone, Arc::clone(&shared)),
            RenderSource::new(Arc::clone(&shared)),
        ));
        let registered = microphone.register_audio_callback(Some(duplex));
        shared.check_device(SourceKind::Microphone, DeviceOperation::RegisterCallback, registered);

        shared
            .mixer
            .register_participant(shared.mic_participant.clone(), true)?;
        shared
            .mixer
            .register_participant(shared.bgm_participant.clone(), true)?;
        shared.mixer.register_mixed_callback(Some(Arc::new(MixedOutput::new(
            Arc::clone(&shared.record),
            Arc::clone(&shared.counters),
        ))));

        let bgm_bypass: Arc<dyn AudioTransport> =
            Arc::new(CaptureTap::new(SourceKind::BackgroundMusic, Arc::clone(&shared)));
        let controller = MixModeController::new(
            Arc::clone(&shared),
            Arc::clone(&microphone),
            Arc::clone(&bgm),
            bgm_bypass,
        );
        controller.route_bgm(shared.microphone.is_enabled(), shared.bgm.is_enabled());

        let pipeline = Self {
            shared,
            controller,
            microphone,
            bgm,
            track_group: Mutex::new(()),
            delegate: Arc::new(HandlerSlot::empty()),
            housekeeping_running: Arc::new(AtomicBool::new(false)),
            housekeeping_handle: Mutex::new(None),
            shut_down: AtomicBool::new(false),
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        pipeline.start_housekeeping()?;

        log::info!(
            "audio pipeline {} created in {:?} mode",
            pipeline.session_id,
            pipeline.mode()
        );
        Ok(pipeline)
    }

    fn init_devices(shared: &PipelineShared, microphone: &Arc<dyn AudioDevice>, bgm: &Arc<dyn AudioDevice>) {
        let config = &shared.config;
        for (source, device) in [
            (SourceKind::Microphone, microphone),
            (SourceKind::BackgroundMusic, bgm),
        ] {
            shared.check_device(source, DeviceOperation::Init, device.init());
            shared.check_device(
                source,
                DeviceOperation::SetRecordingDevice,
                device.set_recording_device(config.recording_device),
            );
        }

        // Playback only ever runs on the microphone device.
        shared.check_device(
            SourceKind::Microphone,
            DeviceOperation::SetPlayoutDevice,
            microphone.set_playout_device(config.playout_device),
        );
        shared.check_device(
            SourceKind::Microphone,
            DeviceOperation::SetStereoPlayout,
            microphone.set_stereo_playout(config.stereo_playout),
        );
    }

    // --- Control surface ---

    /// Switch each capture source on or off. See `MixMode` for the resulting
    /// data path.
    pub fn set_audio_enable(&self, microphone_enabled: bool, bgm_enabled: bool) {
        self.controller.set_audio_enable(microphone_enabled, bgm_enabled);
    }

    /// Install the downstream record consumer and the format it requires.
    ///
    /// Fails with `ConfigurationFailed` for formats the 10 ms block path
    /// cannot carry.
    pub fn start_audio_record(
        &self,
        callback: Arc<dyn RecordCallback>,
        sample_rate_hz: u32,
        channels: u16,
    ) -> Result<(), AudioError> {
        self.controller
            .start_audio_record(callback, sample_rate_hz, channels)
    }

    pub fn stop_audio_record(&self) {
        self.controller.stop_audio_record();
    }

    /// Install the playout producer and bring up rendering on the
    /// microphone device.
    pub fn start_audio_track(&self, producer: Arc<dyn PlayoutSource>) {
        let _group = self.track_group.lock();
        let shared = &self.shared;
        shared.track.store(Some(producer));
        shared.track_adapter.lock().reset();

        if self.microphone.playing() {
            return;
        }
        let started = shared.check_device(
            SourceKind::Microphone,
            DeviceOperation::InitPlayout,
            self.microphone.init_playout(),
        ) && shared.check_device(
            SourceKind::Microphone,
            DeviceOperation::StartPlayout,
            self.microphone.start_playout(),
        );
        if started {
            log::info!("playout started");
        }
    }

    pub fn stop_audio_track(&self) {
        let _group = self.track_group.lock();
        self.shared.track.take();
        if self.microphone.playing() {
            self.shared.check_device(
                SourceKind::Microphone,
                DeviceOperation::StopPlayout,
                self.microphone.stop_playout(),
            );
            log::info!("playout stopped");
        }
    }

    /// Replace the delegate notified from the housekeeping thread.
    pub fn set_delegate(&self, delegate: Option<Arc<dyn PipelineDelegate>>) {
        self.delegate.store(delegate);
    }

    // --- Queries ---

    pub fn mode(&self) -> MixMode {
        self.shared.mode()
    }

    pub fn is_audio_flowing(&self) -> bool {
        self.shared.is_audio_flowing()
    }

    /// Frames currently buffered for `source` on the mixed path.
    pub fn queued_frames(&self, source: SourceKind) -> usize {
        self.shared.participant(source).queue().len()
    }

    /// Unix seconds of the last frame `source` delivered, 0 if none yet.
    pub fn last_delivery_secs(&self, source: SourceKind) -> i64 {
        self.shared.last_delivery_secs(source)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn diagnostics(&self) -> PipelineDiagnostics {
        PipelineDiagnostics {
            session_id: self.session_id.to_string(),
            created_at: self.created_at.to_rfc3339(),
            ..self.shared.snapshot()
        }
    }

    // --- Lifecycle ---

    /// Stop everything and release the devices. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.stop_housekeeping();
        self.stop_audio_track();
        self.controller.stop_all();
        self.shared.record.take();
        self.shared.clear_queues();

        let shared = &self.shared;
        for (source, device) in [
            (SourceKind::Microphone, &self.microphone),
            (SourceKind::BackgroundMusic, &self.bgm),
        ] {
            shared.check_device(source, DeviceOperation::RegisterCallback, device.register_audio_callback(None));
            shared.check_device(source, DeviceOperation::Terminate, device.terminate());
        }
        shared.mixer.register_mixed_callback(None);

        log::info!("audio pipeline {} shut down", self.session_id);
    }

    /// Poll mode and liveness, notify the delegate on every change.
    fn start_housekeeping(&self) -> Result<(), AudioError> {
        self.housekeeping_running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.housekeeping_running);
        let shared = Arc::clone(&self.shared);
        let delegate = Arc::clone(&self.delegate);
        let interval = shared.config.housekeeping_interval();
        let mut last_mode = shared.mode();
        let mut last_flowing = shared.is_audio_flowing();

        let handle = thread::Builder::new()
            .name("audio-housekeeping".into())
            .spawn(move || {
                loop {
                    thread::park_timeout(interval);
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }

                    let mode = shared.mode();
                    let flowing = shared.is_audio_flowing();
                    if mode == last_mode && flowing == last_flowing {
                        continue;
                    }

                    if flowing != last_flowing {
                        if flowing {
                            log::info!("microphone audio flowing again");
                        } else {
                            log::warn!(
                                "no microphone audio for {}s",
                                shared.liveness.timeout_secs()
                            );
                        }
                    }

                    if let Some(d) = delegate.load() {
                        if mode != last_mode {
                            d.on_mode_changed(mode);
                        }
                        if flowing != last_flowing {
                            d.on_liveness_changed(flowing);
                        }
                    }
                    last_mode = mode;
                    last_flowing = flowing;
                }
            })
            .map_err(|e| {
                self.housekeeping_running.store(false, Ordering::SeqCst);
                AudioError::Unknown(format!("failed to spawn housekeeping thread: {}", e))
            })?;

        *self.housekeeping_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop_housekeeping(&self) {
        self.housekeeping_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.housekeeping_handle.lock().take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for AudioPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
