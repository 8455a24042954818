use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{MixMode, SourceKind, StreamFormat};
use crate::models::config::PipelineConfiguration;
use crate::models::diagnostics::{DeviceOperation, DiagnosticEvent, PipelineDiagnostics, StreamDirection};
use crate::models::error::AudioError;
use crate::processing::frame_queue::QueueParticipant;
use crate::processing::handler_slot::HandlerSlot;
use crate::processing::resample_adapter::ResampleAdapter;
use crate::session::liveness::LivenessMonitor;
use crate::traits::clock::Clock;
use crate::traits::diagnostics_sink::DiagnosticsSink;
use crate::traits::mixer::{MixerEngine, MixerParticipant};
use crate::traits::record_callback::{PlayoutSource, RecordCallback};

/// Per-source flags and counters.
///
/// `enabled` is written only by mode switches, `last_delivery` only by the
/// capture callback.
#[derive(Debug, Default)]
pub(crate) struct SourceState {
    enabled: AtomicBool,
    last_delivery: AtomicI64,
    frames: AtomicU64,
}

impl SourceState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn record_delivery(&self, now_secs: i64) {
        self.last_delivery.fetch_max(now_secs, Ordering::SeqCst);
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_delivery_secs(&self) -> i64 {
        self.last_delivery.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub(crate) struct PipelineCounters {
    pub mixer_ticks: AtomicU64,
    pub mixed_deliveries: AtomicU64,
    pub passthrough_deliveries: AtomicU64,
    pub discarded_frames: AtomicU64,
    pub playout_ticks: AtomicU64,
    pub silence_ticks: AtomicU64,
    pub resample_failures: AtomicU64,
    pub device_failures: AtomicU64,
}

impl PipelineCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Downstream record consumer plus the format it wants, swapped as one unit.
pub(crate) struct RecordTarget {
    pub callback: Arc<dyn RecordCallback>,
    pub format: StreamFormat,
}

/// Everything the device-facing callbacks and the control surface share.
pub(crate) struct PipelineShared {
    pub config: PipelineConfiguration,
    pub clock: Arc<dyn Clock>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
    pub microphone: SourceState,
    pub bgm: SourceState,
    pub mic_participant: Arc<QueueParticipant>,
    pub bgm_participant: Arc<QueueParticipant>,
    pub mixer: Arc<dyn MixerEngine>,
    pub record: Arc<HandlerSlot<RecordTarget>>,
    pub track: HandlerSlot<dyn PlayoutSource>,
    pub record_adapter: Mutex<ResampleAdapter>,
    pub track_adapter: Mutex<ResampleAdapter>,
    pub liveness: LivenessMonitor,
    pub counters: Arc<PipelineCounters>,
}

impl PipelineShared {
    /// Derived from the two enable flags on every call.
    pub fn mode(&self) -> MixMode {
        MixMode::from_flags(self.microphone.is_enabled(), self.bgm.is_enabled())
    }

    pub fn source(&self, kind: SourceKind) -> &SourceState {
        match kind {
            SourceKind::Microphone => &self.microphone,
            SourceKind::BackgroundMusic => &self.bgm,
        }
    }

    pub fn participant(&self, kind: SourceKind) -> &QueueParticipant {
        match kind {
            SourceKind::Microphone => &self.mic_participant,
            SourceKind::BackgroundMusic => &self.bgm_participant,
        }
    }

    /// Latest delivery of `kind` on either the passthrough or the mixed path.
    pub fn last_delivery_secs(&self, kind: SourceKind) -> i64 {
        self.source(kind)
            .last_delivery_secs()
            .max(self.participant(kind).last_delivery_secs())
    }

    pub fn is_audio_flowing(&self) -> bool {
        self.liveness.is_flowing(
            self.mode(),
            self.mic_participant.last_delivery_secs(),
            self.clock.now_secs(),
        )
    }

    /// Swallow a device-service failure: count it and hand it to the sink.
    ///
    /// Returns whether the call succeeded.
    pub fn check_device(&self, source: SourceKind, operation: DeviceOperation, result: Result<(), AudioError>) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                PipelineCounters::bump(&self.counters.device_failures);
                self.diagnostics.report(DiagnosticEvent::DeviceFailure {
                    source,
                    operation,
                    error,
                });
                false
            }
        }
    }

    pub fn report_resample_failure(&self, direction: StreamDirection, error: AudioError) {
        PipelineCounters::bump(&self.counters.resample_failures);
        self.diagnostics
            .report(DiagnosticEvent::ResampleFailure { direction, error });
    }

    pub fn clear_queues(&self) {
        let mic = self.mic_participant.queue().clear();
        let bgm = self.bgm_participant.queue().clear();
        if mic + bgm > 0 {
            log::debug!("cleared {} microphone and {} bgm frames", mic, bgm);
        }
    }

    pub fn snapshot(&self) -> PipelineDiagnostics {
        let c = &self.counters;
        PipelineDiagnostics {
            mode: Some(self.mode()),
            microphone_frames: self.microphone.frames() + self.mic_participant.queue().pushed_frames(),
            bgm_frames: self.bgm.frames() + self.bgm_participant.queue().pushed_frames(),
            mixer_ticks: c.mixer_ticks.load(Ordering::Relaxed),
            mixed_deliveries: c.mixed_deliveries.load(Ordering::Relaxed),
            passthrough_deliveries: c.passthrough_deliveries.load(Ordering::Relaxed),
            discarded_frames: c.discarded_frames.load(Ordering::Relaxed),
            queue_evictions: self.mic_participant.queue().evicted_frames()
                + self.bgm_participant.queue().evicted_frames(),
            playout_ticks: c.playout_ticks.load(Ordering::Relaxed),
            silence_ticks: c.silence_ticks.load(Ordering::Relaxed),
            resample_failures: c.resample_failures.load(Ordering::Relaxed),
            device_failures: c.device_failures.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}
