use std::sync::Arc;

use crate::models::audio_models::{AudioFrame, CapturedAudio, RecordedAudio, SourceKind};
use crate::models::diagnostics::StreamDirection;
use crate::processing::handler_slot::HandlerSlot;
use crate::session::state::{PipelineCounters, PipelineShared, RecordTarget};
use crate::traits::audio_device::AudioTransport;
use crate::traits::mixer::{MixedAudioReceiver, MixerParticipant};
use crate::MAX_BLOCK_SAMPLES;

const BYTES_PER_SAMPLE: usize = std::mem::size_of::<i16>();

/// Device-facing entry point for one capture source.
///
/// Reads the mode once per delivery and branches into the mixed path
/// (queue + one mixer tick) or the passthrough path (direct, resampled if the
/// consumer needs another format). Frames from a disabled source are dropped
/// on arrival, whatever the hardware is still doing.
pub(crate) struct CaptureTap {
    source: SourceKind,
    shared: Arc<PipelineShared>,
}

impl CaptureTap {
    pub fn new(source: SourceKind, shared: Arc<PipelineShared>) -> Self {
        Self { source, shared }
    }

    pub fn on_frame_captured(&self, audio: &CapturedAudio<'_>) -> u32 {
        let shared = &self.shared;
        let state = shared.source(self.source);
        let mode = shared.mode();

        if !state.is_enabled() {
            PipelineCounters::bump(&shared.counters.discarded_frames);
            log::trace!("{} disabled, dropping frame", self.source.label());
            return audio.current_mic_level;
        }

        if mode.is_mixed() {
            match self.source {
                SourceKind::Microphone => {
                    shared.mic_participant.push(AudioFrame::from_captured(audio));
                    shared.mixer.process();
                    PipelineCounters::bump(&shared.counters.mixer_ticks);
                }
                SourceKind::BackgroundMusic => {
                    // Still registered on the bypass route while the switch
                    // to mixed completes; buffer it like the participant would.
                    shared.bgm_participant.accept(audio);
                }
            }
        } else if mode.is_passthrough_for(self.source) {
            let now = shared.clock.now_secs();
            state.record_delivery(now);
            shared.liveness.record_passthrough(now);
            deliver_passthrough(shared, audio);
        } else {
            PipelineCounters::bump(&shared.counters.discarded_frames);
        }

        audio.current_mic_level
    }
}

impl AudioTransport for CaptureTap {
    fn recorded_data_is_available(&self, audio: &CapturedAudio<'_>) -> u32 {
        self.on_frame_captured(audio)
    }
}

/// Deliver one capture block straight to the record consumer.
fn deliver_passthrough(shared: &PipelineShared, audio: &CapturedAudio<'_>) {
    let Some(target) = shared.record.load() else {
        // No consumer: produce but discard.
        PipelineCounters::bump(&shared.counters.discarded_frames);
        return;
    };

    let from = audio.format();
    if from == target.format {
        target.callback.on_record_audio(&RecordedAudio {
            samples: audio.samples,
            samples_per_channel: audio.samples_per_channel,
            bytes_per_sample: audio.bytes_per_sample,
            channels: target.format.channels,
            sample_rate_hz: audio.sample_rate_hz,
            total_delay_ms: audio.total_delay_ms,
        });
        PipelineCounters::bump(&shared.counters.passthrough_deliveries);
        return;
    }

    let mut block = [0i16; MAX_BLOCK_SAMPLES];
    let result = shared
        .record_adapter
        .lock()
        .process_10ms(audio.samples, from, target.format, &mut block);

    match result {
        Ok(written) => {
            target.callback.on_record_audio(&RecordedAudio {
                samples: &block[..written],
                samples_per_channel: written / target.format.channels as usize,
                bytes_per_sample: audio.bytes_per_sample,
                channels: target.format.channels,
                sample_rate_hz: target.format.sample_rate_hz,
                total_delay_ms: audio.total_delay_ms,
            });
            PipelineCounters::bump(&shared.counters.passthrough_deliveries);
        }
        Err(e) => shared.report_resample_failure(StreamDirection::Record, e),
    }
}

/// Forwards each mixed frame to the record consumer as-is.
pub(crate) struct MixedOutput {
    record: Arc<HandlerSlot<RecordTarget>>,
    counters: Arc<PipelineCounters>,
}

impl MixedOutput {
    pub fn new(record: Arc<HandlerSlot<RecordTarget>>, counters: Arc<PipelineCounters>) -> Self {
        Self { record, counters }
    }
}

impl MixedAudioReceiver for MixedOutput {
    fn on_mixed_audio_ready(&self, frame: &AudioFrame) {
        let Some(target) = self.record.load() else {
            return;
        };
        target.callback.on_record_audio(&RecordedAudio {
            samples: &frame.samples,
            samples_per_channel: frame.samples_per_channel,
            bytes_per_sample: BYTES_PER_SAMPLE,
            channels: frame.channels,
            sample_rate_hz: frame.sample_rate_hz,
            total_delay_ms: 0,
        });
        PipelineCounters::bump(&self.counters.mixed_deliveries);
    }
}
