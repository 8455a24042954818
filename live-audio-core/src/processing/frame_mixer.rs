use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFrame, StreamFormat, VadActivity};
use crate::models::error::AudioError;
use crate::processing::linear_resampler::LinearResampler;
use crate::processing::handler_slot::HandlerSlot;
use crate::processing::resample_adapter::ResampleAdapter;
use crate::traits::mixer::{MixedAudioReceiver, MixerEngine, MixerParticipant};
use crate::traits::resampler::ResamplerFactory;
use crate::MAX_BLOCK_SAMPLES;

struct MixerSlot {
    participant: Arc<dyn MixerParticipant>,
    mixable: bool,
    adapter: ResampleAdapter,
}

/// Built-in mixer engine.
///
/// Each tick pops the head frame of every mixable participant, converts it to
/// the mixer's output format, sums the contributions and soft-clips the
/// result. Exactly one frame is produced per tick; when nobody contributed it
/// is 10 ms of silence.
pub struct FrameMixer {
    format: StreamFormat,
    slots: Mutex<Vec<MixerSlot>>,
    receiver: HandlerSlot<dyn MixedAudioReceiver>,
    resampler_factory: ResamplerFactory,
    ticks: AtomicU64,
}

impl FrameMixer {
    pub fn new(format: StreamFormat) -> Self {
        Self::with_resampler(format, LinearResampler::factory())
    }

    /// Mixer whose per-participant format conversion uses `factory`.
    pub fn with_resampler(format: StreamFormat, factory: ResamplerFactory) -> Self {
        Self {
            format,
            slots: Mutex::new(Vec::new()),
            receiver: HandlerSlot::empty(),
            resampler_factory: factory,
            ticks: AtomicU64::new(0),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Pop, convert and sum one frame from every mixable participant.
    fn mix_once(&self) -> AudioFrame {
        let block = self.format.samples_per_10ms();
        let mut accumulator = [0i32; MAX_BLOCK_SAMPLES];
        let mut converted = [0i16; MAX_BLOCK_SAMPLES];
        let mut vad = VadActivity::Passive;
        let mut contributors = 0usize;

        {
            let mut slots = self.slots.lock();
            for slot in slots.iter_mut().filter(|s| s.mixable) {
                let Some(frame) = slot.participant.pop() else {
                    continue;
                };
                if frame.is_empty() {
                    continue;
                }
                let written = match slot
                    .adapter
                    .process_10ms(&frame.samples, frame.format(), self.format, &mut converted)
                {
                    Ok(written) => written.min(block),
                    Err(e) => {
                        log::trace!("mixer dropped a frame: {}", e);
                        continue;
                    }
                };
                for (acc, &sample) in accumulator[..written].iter_mut().zip(&converted[..written]) {
                    *acc += sample as i32;
                }
                if frame.vad == VadActivity::Active {
                    vad = VadActivity::Active;
                }
                contributors += 1;
            }
        }

        if contributors == 0 {
            return AudioFrame::silence(self.format);
        }

        // A lone contributor already fits in i16 and is passed through untouched.
        let samples = if contributors == 1 {
            accumulator[..block].iter().map(|&sum| sum as i16).collect()
        } else {
            accumulator[..block]
                .iter()
                .map(|&sum| to_i16(soft_clip(sum as f32 / 32768.0)))
                .collect()
        };
        AudioFrame::new(samples, self.format.channels, self.format.sample_rate_hz, vad)
    }
}

impl MixerEngine for FrameMixer {
    fn register_participant(
        &self,
        participant: Arc<dyn MixerParticipant>,
        mixable: bool,
    ) -> Result<(), AudioError> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots
            .iter_mut()
            .find(|s| Arc::ptr_eq(&s.participant, &participant))
        {
            slot.mixable = mixable;
            return Ok(());
        }
        slots.push(MixerSlot {
            participant,
            mixable,
            adapter: ResampleAdapter::new((self.resampler_factory)()),
        });
        Ok(())
    }

    fn register_mixed_callback(&self, receiver: Option<Arc<dyn MixedAudioReceiver>>) {
        self.receiver.store(receiver);
    }

    fn process(&self) {
        let mixed = self.mix_once();
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if let Some(receiver) = self.receiver.load() {
            receiver.on_mixed_audio_ready(&mixed);
        }
    }
}

const KNEE: f32 = 0.9;

/// Soft clipping to prevent harsh digital clipping on summed sources.
///
/// Identity below the knee; above it the curve bends towards full scale
/// with matching slope, so it never overshoots.
fn soft_clip(sample: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= KNEE {
        return sample;
    }
    let headroom = 1.0 - KNEE;
    sample.signum() * (KNEE + headroom * ((magnitude - KNEE) / headroom).tanh())
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
