use std::sync::Arc;

use crate::models::audio_models::AudioFrame;
use crate::models::error::AudioError;

/// Capability a source adapter exposes to the mixer.
///
/// The mixer depends only on this trait, never on the concrete source.
pub trait MixerParticipant: Send + Sync {
    /// Hand one frame over to the participant's buffer.
    fn push(&self, frame: AudioFrame);

    /// Take the oldest buffered frame. `None` means no contribution this tick.
    fn pop(&self) -> Option<AudioFrame>;

    /// Unix seconds of the last frame the participant received.
    fn last_delivery_secs(&self) -> i64;
}

/// Receives the single mixed frame produced by each mixer tick.
pub trait MixedAudioReceiver: Send + Sync {
    fn on_mixed_audio_ready(&self, frame: &AudioFrame);
}

/// Mixer engine combining participant frames into one frame per tick.
pub trait MixerEngine: Send + Sync {
    fn register_participant(
        &self,
        participant: Arc<dyn MixerParticipant>,
        mixable: bool,
    ) -> Result<(), AudioError>;

    fn register_mixed_callback(&self, receiver: Option<Arc<dyn MixedAudioReceiver>>);

    /// Run exactly one tick.
    fn process(&self);
}
