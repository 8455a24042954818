use crate::models::audio_models::{PlayoutChunk, RecordedAudio};

/// Downstream consumer of the outgoing (mixed or passthrough) stream.
///
/// Called on a capture thread at most once per capture tick per enabled path.
pub trait RecordCallback: Send + Sync {
    fn on_record_audio(&self, audio: &RecordedAudio<'_>);
}

/// Downstream producer feeding the playback path.
///
/// Polled once per render tick. Writes interleaved samples into `buffer`
/// and reports how many it wrote together with their format.
pub trait PlayoutSource: Send + Sync {
    fn on_need_play_audio(&self, buffer: &mut [i16]) -> PlayoutChunk;
}
