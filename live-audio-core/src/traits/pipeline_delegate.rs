use crate::models::audio_models::MixMode;

/// Event delegate for pipeline state notifications.
///
/// Called from the housekeeping thread, never from an audio thread.
/// Implementations should marshal to their own thread if needed.
pub trait PipelineDelegate: Send + Sync {
    /// The derived mix mode changed.
    fn on_mode_changed(&self, mode: MixMode);

    /// The liveness watchdog flipped between flowing and stalled.
    fn on_liveness_changed(&self, flowing: bool);
}
