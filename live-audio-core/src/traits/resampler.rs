/// Sample-rate conversion routine operating on interleaved i16 blocks.
///
/// Implementations carry filter state from one call to the next; resetting
/// that state in the middle of a stream is audible.
pub trait Resampler: Send {
    /// Convert `input` from `from_hz` to `to_hz`, writing at most
    /// `output.len()` interleaved samples. Returns the number written.
    fn resample(
        &mut self,
        input: &[i16],
        from_hz: u32,
        to_hz: u32,
        channels: usize,
        output: &mut [i16],
    ) -> usize;

    /// Forget all carried state.
    fn reset(&mut self);
}

/// Builds one resampler per stream that needs one.
pub type ResamplerFactory = std::sync::Arc<dyn Fn() -> Box<dyn Resampler> + Send + Sync>;
