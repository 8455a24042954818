pub mod audio_device;
pub mod clock;
pub mod diagnostics_sink;
pub mod mixer;
pub mod pipeline_delegate;
pub mod record_callback;
pub mod resampler;
