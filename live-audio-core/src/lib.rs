//! # live-audio-core
//!
//! Dual-source capture arbitration for live streaming.
//!
//! Two independently clocked capture devices (microphone and background
//! music) feed one outgoing record stream, and one playout producer feeds
//! the render device. The core decides per frame whether audio goes straight
//! through, through the mixer, or nowhere, and keeps memory bounded when the
//! two sources drift apart. Platform backends implement `AudioDevice` and
//! plug into `AudioPipeline`.
//!
//! ## Architecture
//!
//! ```text
//! live-audio-core (this crate)
//! ├── traits/       ← AudioDevice, AudioTransport, RecordCallback, PlayoutSource,
//! │                   MixerEngine, MixerParticipant, Resampler, Clock, DiagnosticsSink,
//! │                   PipelineDelegate
//! ├── models/       ← AudioError, MixMode, StreamFormat, AudioFrame, PipelineConfiguration,
//! │                   PipelineDiagnostics
//! ├── processing/   ← FrameQueue, FrameMixer, ResampleAdapter, LinearResampler, HandlerSlot
//! └── session/      ← AudioPipeline (composition root), LivenessMonitor
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

/// Largest interleaved 10 ms block the data path carries (192 kHz stereo).
pub const MAX_BLOCK_SAMPLES: usize = 3840;

/// Device callbacks arrive every 10 ms.
pub const BLOCKS_PER_SECOND: u32 = 100;

/// Default per-source queue depth in mixed mode.
pub const FRAME_QUEUE_CAPACITY: usize = 30;

/// Default seconds without microphone audio before the stream counts as stalled.
pub const LIVENESS_TIMEOUT_SECS: i64 = 5;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioFrame, CapturedAudio, DeviceSelector, MixMode, PlayoutChunk, PlayoutDelivery, PlayoutRequest,
    RecordedAudio, SourceKind, StreamFormat, VadActivity,
};
pub use models::config::PipelineConfiguration;
pub use models::diagnostics::{DeviceOperation, DiagnosticEvent, PipelineDiagnostics, StreamDirection};
pub use models::error::AudioError;
pub use processing::frame_mixer::FrameMixer;
pub use processing::frame_queue::{FrameQueue, QueueParticipant};
pub use processing::handler_slot::HandlerSlot;
pub use processing::linear_resampler::LinearResampler;
pub use processing::resample_adapter::ResampleAdapter;
pub use session::liveness::LivenessMonitor;
pub use session::pipeline::{AudioPipeline, PipelineComponents};
pub use traits::audio_device::{AudioDevice, AudioTransport};
pub use traits::clock::{Clock, SystemClock};
pub use traits::diagnostics_sink::{DiagnosticsSink, LogDiagnostics};
pub use traits::mixer::{MixedAudioReceiver, MixerEngine, MixerParticipant};
pub use traits::pipeline_delegate::PipelineDelegate;
pub use traits::record_callback::{PlayoutSource, RecordCallback};
pub use traits::resampler::{Resampler, ResamplerFactory};
