pub mod frame_mixer;
pub mod frame_queue;
pub mod handler_slot;
pub mod linear_resampler;
pub mod resample_adapter;
