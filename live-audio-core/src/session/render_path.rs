use std::sync::Arc;

use crate::models::audio_models::{CapturedAudio, PlayoutDelivery, PlayoutRequest};
use crate::models::diagnostics::StreamDirection;
use crate::session::capture_path::CaptureTap;
use crate::session::state::{PipelineCounters, PipelineShared};
use crate::traits::audio_device::AudioTransport;
use crate::MAX_BLOCK_SAMPLES;

/// The single playback path.
///
/// Never leaves the render device short: anything other than a successful
/// pull-and-convert becomes silence of the requested size.
pub(crate) struct RenderSource {
    shared: Arc<PipelineShared>,
}

impl RenderSource {
    pub fn new(shared: Arc<PipelineShared>) -> Self {
        Self { shared }
    }

    pub fn on_need_playback_data(&self, request: &PlayoutRequest, out: &mut [i16]) -> PlayoutDelivery {
        let shared = &self.shared;
        PipelineCounters::bump(&shared.counters.playout_ticks);

        let Some(producer) = shared.track.load() else {
            return self.silence(request, out);
        };

        let mut pulled = [0i16; MAX_BLOCK_SAMPLES];
        let chunk = producer.on_need_play_audio(&mut pulled);
        if chunk.samples == 0 {
            return self.silence(request, out);
        }

        let mut block = [0i16; MAX_BLOCK_SAMPLES];
        let result = shared.track_adapter.lock().process_10ms(
            &pulled[..chunk.samples.min(MAX_BLOCK_SAMPLES)],
            chunk.format(),
            request.format(),
            &mut block,
        );

        match result {
            Ok(written) => {
                let count = written.min(out.len());
                out[..count].copy_from_slice(&block[..count]);
                PlayoutDelivery {
                    samples_per_channel: count / request.channels.max(1) as usize,
                    ..Default::default()
                }
            }
            Err(e) => {
                shared.report_resample_failure(StreamDirection::Playout, e);
                self.silence(request, out)
            }
        }
    }

    fn silence(&self, request: &PlayoutRequest, out: &mut [i16]) -> PlayoutDelivery {
        PipelineCounters::bump(&self.shared.counters.silence_ticks);
        let total = request.total_samples().min(out.len());
        out[..total].fill(0);
        PlayoutDelivery {
            samples_per_channel: total / request.channels.max(1) as usize,
            ..Default::default()
        }
    }
}

/// Transport for the primary device, which both captures the microphone and
/// renders playback.
pub(crate) struct DuplexTransport {
    capture: CaptureTap,
    render: RenderSource,
}

impl DuplexTransport {
    pub fn new(capture: CaptureTap, render: RenderSource) -> Self {
        Self { capture, render }
    }
}

impl AudioTransport for DuplexTransport {
    fn recorded_data_is_available(&self, audio: &CapturedAudio<'_>) -> u32 {
        self.capture.on_frame_captured(audio)
    }

    fn need_more_play_data(&self, request: &PlayoutRequest, out: &mut [i16]) -> PlayoutDelivery {
        self.render.on_need_playback_data(request, out)
    }
}
