use crate::models::audio_models::StreamFormat;
use crate::models::error::AudioError;
use crate::traits::resampler::Resampler;
use crate::MAX_BLOCK_SAMPLES;

/// Glue between a device stream and the format a consumer requires.
///
/// Converts exactly one 10 ms block per call: first the channel layout (into
/// a fixed scratch buffer, at the source rate), then the rate via the wrapped
/// `Resampler`. The resampler's state survives across calls and is only reset
/// by `reset()` or when the conversion pair changes.
pub struct ResampleAdapter {
    resampler: Box<dyn Resampler>,
    scratch: Vec<i16>,
    conversion: Option<(StreamFormat, StreamFormat)>,
}

impl ResampleAdapter {
    pub fn new(resampler: Box<dyn Resampler>) -> Self {
        Self {
            resampler,
            scratch: vec![0; MAX_BLOCK_SAMPLES],
            conversion: None,
        }
    }

    /// Convert one 10 ms block of `input` (in `from`) into `output` (in `to`).
    ///
    /// Returns the number of interleaved samples written.
    ///
    /// # Panics
    ///
    /// If either side's 10 ms block exceeds `MAX_BLOCK_SAMPLES`. Formats are
    /// validated before they reach the data path, so this is a broken caller.
    pub fn process_10ms(
        &mut self,
        input: &[i16],
        from: StreamFormat,
        to: StreamFormat,
        output: &mut [i16],
    ) -> Result<usize, AudioError> {
        let failure = AudioError::ResampleFailure {
            from_hz: from.sample_rate_hz,
            from_channels: from.channels,
            to_hz: to.sample_rate_hz,
            to_channels: to.channels,
        };
        if from.channels == 0 || to.channels == 0 {
            return Err(failure);
        }

        let in_block = from.samples_per_10ms();
        assert!(
            in_block <= MAX_BLOCK_SAMPLES && to.samples_per_10ms() <= MAX_BLOCK_SAMPLES,
            "10 ms block exceeds {} samples ({:?} -> {:?})",
            MAX_BLOCK_SAMPLES,
            from,
            to
        );

        if self.conversion != Some((from, to)) {
            if self.conversion.is_some() {
                log::debug!("resample conversion changed to {:?} -> {:?}, resetting state", from, to);
            }
            self.resampler.reset();
            self.conversion = Some((from, to));
        }

        let input = &input[..in_block.min(input.len())];
        if input.is_empty() {
            return Err(failure);
        }

        if from == to {
            let count = input.len().min(output.len());
            output[..count].copy_from_slice(&input[..count]);
            return Ok(count);
        }

        let remixed = remix_channels(input, from.channels as usize, to.channels as usize, &mut self.scratch);
        let written = self.resampler.resample(
            &self.scratch[..remixed],
            from.sample_rate_hz,
            to.sample_rate_hz,
            to.channels as usize,
            output,
        );

        if written == 0 {
            return Err(failure);
        }
        Ok(written)
    }

    /// Drop carried filter state. Only for stream restarts.
    pub fn reset(&mut self) {
        self.resampler.reset();
        self.conversion = None;
    }
}

/// Rewrite interleaved `input` from `from_channels` to `to_channels` into `out`.
///
/// Downmixing to mono averages all channels; upmixing repeats channels
/// cyclically (mono becomes identical left/right). Returns samples written.
pub fn remix_channels(input: &[i16], from_channels: usize, to_channels: usize, out: &mut [i16]) -> usize {
    let frames = (input.len() / from_channels).min(out.len() / to_channels);

    if from_channels == to_channels {
        let count = frames * to_channels;
        out[..count].copy_from_slice(&input[..count]);
        return count;
    }

    for frame in 0..frames {
        let src = &input[frame * from_channels..(frame + 1) * from_channels];
        let dst = &mut out[frame * to_channels..(frame + 1) * to_channels];
        if to_channels == 1 {
            let sum: i32 = src.iter().map(|&s| s as i32).sum();
            dst[0] = (sum / from_channels as i32) as i16;
        } else {
            for (ch, sample) in dst.iter_mut().enumerate() {
                *sample = src[ch % from_channels];
            }
        }
    }
    frames * to_channels
}
