use std::sync::Arc;

use crate::traits::resampler::{Resampler, ResamplerFactory};

/// Stateful linear-interpolation resampler for interleaved i16 audio.
///
/// Each block is interpolated against the last frame of the previous block,
/// so consecutive 10 ms calls join without a discontinuity at the boundary
/// (at the cost of one input frame of latency). Equal rates copy the input
/// through untouched.
#[derive(Debug, Clone, Default)]
pub struct LinearResampler {
    previous: Vec<i16>,
    primed: bool,
}

impl LinearResampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory producing a fresh `LinearResampler` per stream.
    pub fn factory() -> ResamplerFactory {
        Arc::new(|| Box::new(LinearResampler::new()) as Box<dyn Resampler>)
    }

    fn remember_last_frame(&mut self, input: &[i16], channels: usize) {
        let frames = input.len() / channels;
        if frames == 0 {
            return;
        }
        let last = (frames - 1) * channels;
        self.previous.clear();
        self.previous.extend_from_slice(&input[last..last + channels]);
        self.primed = true;
    }
}

impl Resampler for LinearResampler {
    fn resample(
        &mut self,
        input: &[i16],
        from_hz: u32,
        to_hz: u32,
        channels: usize,
        output: &mut [i16],
    ) -> usize {
        if channels == 0 || from_hz == 0 || to_hz == 0 {
            return 0;
        }
        let frames_in = input.len() / channels;
        if frames_in == 0 {
            return 0;
        }

        if self.previous.len() != channels {
            self.primed = false;
        }

        if from_hz == to_hz {
            let count = (frames_in * channels).min(output.len() / channels * channels);
            output[..count].copy_from_slice(&input[..count]);
            self.remember_last_frame(input, channels);
            return count;
        }

        if !self.primed {
            self.previous.clear();
            self.previous.extend_from_slice(&input[..channels]);
        }

        let step = from_hz as f64 / to_hz as f64;
        let frames_out = ((frames_in as u64 * to_hz as u64) / from_hz as u64) as usize;
        let frames_out = frames_out.min(output.len() / channels);

        // Position 0 is the previous block's last frame, position k is input frame k - 1.
        for i in 0..frames_out {
            let position = i as f64 * step;
            let index = position as usize;
            let fraction = position - index as f64;

            for ch in 0..channels {
                let a = if index == 0 {
                    self.previous[ch]
                } else {
                    input[(index - 1) * channels + ch]
                };
                let b = input[index.min(frames_in - 1) * channels + ch];
                let value = a as f64 + (b as f64 - a as f64) * fraction;
                output[i * channels + ch] = value.round() as i16;
            }
        }

        self.remember_last_frame(input, channels);
        frames_out * channels
    }

    fn reset(&mut self) {
        self.previous.clear();
        self.primed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn same_rate_is_bit_identical() {
        let mut resampler = LinearResampler::new();
        let input: Vec<i16> = (0..960).map(|i| (i * 37 % 65_536 - 32_768) as i16).collect();
        let mut output = vec![0i16; 3840];

        let written = resampler.resample(&input, 48000, 48000, 2, &mut output);

        assert_eq!(written, 960);
        assert_eq!(&output[..written], &input[..]);
    }

    #[test]
    fn downsample_block_length() {
        let mut resampler = LinearResampler::new();
        let input: Vec<i16> = (0..480).map(|i| i as i16).collect();
        let mut output = vec![0i16; 3840];

        let written = resampler.resample(&input, 48000, 16000, 1, &mut output);

        assert_eq!(written, 160);
    }

    #[test]
    fn upsample_stereo_block_length() {
        let mut resampler = LinearResampler::new();
        let input = vec![100i16; 320]; // 160 stereo frames at 16 kHz
        let mut output = vec![0i16; 3840];

        let written = resampler.resample(&input, 16000, 48000, 2, &mut output);

        assert_eq!(written, 960);
        assert!(output[..written].iter().all(|&s| s == 100));
    }

    #[test]
    fn interpolates_between_samples() {
        let mut resampler = LinearResampler::new();
        let mut output = vec![0i16; 16];

        // Prime with a flat block so the next block starts from 0.
        resampler.resample(&[0, 0], 1, 2, 1, &mut output);
        let written = resampler.resample(&[1000, 1000], 1, 2, 1, &mut output);

        assert_eq!(written, 4);
        assert_eq!(output[0], 0);
        assert_abs_diff_eq!(output[1] as f64, 500.0, epsilon = 1.0);
        assert_eq!(output[2], 1000);
    }

    #[test]
    fn constant_signal_stays_constant_across_blocks() {
        let mut resampler = LinearResampler::new();
        let input = vec![-1234i16; 441];
        let mut output = vec![0i16; 3840];

        for _ in 0..5 {
            let written = resampler.resample(&input, 44100, 48000, 1, &mut output);
            assert_eq!(written, 480);
            assert!(output[..written].iter().all(|&s| s == -1234));
        }
    }

    #[test]
    fn block_boundary_is_continuous() {
        let mut resampler = LinearResampler::new();
        let ramp: Vec<i16> = (0..960).map(|i| (i * 10) as i16).collect();
        let mut first = vec![0i16; 3840];
        let mut second = vec![0i16; 3840];

        let n1 = resampler.resample(&ramp[..480], 48000, 32000, 1, &mut first);
        let n2 = resampler.resample(&ramp[480..], 48000, 32000, 1, &mut second);

        let last = first[n1 - 1] as f64;
        let next = second[0] as f64;
        // Output step on a 10-per-sample ramp at 1.5 input samples per output sample is 15.
        assert_abs_diff_eq!(next - last, 15.0, epsilon = 1.0);
        assert_eq!(n2, 320);
    }

    #[test]
    fn respects_output_capacity() {
        let mut resampler = LinearResampler::new();
        let input = vec![1i16; 160];
        let mut output = vec![0i16; 100];

        let written = resampler.resample(&input, 16000, 48000, 1, &mut output);

        assert_eq!(written, 100);
    }

    #[test]
    fn empty_input_produces_nothing() {
        let mut resampler = LinearResampler::new();
        let mut output = vec![0i16; 16];
        assert_eq!(resampler.resample(&[], 48000, 16000, 1, &mut output), 0);
    }
}
