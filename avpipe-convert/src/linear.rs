//! Linear interpolation resampler.
//!
//! Fast, low-quality resampling using linear interpolation between samples.
//! Adequate for format reconciliation; not intended for mastering quality.

use crate::error::{ConvertError, Result};

/// Linear interpolation resampler over interleaved f32 audio.
///
/// Interpolates between adjacent samples, carrying the last sample of each
/// call forward so streaming input produces seamless output.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    input_rate: u32,
    output_rate: u32,
    /// Input frames consumed per output frame.
    ratio: f64,
    /// Fractional position within the input frames.
    position: f64,
    /// Last frame of the previous call (one value per channel).
    prev_samples: Vec<f32>,
    channels: usize,
}

impl LinearResampler {
    /// Create a new linear resampler.
    ///
    /// # Errors
    /// Returns an error if either sample rate or the channel count is zero.
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> Result<Self> {
        if input_rate == 0 {
            return Err(ConvertError::InvalidSampleRate { rate: input_rate });
        }
        if output_rate == 0 {
            return Err(ConvertError::InvalidSampleRate { rate: output_rate });
        }
        if channels == 0 {
            return Err(ConvertError::InvalidChannelCount { count: channels });
        }

        Ok(Self {
            input_rate,
            output_rate,
            ratio: input_rate as f64 / output_rate as f64,
            position: 0.0,
            prev_samples: vec![0.0; channels],
            channels,
        })
    }

    /// Resample a buffer of interleaved samples.
    ///
    /// The input length must be divisible by the channel count. The number of
    /// output frames varies by one between calls as the fractional position
    /// carries over.
    pub fn process_interleaved(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let channels = self.channels;
        if input.len() % channels != 0 {
            return Err(ConvertError::BufferSizeMismatch {
                actual: input.len(),
                channels,
            });
        }

        let input_frames = input.len() / channels;
        let output_frames = ((input_frames as f64) / self.ratio).ceil() as usize;
        let mut output = Vec::with_capacity(output_frames * channels);

        let mut pos = self.position;
        while (pos as usize) < input_frames {
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;

            for ch in 0..channels {
                let s0 = if idx > 0 {
                    input[(idx - 1) * channels + ch]
                } else {
                    self.prev_samples[ch]
                };
                let s1 = input[idx * channels + ch];
                output.push(Self::interpolate(s0, s1, frac));
            }

            pos += self.ratio;
        }

        // Carry state into the next call
        self.position = pos - input_frames as f64;
        for ch in 0..channels {
            self.prev_samples[ch] = input[(input_frames - 1) * channels + ch];
        }

        Ok(output)
    }

    /// Get the input sample rate.
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Get the output sample rate.
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Get the resampling ratio (input frames per output frame).
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Reset internal state.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.prev_samples.fill(0.0);
    }

    #[inline]
    fn interpolate(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let resampler = LinearResampler::new(44100, 48000, 2).unwrap();
        assert_eq!(resampler.input_rate(), 44100);
        assert_eq!(resampler.output_rate(), 48000);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LinearResampler::new(0, 48000, 2).is_err());
        assert!(LinearResampler::new(44100, 0, 2).is_err());
        assert!(LinearResampler::new(44100, 48000, 0).is_err());
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(LinearResampler::interpolate(0.0, 1.0, 0.0), 0.0);
        assert_eq!(LinearResampler::interpolate(0.0, 1.0, 1.0), 1.0);
        assert_eq!(LinearResampler::interpolate(-1.0, 1.0, 0.5), 0.0);
    }

    #[test]
    fn test_unity_ratio_preserves_count() {
        let mut resampler = LinearResampler::new(48000, 48000, 1).unwrap();
        let input = vec![0.5f32; 480];
        assert_eq!(resampler.process_interleaved(&input).unwrap().len(), 480);
        assert_eq!(resampler.process_interleaved(&input).unwrap().len(), 480);
    }

    #[test]
    fn test_upsample() {
        let mut resampler = LinearResampler::new(22050, 44100, 1).unwrap();
        let input: Vec<f32> = (0..100).map(|i| (i as f32 / 100.0).sin()).collect();
        let output = resampler.process_interleaved(&input).unwrap();
        assert!(output.len() >= 190 && output.len() <= 210);
    }

    #[test]
    fn test_downsample_interleaved() {
        let mut resampler = LinearResampler::new(48000, 24000, 2).unwrap();
        let input: Vec<f32> = (0..400).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let output = resampler.process_interleaved(&input).unwrap();
        assert_eq!(output.len() % 2, 0);
        let frames = output.len() / 2;
        assert!((90..=110).contains(&frames));
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let mut resampler = LinearResampler::new(44100, 48000, 2).unwrap();
        assert!(resampler.process_interleaved(&[0.0; 5]).is_err());
    }

    #[test]
    fn test_reset() {
        let mut resampler = LinearResampler::new(44100, 48000, 2).unwrap();
        let _ = resampler.process_interleaved(&[1.0; 100]).unwrap();
        resampler.reset();
        assert_eq!(resampler.position, 0.0);
        assert!(resampler.prev_samples.iter().all(|&s| s == 0.0));
    }
}
