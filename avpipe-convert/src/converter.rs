//! Sample-accurate audio format conversion.
//!
//! [`AudioConverter`] reconciles an arbitrary decoded audio stream with the
//! format an encoder demands: sample format, channel layout, sample rate and
//! frame size. Input frames of any size go in; frames of exactly the target
//! size come out, with timestamps derived from the cumulative sample count so
//! the output timeline is gapless regardless of how input was chunked.
//!
//! The converter binds lazily: target parameters are fixed at construction,
//! but the source parameters are taken from the first frame pushed through
//! [`AudioConverter::process_frame`]. Frames that later disagree with that
//! binding are rejected.

use crate::error::{ConvertError, Result};
use crate::linear::LinearResampler;
use avpipe_core::{ChannelLayout, Duration, Sample, SampleFormat, TimeBase, Timestamp};

/// Staging capacity, in samples per channel, used when the target codec
/// accepts variable frame sizes and no fixed size is configured.
pub const VARIABLE_FRAME_CAPACITY: usize = 10000;

/// Target audio parameters for a conversion.
#[derive(Debug, Clone)]
pub struct AudioSpec {
    /// Target sample format.
    pub format: SampleFormat,
    /// Target channel layout.
    pub layout: ChannelLayout,
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Fixed samples per output frame, or `None` for variable frame sizes.
    pub frame_size: Option<usize>,
    /// Time base output timestamps are expressed in.
    pub time_base: TimeBase,
}

impl AudioSpec {
    /// Samples per channel an output frame holds at most.
    pub fn capacity(&self) -> usize {
        self.frame_size.unwrap_or(VARIABLE_FRAME_CAPACITY)
    }

    fn describe(format: SampleFormat, layout: ChannelLayout, rate: u32) -> String {
        format!("{}/{}/{} Hz", format, layout, rate)
    }
}

/// Destination for converted frames.
///
/// The converter delivers each completed frame through this trait the moment
/// it is full, so downstream encoding can proceed while input keeps arriving.
pub trait ConvertedFrameSink {
    /// Accept one converted frame.
    fn write_converted(
        &mut self,
        sample: &Sample,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Source parameters captured from the first input frame.
#[derive(Debug)]
struct Binding {
    format: SampleFormat,
    layout: ChannelLayout,
    sample_rate: u32,
    /// Present only when source and target rates differ.
    resampler: Option<LinearResampler>,
}

#[derive(Debug)]
enum BindState {
    /// No input seen yet; source parameters unknown.
    Unbound,
    /// Bound to the first frame's parameters.
    Bound(Binding),
    /// Flushed; no further input accepted.
    Closed,
}

/// Converts decoded audio into a fixed target format with exact frame sizes
/// and a gapless, sample-counter-derived timeline.
pub struct AudioConverter {
    spec: AudioSpec,
    state: BindState,
    /// Interleaved f32 samples awaiting a full output frame.
    pending: Vec<f32>,
    /// Total samples per channel emitted so far, in the target rate.
    samples_emitted: i64,
}

impl AudioConverter {
    /// Create a converter for the given target parameters.
    ///
    /// # Errors
    /// Returns an error if the target sample rate, channel count or fixed
    /// frame size is zero.
    pub fn new(spec: AudioSpec) -> Result<Self> {
        if spec.sample_rate == 0 {
            return Err(ConvertError::InvalidSampleRate {
                rate: spec.sample_rate,
            });
        }
        if spec.layout.channels() == 0 {
            return Err(ConvertError::InvalidChannelCount { count: 0 });
        }
        if spec.frame_size == Some(0) {
            return Err(ConvertError::InvalidFrameSize { size: 0 });
        }

        Ok(Self {
            spec,
            state: BindState::Unbound,
            pending: Vec::new(),
            samples_emitted: 0,
        })
    }

    /// Get the target parameters.
    pub fn spec(&self) -> &AudioSpec {
        &self.spec
    }

    /// Total samples per channel emitted so far, in the target rate.
    pub fn samples_emitted(&self) -> i64 {
        self.samples_emitted
    }

    /// Whether the converter has bound to a source yet.
    pub fn is_bound(&self) -> bool {
        matches!(self.state, BindState::Bound(_))
    }

    /// Push one decoded frame through the converter.
    ///
    /// The first frame fixes the source parameters. Completed output frames
    /// are delivered to `sink` as they fill; if the accumulated samples do
    /// not yet fill a frame, nothing is delivered and the samples wait for
    /// the next call.
    pub fn process_frame(
        &mut self,
        frame: &Sample,
        sink: &mut dyn ConvertedFrameSink,
    ) -> Result<()> {
        match &self.state {
            BindState::Closed => return Err(ConvertError::Closed),
            BindState::Unbound => self.bind(frame)?,
            BindState::Bound(binding) => {
                if frame.format() != binding.format
                    || frame.channel_layout() != binding.layout
                    || frame.sample_rate() != binding.sample_rate
                {
                    return Err(ConvertError::FormatMismatch {
                        expected: AudioSpec::describe(
                            binding.format,
                            binding.layout,
                            binding.sample_rate,
                        ),
                        got: AudioSpec::describe(
                            frame.format(),
                            frame.channel_layout(),
                            frame.sample_rate(),
                        ),
                    });
                }
            }
        }

        let interleaved = frame
            .buffer()
            .read_interleaved_f32()
            .map_err(|e| ConvertError::internal(e.to_string()))?;

        let src_channels = frame.channels() as usize;
        let dst_channels = self.spec.layout.channels() as usize;
        let remixed = remix(interleaved, src_channels, dst_channels);

        let converted = match &mut self.state {
            BindState::Bound(Binding {
                resampler: Some(r), ..
            }) => r.process_interleaved(&remixed)?,
            _ => remixed,
        };
        self.pending.extend_from_slice(&converted);

        self.drain_full_frames(sink)
    }

    /// Flush the converter, emitting any accumulated partial frame.
    ///
    /// The final frame carries its true residual sample count; it is not
    /// padded to the target frame size. Safe to call repeatedly and before
    /// any input arrived. After flushing the converter rejects further input.
    pub fn flush(&mut self, sink: &mut dyn ConvertedFrameSink) -> Result<()> {
        match self.state {
            BindState::Closed => return Ok(()),
            BindState::Unbound => {
                self.state = BindState::Closed;
                return Ok(());
            }
            BindState::Bound(_) => {}
        }

        let channels = self.spec.layout.channels() as usize;
        let residual = self.pending.len() / channels;
        if residual > 0 {
            let data = std::mem::take(&mut self.pending);
            self.emit_frame(&data, residual, sink)?;
        }
        self.state = BindState::Closed;
        Ok(())
    }

    fn bind(&mut self, frame: &Sample) -> Result<()> {
        let src_rate = frame.sample_rate();
        if src_rate == 0 {
            return Err(ConvertError::InvalidSampleRate { rate: src_rate });
        }
        if frame.channels() == 0 {
            return Err(ConvertError::InvalidChannelCount { count: 0 });
        }

        let resampler = if src_rate != self.spec.sample_rate {
            Some(LinearResampler::new(
                src_rate,
                self.spec.sample_rate,
                self.spec.layout.channels() as usize,
            )?)
        } else {
            None
        };

        self.state = BindState::Bound(Binding {
            format: frame.format(),
            layout: frame.channel_layout(),
            sample_rate: src_rate,
            resampler,
        });
        Ok(())
    }

    fn drain_full_frames(&mut self, sink: &mut dyn ConvertedFrameSink) -> Result<()> {
        let capacity = self.spec.capacity();
        let channels = self.spec.layout.channels() as usize;
        let frame_len = capacity * channels;

        while self.pending.len() >= frame_len {
            let data: Vec<f32> = self.pending.drain(..frame_len).collect();
            self.emit_frame(&data, capacity, sink)?;
        }
        Ok(())
    }

    fn emit_frame(
        &mut self,
        data: &[f32],
        num_samples: usize,
        sink: &mut dyn ConvertedFrameSink,
    ) -> Result<()> {
        let mut sample = Sample::new(
            num_samples,
            self.spec.format,
            self.spec.layout,
            self.spec.sample_rate,
        );
        sample
            .buffer_mut()
            .write_interleaved_f32(data)
            .map_err(|e| ConvertError::internal(e.to_string()))?;

        // Timestamps come from the cumulative counter, not from input pts,
        // so the output timeline stays gapless however input was chunked.
        let sample_base = TimeBase::samples(self.spec.sample_rate);
        sample.pts = Timestamp::new(
            sample_base.convert(self.samples_emitted, self.spec.time_base),
            self.spec.time_base,
        );
        sample.duration = Duration::new(num_samples as i64, sample_base);

        sink.write_converted(&sample)?;
        self.samples_emitted += num_samples as i64;
        Ok(())
    }
}

impl std::fmt::Debug for AudioConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioConverter")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("pending_samples", &self.pending.len())
            .field("samples_emitted", &self.samples_emitted)
            .finish()
    }
}

/// Map interleaved samples from one channel count to another.
///
/// Identity when counts match, replication for mono upmix, averaging for
/// mono downmix, and index-modulo copying otherwise.
fn remix(input: Vec<f32>, src_channels: usize, dst_channels: usize) -> Vec<f32> {
    if src_channels == dst_channels {
        return input;
    }

    let frames = input.len() / src_channels;
    let mut output = Vec::with_capacity(frames * dst_channels);

    for frame in input.chunks_exact(src_channels) {
        if src_channels == 1 {
            output.extend(std::iter::repeat(frame[0]).take(dst_channels));
        } else if dst_channels == 1 {
            output.push(frame.iter().sum::<f32>() / src_channels as f32);
        } else {
            for ch in 0..dst_channels {
                output.push(frame[ch % src_channels]);
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remix_identity() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(remix(input.clone(), 2, 2), input);
    }

    #[test]
    fn test_remix_mono_upmix() {
        assert_eq!(remix(vec![0.5, -0.5], 1, 2), vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_remix_downmix_to_mono() {
        assert_eq!(remix(vec![1.0, 0.0, 0.5, 0.5], 2, 1), vec![0.5, 0.5]);
    }

    #[test]
    fn test_remix_modulo() {
        // stereo to quad copies L R L R
        assert_eq!(remix(vec![0.1, 0.2], 2, 4), vec![0.1, 0.2, 0.1, 0.2]);
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let spec = AudioSpec {
            format: SampleFormat::S16,
            layout: ChannelLayout::Stereo,
            sample_rate: 0,
            frame_size: Some(1024),
            time_base: TimeBase::new(1, 48000),
        };
        assert!(AudioConverter::new(spec).is_err());
    }

    #[test]
    fn test_zero_frame_size_rejected() {
        let spec = AudioSpec {
            format: SampleFormat::S16,
            layout: ChannelLayout::Stereo,
            sample_rate: 48000,
            frame_size: Some(0),
            time_base: TimeBase::new(1, 48000),
        };
        assert!(AudioConverter::new(spec).is_err());
    }

    #[test]
    fn test_variable_capacity_default() {
        let spec = AudioSpec {
            format: SampleFormat::F32,
            layout: ChannelLayout::Mono,
            sample_rate: 48000,
            frame_size: None,
            time_base: TimeBase::new(1, 48000),
        };
        assert_eq!(spec.capacity(), VARIABLE_FRAME_CAPACITY);
    }
}
