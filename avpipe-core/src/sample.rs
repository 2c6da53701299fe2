//! Audio sample buffer abstractions.
//!
//! Provides types for representing decoded audio samples in various formats,
//! plus the interleaved-f32 normalization the format converter runs on.

use crate::error::{Error, Result};
use crate::timestamp::{Duration, TimeBase, Timestamp};
use std::fmt;

/// Sample format for audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit, native endian.
    S16,
    /// Signed 32-bit, native endian.
    S32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Unsigned 8-bit planar.
    U8p,
    /// Signed 16-bit planar.
    S16p,
    /// Signed 32-bit planar.
    S32p,
    /// 32-bit float planar.
    F32p,
    /// 64-bit float planar.
    F64p,
}

impl SampleFormat {
    /// Get the number of bytes per sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 | Self::U8p => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
            Self::F64 | Self::F64p => 8,
        }
    }

    /// Check if this is a planar format.
    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::F32p | Self::F64p
        )
    }

    /// Check if this is a floating-point format.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64 | Self::F32p | Self::F64p)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::S16 => write!(f, "s16"),
            Self::S32 => write!(f, "s32"),
            Self::F32 => write!(f, "flt"),
            Self::F64 => write!(f, "dbl"),
            Self::U8p => write!(f, "u8p"),
            Self::S16p => write!(f, "s16p"),
            Self::S32p => write!(f, "s32p"),
            Self::F32p => write!(f, "fltp"),
            Self::F64p => write!(f, "dblp"),
        }
    }
}

/// Channel layout for audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Mono (1 channel).
    Mono,
    /// Stereo (2 channels: left, right).
    #[default]
    Stereo,
    /// 2.1 (3 channels: left, right, LFE).
    Surround21,
    /// Quad (4 channels: FL, FR, BL, BR).
    Quad,
    /// 5.1 (6 channels: FL, FR, FC, LFE, BL, BR).
    Surround51,
    /// 7.1 (8 channels: FL, FR, FC, LFE, BL, BR, SL, SR).
    Surround71,
    /// Custom layout with specified channel count.
    Custom(u32),
}

impl ChannelLayout {
    /// Get the number of channels.
    pub fn channels(&self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround21 => 3,
            Self::Quad => 4,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
            Self::Custom(n) => *n,
        }
    }

    /// Create a layout from channel count.
    pub fn from_channels(channels: u32) -> Self {
        match channels {
            1 => Self::Mono,
            2 => Self::Stereo,
            6 => Self::Surround51,
            8 => Self::Surround71,
            n => Self::Custom(n),
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono => write!(f, "mono"),
            Self::Stereo => write!(f, "stereo"),
            Self::Surround21 => write!(f, "2.1"),
            Self::Quad => write!(f, "quad"),
            Self::Surround51 => write!(f, "5.1"),
            Self::Surround71 => write!(f, "7.1"),
            Self::Custom(n) => write!(f, "{}ch", n),
        }
    }
}

/// A decoded audio sample buffer.
#[derive(Clone)]
pub struct Sample {
    /// Sample data buffer.
    buffer: SampleBuffer,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Duration of this sample buffer.
    pub duration: Duration,
}

impl Sample {
    /// Create a new sample buffer filled with silence.
    pub fn new(
        num_samples: usize,
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        Self {
            buffer: SampleBuffer::new(num_samples, format, layout, sample_rate),
            pts: Timestamp::none(),
            duration: Duration::zero(),
        }
    }

    /// Create from an existing buffer.
    pub fn from_buffer(buffer: SampleBuffer) -> Self {
        let duration = buffer.duration();
        Self {
            buffer,
            pts: Timestamp::none(),
            duration,
        }
    }

    /// Get the number of samples per channel.
    pub fn num_samples(&self) -> usize {
        self.buffer.num_samples
    }

    /// Get the sample format.
    pub fn format(&self) -> SampleFormat {
        self.buffer.format
    }

    /// Get the channel layout.
    pub fn channel_layout(&self) -> ChannelLayout {
        self.buffer.layout
    }

    /// Get the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    /// Get the number of channels.
    pub fn channels(&self) -> u32 {
        self.buffer.layout.channels()
    }

    /// Get the underlying buffer.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Get a mutable reference to the buffer.
    pub fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("num_samples", &self.num_samples())
            .field("format", &self.format())
            .field("layout", &self.channel_layout())
            .field("sample_rate", &self.sample_rate())
            .field("pts", &self.pts)
            .finish()
    }
}

/// Buffer for storing audio sample data.
///
/// Planar formats hold one plane per channel; packed formats hold a single
/// interleaved plane.
#[derive(Clone)]
pub struct SampleBuffer {
    /// Number of samples per channel.
    pub num_samples: usize,
    /// Sample format.
    pub format: SampleFormat,
    /// Channel layout.
    pub layout: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample data (planar: one Vec per channel, packed: single Vec).
    data: Vec<Vec<u8>>,
}

impl SampleBuffer {
    /// Create a new sample buffer filled with silence.
    pub fn new(
        num_samples: usize,
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        let bytes_per_sample = format.bytes_per_sample();
        let channels = layout.channels() as usize;

        let data = if format.is_planar() {
            (0..channels)
                .map(|_| vec![0u8; num_samples * bytes_per_sample])
                .collect()
        } else {
            vec![vec![0u8; num_samples * channels * bytes_per_sample]]
        };

        let mut buffer = Self {
            num_samples,
            format,
            layout,
            sample_rate,
            data,
        };
        buffer.silence();
        buffer
    }

    /// Get the duration of this buffer.
    pub fn duration(&self) -> Duration {
        Duration::new(
            self.num_samples as i64,
            TimeBase::samples(self.sample_rate),
        )
    }

    /// Get the total size in bytes.
    pub fn size(&self) -> usize {
        self.data.iter().map(|d| d.len()).sum()
    }

    /// Get a channel's data (for planar formats).
    pub fn channel(&self, index: u32) -> Option<&[u8]> {
        if self.format.is_planar() {
            self.data.get(index as usize).map(|v| v.as_slice())
        } else {
            None
        }
    }

    /// Get a mutable reference to a channel's data.
    pub fn channel_mut(&mut self, index: u32) -> Option<&mut [u8]> {
        if self.format.is_planar() {
            self.data.get_mut(index as usize).map(|v| v.as_mut_slice())
        } else {
            None
        }
    }

    /// Get interleaved data (for packed formats).
    pub fn data(&self) -> &[u8] {
        &self.data[0]
    }

    /// Get mutable interleaved data.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[0]
    }

    /// Fill all channels with silence.
    pub fn silence(&mut self) {
        let silence_value = match self.format {
            SampleFormat::U8 | SampleFormat::U8p => 128,
            _ => 0,
        };
        for channel in &mut self.data {
            channel.fill(silence_value);
        }
    }

    /// Read the whole buffer as interleaved f32, normalized to [-1, 1].
    ///
    /// Planar input is interleaved on the fly; integer formats are scaled
    /// by their full-scale value.
    pub fn read_interleaved_f32(&self) -> Result<Vec<f32>> {
        let channels = self.layout.channels() as usize;
        let bps = self.format.bytes_per_sample();
        let mut out = Vec::with_capacity(self.num_samples * channels);

        if self.format.is_planar() {
            for s in 0..self.num_samples {
                for plane in &self.data {
                    let start = s * bps;
                    out.push(decode_sample(self.format, &plane[start..start + bps])?);
                }
            }
        } else {
            for chunk in self.data[0].chunks_exact(bps) {
                out.push(decode_sample(self.format, chunk)?);
            }
        }
        Ok(out)
    }

    /// Overwrite the whole buffer from interleaved f32 data.
    ///
    /// `src` must contain exactly `num_samples * channels` values.
    pub fn write_interleaved_f32(&mut self, src: &[f32]) -> Result<()> {
        let channels = self.layout.channels() as usize;
        let expected = self.num_samples * channels;
        if src.len() != expected {
            return Err(Error::invalid_param(format!(
                "interleaved write of {} values into a buffer holding {}",
                src.len(),
                expected
            )));
        }

        let bps = self.format.bytes_per_sample();
        if self.format.is_planar() {
            for (i, &value) in src.iter().enumerate() {
                let (s, ch) = (i / channels, i % channels);
                let start = s * bps;
                encode_sample(self.format, value, &mut self.data[ch][start..start + bps]);
            }
        } else {
            for (chunk, &value) in self.data[0].chunks_exact_mut(bps).zip(src.iter()) {
                encode_sample(self.format, value, chunk);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("num_samples", &self.num_samples)
            .field("format", &self.format)
            .field("layout", &self.layout)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

fn decode_sample(format: SampleFormat, bytes: &[u8]) -> Result<f32> {
    Ok(match format {
        SampleFormat::U8 | SampleFormat::U8p => (bytes[0] as f32 - 128.0) / 128.0,
        SampleFormat::S16 | SampleFormat::S16p => {
            i16::from_ne_bytes([bytes[0], bytes[1]]) as f32 / 32768.0
        }
        SampleFormat::S32 | SampleFormat::S32p => {
            i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32 / 2147483648.0
        }
        SampleFormat::F32 | SampleFormat::F32p => {
            f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        }
        SampleFormat::F64 | SampleFormat::F64p => {
            let mut b = [0u8; 8];
            b.copy_from_slice(bytes);
            f64::from_ne_bytes(b) as f32
        }
    })
}

fn encode_sample(format: SampleFormat, value: f32, out: &mut [u8]) {
    match format {
        SampleFormat::U8 | SampleFormat::U8p => {
            out[0] = ((value * 128.0) + 128.0).clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16 | SampleFormat::S16p => {
            let v = (value * 32768.0).clamp(-32768.0, 32767.0) as i16;
            out.copy_from_slice(&v.to_ne_bytes());
        }
        SampleFormat::S32 | SampleFormat::S32p => {
            let v = (value as f64 * 2147483648.0).clamp(i32::MIN as f64, i32::MAX as f64) as i32;
            out.copy_from_slice(&v.to_ne_bytes());
        }
        SampleFormat::F32 | SampleFormat::F32p => {
            out.copy_from_slice(&value.to_ne_bytes());
        }
        SampleFormat::F64 | SampleFormat::F64p => {
            out.copy_from_slice(&(value as f64).to_ne_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format() {
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert!(!SampleFormat::S16.is_planar());
        assert!(SampleFormat::S16p.is_planar());
    }

    #[test]
    fn test_channel_layout() {
        assert_eq!(ChannelLayout::Stereo.channels(), 2);
        assert_eq!(ChannelLayout::Surround51.channels(), 6);
        assert_eq!(ChannelLayout::from_channels(2), ChannelLayout::Stereo);
    }

    #[test]
    fn test_sample_buffer_creation() {
        let buffer = SampleBuffer::new(1024, SampleFormat::S16, ChannelLayout::Stereo, 48000);
        assert_eq!(buffer.num_samples, 1024);
        assert_eq!(buffer.size(), 1024 * 2 * 2);
    }

    #[test]
    fn test_planar_buffer_planes() {
        let buffer = SampleBuffer::new(1024, SampleFormat::F32p, ChannelLayout::Stereo, 48000);
        assert!(buffer.channel(0).is_some());
        assert!(buffer.channel(1).is_some());
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn test_f32_roundtrip_packed_s16() {
        let mut buffer = SampleBuffer::new(4, SampleFormat::S16, ChannelLayout::Stereo, 48000);
        let src: Vec<f32> = (0..8).map(|i| i as f32 / 16.0).collect();
        buffer.write_interleaved_f32(&src).unwrap();
        let back = buffer.read_interleaved_f32().unwrap();
        for (a, b) in src.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1.0 / 32768.0, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_f32_roundtrip_planar() {
        let mut buffer = SampleBuffer::new(3, SampleFormat::F32p, ChannelLayout::Stereo, 44100);
        let src = vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        buffer.write_interleaved_f32(&src).unwrap();
        assert_eq!(buffer.read_interleaved_f32().unwrap(), src);
        // left channel plane holds 0.1, 0.2, 0.3
        let left = buffer.channel(0).unwrap();
        assert_eq!(f32::from_ne_bytes([left[0], left[1], left[2], left[3]]), 0.1);
    }

    #[test]
    fn test_write_length_mismatch() {
        let mut buffer = SampleBuffer::new(4, SampleFormat::F32, ChannelLayout::Mono, 48000);
        assert!(buffer.write_interleaved_f32(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_u8_silence() {
        let buffer = SampleBuffer::new(2, SampleFormat::U8, ChannelLayout::Mono, 8000);
        assert_eq!(buffer.data(), &[128, 128]);
        assert_eq!(buffer.read_interleaved_f32().unwrap(), vec![0.0, 0.0]);
    }
}
