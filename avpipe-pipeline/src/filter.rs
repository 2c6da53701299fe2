//! Filter abstractions for video and audio processing.

use crate::{PipelineError, Result};
use avpipe_core::frame::Frame;
use avpipe_core::sample::Sample;

/// Base filter trait.
pub trait Filter: Send {
    /// Get filter name.
    fn name(&self) -> &str;

    /// Check if filter is enabled.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Video filter trait.
pub trait VideoFilter: Filter {
    /// Process a video frame.
    fn process(&mut self, frame: Frame) -> Result<Frame>;

    /// Flush any buffered frames.
    fn flush(&mut self) -> Result<Vec<Frame>> {
        Ok(Vec::new())
    }
}

/// Audio filter trait.
pub trait AudioFilter: Filter {
    /// Process audio samples.
    fn process(&mut self, sample: Sample) -> Result<Sample>;

    /// Flush any buffered samples.
    fn flush(&mut self) -> Result<Vec<Sample>> {
        Ok(Vec::new())
    }
}

/// Chain of filters.
pub struct FilterChain<F: ?Sized> {
    filters: Vec<Box<F>>,
}

impl<F: ?Sized> Default for FilterChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> FilterChain<F> {
    /// Create a new empty filter chain.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the chain.
    pub fn add(&mut self, filter: Box<F>) {
        self.filters.push(filter);
    }

    /// Get number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if chain is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FilterChain<dyn VideoFilter> {
    /// Process a video frame through all filters.
    pub fn process(&mut self, mut frame: Frame) -> Result<Frame> {
        for filter in &mut self.filters {
            if filter.is_enabled() {
                frame = filter.process(frame)?;
            }
        }
        Ok(frame)
    }

    /// Flush all filters.
    pub fn flush(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        for filter in &mut self.filters {
            frames.extend(filter.flush()?);
        }
        Ok(frames)
    }
}

impl FilterChain<dyn AudioFilter> {
    /// Process audio samples through all filters.
    pub fn process(&mut self, mut sample: Sample) -> Result<Sample> {
        for filter in &mut self.filters {
            if filter.is_enabled() {
                sample = filter.process(sample)?;
            }
        }
        Ok(sample)
    }

    /// Flush all filters.
    pub fn flush(&mut self) -> Result<Vec<Sample>> {
        let mut samples = Vec::new();
        for filter in &mut self.filters {
            samples.extend(filter.flush()?);
        }
        Ok(samples)
    }
}

/// Volume filter for audio level adjustment.
pub struct VolumeFilter {
    name: String,
    gain: f32,
    enabled: bool,
}

impl VolumeFilter {
    /// Create a new volume filter with gain in dB.
    pub fn new(gain_db: f32) -> Self {
        Self {
            name: format!("volume_{:.1}dB", gain_db),
            gain: 10.0_f32.powf(gain_db / 20.0),
            enabled: true,
        }
    }

    /// Set gain in dB.
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain = 10.0_f32.powf(gain_db / 20.0);
    }

    /// Enable or disable the filter.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Filter for VolumeFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl AudioFilter for VolumeFilter {
    fn process(&mut self, mut sample: Sample) -> Result<Sample> {
        let buffer = sample.buffer_mut();
        let mut values = buffer
            .read_interleaved_f32()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        for v in &mut values {
            *v = (*v * self.gain).clamp(-1.0, 1.0);
        }
        buffer
            .write_interleaved_f32(&values)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(sample)
    }
}

/// Null video filter (pass-through).
pub struct NullVideoFilter {
    name: String,
}

impl Default for NullVideoFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl NullVideoFilter {
    /// Create a new null filter.
    pub fn new() -> Self {
        Self {
            name: "null".to_string(),
        }
    }
}

impl Filter for NullVideoFilter {
    fn name(&self) -> &str {
        &self.name
    }
}

impl VideoFilter for NullVideoFilter {
    fn process(&mut self, frame: Frame) -> Result<Frame> {
        Ok(frame)
    }
}

/// Null audio filter (pass-through).
pub struct NullAudioFilter {
    name: String,
}

impl Default for NullAudioFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl NullAudioFilter {
    /// Create a new null filter.
    pub fn new() -> Self {
        Self {
            name: "anull".to_string(),
        }
    }
}

impl Filter for NullAudioFilter {
    fn name(&self) -> &str {
        &self.name
    }
}

impl AudioFilter for NullAudioFilter {
    fn process(&mut self, sample: Sample) -> Result<Sample> {
        Ok(sample)
    }
}
