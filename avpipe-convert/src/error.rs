//! Error types for audio format conversion.

use avpipe_core::SampleFormat;
use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur during audio format conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Invalid sample rate specified.
    #[error("Invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: u32 },

    /// Invalid channel count.
    #[error("Invalid channel count: {count} (must be > 0)")]
    InvalidChannelCount { count: usize },

    /// Invalid fixed frame size.
    #[error("Invalid frame size: {size} (must be > 0)")]
    InvalidFrameSize { size: usize },

    /// Sample format not supported by the converter.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(SampleFormat),

    /// Input buffer size mismatch.
    #[error("Input buffer size {actual} is not divisible by channel count {channels}")]
    BufferSizeMismatch { actual: usize, channels: usize },

    /// Source properties changed after the converter bound to the first frame.
    #[error("Source format changed after binding: expected {expected}, got {got}")]
    FormatMismatch { expected: String, got: String },

    /// The converter has been flushed and accepts no more input.
    #[error("Converter is closed")]
    Closed,

    /// The downstream sink rejected a converted frame.
    #[error("Sink delivery failed: {0}")]
    Delivery(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Internal processing error.
    #[error("Internal conversion error: {message}")]
    Internal { message: String },
}

impl ConvertError {
    /// Create an internal error with a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
