//! Pipeline error types.

use avpipe_convert::ConvertError;
use avpipe_core::error::Error as CoreError;
use thiserror::Error;

/// Pipeline error type.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Audio conversion error.
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stream not found.
    #[error("Stream {0} not found")]
    StreamNotFound(usize),

    /// Endpoint has not been opened against the container yet.
    #[error("Stream endpoint is not open")]
    StreamNotOpen,

    /// Endpoint has been closed and accepts no more packets.
    #[error("Stream endpoint is closed")]
    StreamClosed,

    /// The muxer has been closed.
    #[error("Muxer is closed")]
    MuxerClosed,

    /// Pipeline aborted.
    #[error("Pipeline aborted: {0}")]
    Aborted(String),
}

/// Pipeline result type.
pub type Result<T> = std::result::Result<T, PipelineError>;
