//! Seam traits between the pipeline and concrete codecs and containers.
//!
//! The pipeline drives data through these traits and never touches codec or
//! container internals directly, so any implementation (software codecs,
//! hardware wrappers, test doubles) can be plugged in.

use crate::Result;
use avpipe_convert::AudioSpec;
use avpipe_core::{Frame, OwnedPacket, Packet, Sample, TimeBase};

/// Kind of elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Audio,
    Video,
}

/// Parameters a container needs to register an output stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Stream kind.
    pub kind: StreamKind,
    /// Codec name, e.g. "aac" or "h264".
    pub codec_name: String,
    /// Time base packets are produced in.
    pub time_base: TimeBase,
    /// Sample rate (audio).
    pub sample_rate: Option<u32>,
    /// Channel count (audio).
    pub channels: Option<u32>,
    /// Width (video).
    pub width: Option<u32>,
    /// Height (video).
    pub height: Option<u32>,
}

/// Handle returned by a container when a stream is registered.
#[derive(Debug, Clone, Copy)]
pub struct StreamBinding {
    /// Container-assigned stream index.
    pub index: u32,
    /// Time base the container stores packets in.
    pub time_base: TimeBase,
}

/// Description of a stream found in a container source.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Stream index within the container.
    pub index: usize,
    /// Stream kind.
    pub kind: StreamKind,
    /// Time base packet timestamps are expressed in.
    pub time_base: TimeBase,
    /// Codec name.
    pub codec_name: String,
    /// Sample rate (audio).
    pub sample_rate: Option<u32>,
    /// Channel count (audio).
    pub channels: Option<u32>,
    /// Width (video).
    pub width: Option<u32>,
    /// Height (video).
    pub height: Option<u32>,
}

/// Audio encoder seam.
///
/// [`spec`](AudioEncodeTransform::spec) tells the pipeline what input the
/// encoder demands; the format converter reshapes decoded audio to match
/// before any sample reaches [`send_sample`](AudioEncodeTransform::send_sample).
pub trait AudioEncodeTransform {
    /// Input parameters this encoder requires.
    fn spec(&self) -> AudioSpec;

    /// Container registration parameters for the encoded stream.
    fn stream_config(&self) -> StreamConfig;

    /// Encode one frame of samples. May return zero or more packets;
    /// encoders with lookahead buffer internally.
    fn send_sample(&mut self, sample: &Sample) -> Result<Vec<OwnedPacket>>;

    /// Drain any buffered packets.
    fn flush(&mut self) -> Result<Vec<OwnedPacket>>;
}

/// Video encoder seam.
pub trait VideoEncodeTransform {
    /// Container registration parameters for the encoded stream.
    fn stream_config(&self) -> StreamConfig;

    /// Encode one frame.
    fn send_frame(&mut self, frame: &Frame) -> Result<Vec<OwnedPacket>>;

    /// Drain any buffered packets.
    fn flush(&mut self) -> Result<Vec<OwnedPacket>>;
}

/// Audio decoder seam.
pub trait AudioDecodeTransform {
    /// Decode one packet. May return zero or more sample frames.
    fn send_packet(&mut self, packet: &Packet<'_>) -> Result<Vec<Sample>>;

    /// Drain any buffered frames.
    fn flush(&mut self) -> Result<Vec<Sample>>;
}

/// Video decoder seam.
pub trait VideoDecodeTransform {
    /// Decode one packet. May return zero or more frames.
    fn send_packet(&mut self, packet: &Packet<'_>) -> Result<Vec<Frame>>;

    /// Drain any buffered frames.
    fn flush(&mut self) -> Result<Vec<Frame>>;
}

/// Container writer seam.
pub trait ContainerSink {
    /// Container format name, e.g. "mp4".
    fn format_name(&self) -> &str;

    /// Register a stream. Must be called before [`write_header`](ContainerSink::write_header).
    fn add_stream(&mut self, config: &StreamConfig) -> Result<StreamBinding>;

    /// Write the container header.
    fn write_header(&mut self) -> Result<()>;

    /// Write one packet. The header must have been written.
    fn write_packet(&mut self, packet: &OwnedPacket) -> Result<()>;

    /// Write the container trailer.
    fn write_trailer(&mut self) -> Result<()>;
}

/// Container reader seam.
pub trait ContainerSource {
    /// Container format name.
    fn format_name(&self) -> &str;

    /// Number of streams in the container.
    fn num_streams(&self) -> usize;

    /// Describe one stream.
    fn stream_info(&self, index: usize) -> Option<StreamInfo>;

    /// Read the next packet, or `None` at end of input.
    fn read_packet(&mut self) -> Result<Option<OwnedPacket>>;
}
