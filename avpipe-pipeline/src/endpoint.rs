//! Stream endpoints.
//!
//! An [`OutputStream`] couples an encoder transform to a slot in a container.
//! It walks a one-way lifecycle: unopened until the first packet forces
//! registration with the container, open while packets flow, closed once the
//! encoder is drained. A closed endpoint never reopens.

use crate::transform::{AudioEncodeTransform, ContainerSink, StreamBinding, StreamInfo, VideoEncodeTransform};
use crate::{PipelineError, Result};
use avpipe_core::{OwnedPacket, Packet};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Lifecycle state of a stream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created but not yet registered with the container.
    Unopened,
    /// Registered; packets may flow.
    Opened,
    /// Drained and finished. Terminal.
    Closed,
}

/// The encoder behind an output endpoint.
///
/// Shared with the stage that feeds it, so the endpoint can drain the same
/// encoder at close time.
pub enum OutputTransform {
    Audio(Rc<RefCell<dyn AudioEncodeTransform>>),
    Video(Rc<RefCell<dyn VideoEncodeTransform>>),
}

/// An output stream endpoint inside a muxer.
pub struct OutputStream {
    transform: OutputTransform,
    state: StreamState,
    binding: Option<StreamBinding>,
}

impl OutputStream {
    /// Create an audio endpoint.
    pub fn new_audio(transform: Rc<RefCell<dyn AudioEncodeTransform>>) -> Self {
        Self {
            transform: OutputTransform::Audio(transform),
            state: StreamState::Unopened,
            binding: None,
        }
    }

    /// Create a video endpoint.
    pub fn new_video(transform: Rc<RefCell<dyn VideoEncodeTransform>>) -> Self {
        Self {
            transform: OutputTransform::Video(transform),
            state: StreamState::Unopened,
            binding: None,
        }
    }

    /// Get the lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Container stream index, once opened.
    pub fn stream_index(&self) -> Option<u32> {
        self.binding.map(|b| b.index)
    }

    /// Register this endpoint with the container.
    ///
    /// Idempotent while open; a closed endpoint cannot reopen.
    pub fn open(&mut self, sink: &mut dyn ContainerSink) -> Result<()> {
        match self.state {
            StreamState::Opened => Ok(()),
            StreamState::Closed => Err(PipelineError::StreamClosed),
            StreamState::Unopened => {
                let config = match &self.transform {
                    OutputTransform::Audio(t) => t.borrow().stream_config(),
                    OutputTransform::Video(t) => t.borrow().stream_config(),
                };
                let binding = sink.add_stream(&config)?;
                debug!(index = binding.index, codec = %config.codec_name, "output stream opened");
                self.binding = Some(binding);
                self.state = StreamState::Opened;
                Ok(())
            }
        }
    }

    /// Rescale a packet into the container time base and stamp its index.
    ///
    /// Only valid while open.
    pub fn prepare_packet(&self, mut packet: OwnedPacket) -> Result<OwnedPacket> {
        let binding = match (self.state, &self.binding) {
            (StreamState::Opened, Some(binding)) => binding,
            (StreamState::Closed, _) => return Err(PipelineError::StreamClosed),
            _ => return Err(PipelineError::StreamNotOpen),
        };
        packet.rescale(binding.time_base);
        Ok(packet.with_stream_index(binding.index))
    }

    /// Drain the encoder and return its residue, prepared for the container.
    ///
    /// Transitions to closed; repeated calls return nothing. An endpoint that
    /// never opened closes silently with no packets.
    pub fn close_packets(&mut self) -> Result<Vec<OwnedPacket>> {
        match self.state {
            StreamState::Closed => return Ok(Vec::new()),
            StreamState::Unopened => {
                self.state = StreamState::Closed;
                return Ok(Vec::new());
            }
            StreamState::Opened => {}
        }

        let residue = match &self.transform {
            OutputTransform::Audio(t) => t.borrow_mut().flush()?,
            OutputTransform::Video(t) => t.borrow_mut().flush()?,
        };
        let prepared = residue
            .into_iter()
            .map(|p| self.prepare_packet(p))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            index = self.binding.map(|b| b.index),
            residue = prepared.len(),
            "output stream closed"
        );
        self.state = StreamState::Closed;
        Ok(prepared)
    }
}

/// An input stream endpoint, wrapping the description of one container stream.
#[derive(Debug, Clone)]
pub struct InputStream {
    info: StreamInfo,
}

impl InputStream {
    /// Create an input endpoint from container stream information.
    pub fn new(info: StreamInfo) -> Self {
        Self { info }
    }

    /// Stream index within the container.
    pub fn index(&self) -> usize {
        self.info.index
    }

    /// Stream description.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Whether a packet belongs to this stream.
    pub fn accepts(&self, packet: &Packet<'_>) -> bool {
        packet.stream_index as usize == self.info.index
    }
}
