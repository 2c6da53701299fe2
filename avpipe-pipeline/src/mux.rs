//! Muxer and demuxer wrappers.
//!
//! [`Muxer`] owns a container sink plus one [`OutputStream`] endpoint per
//! stream. It writes the header exactly once, when every endpoint has opened;
//! packets prepared before that moment queue in arrival order and drain the
//! instant the header lands. Closing is ordered and tolerant: every endpoint
//! is drained even if some fail, the trailer goes out only if a header did,
//! and the first failure is reported after the close completes.

use crate::endpoint::{OutputStream, StreamState};
use crate::transform::{
    AudioEncodeTransform, ContainerSink, ContainerSource, StreamInfo, StreamKind,
    VideoEncodeTransform,
};
use crate::{PipelineError, Result};
use avpipe_core::OwnedPacket;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

/// Handle identifying a stream registered with a [`Muxer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle(usize);

/// Writes interleaved packets from multiple streams into one container.
pub struct Muxer {
    sink: Box<dyn ContainerSink>,
    streams: Vec<OutputStream>,
    header_written: bool,
    /// Packets prepared before the header could be written.
    pending: Vec<OwnedPacket>,
    closed: bool,
}

impl Muxer {
    /// Create a muxer over a container sink.
    pub fn new(sink: Box<dyn ContainerSink>) -> Self {
        Self {
            sink,
            streams: Vec::new(),
            header_written: false,
            pending: Vec::new(),
            closed: false,
        }
    }

    /// Register an audio stream.
    pub fn add_audio_stream(
        &mut self,
        transform: Rc<RefCell<dyn AudioEncodeTransform>>,
    ) -> Result<StreamHandle> {
        self.add_stream(OutputStream::new_audio(transform))
    }

    /// Register a video stream.
    pub fn add_video_stream(
        &mut self,
        transform: Rc<RefCell<dyn VideoEncodeTransform>>,
    ) -> Result<StreamHandle> {
        self.add_stream(OutputStream::new_video(transform))
    }

    fn add_stream(&mut self, stream: OutputStream) -> Result<StreamHandle> {
        if self.closed {
            return Err(PipelineError::MuxerClosed);
        }
        if self.header_written {
            return Err(PipelineError::InvalidConfig(
                "cannot add streams after the header is written".into(),
            ));
        }
        self.streams.push(stream);
        Ok(StreamHandle(self.streams.len() - 1))
    }

    /// Number of registered streams.
    pub fn num_streams(&self) -> usize {
        self.streams.len()
    }

    /// Whether the container header has been written.
    pub fn header_written(&self) -> bool {
        self.header_written
    }

    /// Whether the muxer has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Write one encoded packet for the given stream.
    ///
    /// Opens the endpoint lazily on its first packet. Until every registered
    /// endpoint has opened, prepared packets queue instead of hitting the
    /// sink; the queue drains in arrival order right after the header.
    pub fn write_packet(&mut self, handle: StreamHandle, packet: OwnedPacket) -> Result<()> {
        if self.closed {
            return Err(PipelineError::MuxerClosed);
        }

        let prepared = {
            let stream = self
                .streams
                .get_mut(handle.0)
                .ok_or(PipelineError::StreamNotFound(handle.0))?;
            stream.open(self.sink.as_mut())?;
            stream.prepare_packet(packet)?
        };

        if !self.header_written {
            let all_open = self
                .streams
                .iter()
                .all(|s| s.state() == StreamState::Opened);
            if !all_open {
                trace!(
                    stream = handle.0,
                    queued = self.pending.len() + 1,
                    "queueing packet until all streams open"
                );
                self.pending.push(prepared);
                return Ok(());
            }

            self.sink.write_header()?;
            self.header_written = true;
            info!(streams = self.streams.len(), "container header written");

            for queued in std::mem::take(&mut self.pending) {
                self.sink.write_packet(&queued)?;
            }
        }

        self.sink.write_packet(&prepared)
    }

    /// Close the muxer.
    ///
    /// Drains every endpoint in registration order, writes the trailer if a
    /// header was written, and marks the muxer closed. Endpoint failures are
    /// logged and do not stop the remaining endpoints from closing; the first
    /// error is returned once everything has been attempted. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_err: Option<PipelineError> = None;

        for (index, stream) in self.streams.iter_mut().enumerate() {
            match stream.close_packets() {
                Ok(residue) => {
                    if !self.header_written && !residue.is_empty() {
                        debug!(
                            stream = index,
                            dropped = residue.len(),
                            "header never written, dropping residue"
                        );
                        continue;
                    }
                    for packet in residue {
                        if let Err(e) = self.sink.write_packet(&packet) {
                            warn!(stream = index, error = %e, "failed to write residue packet");
                            first_err.get_or_insert(e);
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!(stream = index, error = %e, "failed to close stream endpoint");
                    first_err.get_or_insert(e);
                }
            }
        }

        if self.header_written {
            if let Err(e) = self.sink.write_trailer() {
                warn!(error = %e, "failed to write container trailer");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                info!("muxer closed");
                Ok(())
            }
        }
    }
}

/// Reads packets from a container source.
pub struct Demuxer {
    source: Box<dyn ContainerSource>,
}

impl Demuxer {
    /// Create a demuxer over a container source.
    pub fn new(source: Box<dyn ContainerSource>) -> Self {
        Self { source }
    }

    /// Container format name.
    pub fn format_name(&self) -> &str {
        self.source.format_name()
    }

    /// Number of streams in the container.
    pub fn num_streams(&self) -> usize {
        self.source.num_streams()
    }

    /// Describe one stream.
    pub fn stream_info(&self, index: usize) -> Option<StreamInfo> {
        self.source.stream_info(index)
    }

    /// Describe all streams.
    pub fn streams(&self) -> Vec<StreamInfo> {
        (0..self.source.num_streams())
            .filter_map(|i| self.source.stream_info(i))
            .collect()
    }

    /// First audio stream, if any.
    pub fn best_audio_stream(&self) -> Option<StreamInfo> {
        self.streams()
            .into_iter()
            .find(|s| s.kind == StreamKind::Audio)
    }

    /// First video stream, if any.
    pub fn best_video_stream(&self) -> Option<StreamInfo> {
        self.streams()
            .into_iter()
            .find(|s| s.kind == StreamKind::Video)
    }

    /// Read the next packet, or `None` at end of input.
    pub fn read_packet(&mut self) -> Result<Option<OwnedPacket>> {
        self.source.read_packet()
    }
}
