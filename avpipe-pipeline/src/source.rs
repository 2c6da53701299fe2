//! Pipeline sources.
//!
//! A source produces data one unit at a time under the driver's control.
//! Stepping a source pulls one input unit (a packet, a frame) and pushes
//! whatever comes out down its sink. A source is primed once its sink has
//! produced output downstream; sources whose codecs buffer lookahead need
//! several steps before that happens, which is what
//! [`Source::prepare`] loops for.

use crate::endpoint::InputStream;
use crate::filter::{AudioFilter, FilterChain, VideoFilter};
use crate::mux::Demuxer;
use crate::stage::{FrameSink, SampleSink};
use crate::transform::{AudioDecodeTransform, VideoDecodeTransform};
use crate::{PipelineError, Result};
use avpipe_core::{Frame, Sample};
use tracing::{debug, trace};

/// A unit-at-a-time producer of pipeline data.
pub trait Source {
    /// Source name, for diagnostics.
    fn name(&self) -> &str;

    /// Produce and process one unit of input.
    ///
    /// Once the source is exhausted further steps do nothing.
    fn step(&mut self) -> Result<()>;

    /// Whether the source is exhausted.
    fn is_done(&self) -> bool;

    /// Whether output has reached the far end of this source's chain.
    fn is_primed(&self) -> bool;

    /// Step until primed or exhausted.
    ///
    /// Output stream endpoints open lazily on their first packet; priming
    /// every source before free-running guarantees all endpoints open and
    /// the container header can be written.
    fn prepare(&mut self) -> Result<()> {
        while !self.is_primed() && !self.is_done() {
            self.step()?;
        }
        Ok(())
    }
}

enum Route {
    Audio {
        input: InputStream,
        decoder: Box<dyn AudioDecodeTransform>,
        filters: FilterChain<dyn AudioFilter>,
        sink: Box<dyn SampleSink>,
    },
    Video {
        input: InputStream,
        decoder: Box<dyn VideoDecodeTransform>,
        filters: FilterChain<dyn VideoFilter>,
        sink: Box<dyn FrameSink>,
    },
}

impl Route {
    fn accepts(&self, packet: &avpipe_core::Packet<'_>) -> bool {
        match self {
            Route::Audio { input, .. } | Route::Video { input, .. } => input.accepts(packet),
        }
    }

    fn sink_primed(&self) -> bool {
        match self {
            Route::Audio { sink, .. } => sink.is_primed(),
            Route::Video { sink, .. } => sink.is_primed(),
        }
    }
}

/// Source that demuxes a container and routes packets to per-stream chains.
///
/// Each routed stream gets its own decoder, filter chain and sink. Packets
/// for streams with no route are skipped. One step reads one packet; at end
/// of input the decoders and filters drain and every sink is finished.
pub struct DemuxSource {
    name: String,
    demuxer: Demuxer,
    routes: Vec<Route>,
    done: bool,
}

impl DemuxSource {
    /// Create a source over a demuxer.
    pub fn new(name: impl Into<String>, demuxer: Demuxer) -> Self {
        Self {
            name: name.into(),
            demuxer,
            routes: Vec::new(),
            done: false,
        }
    }

    /// Access the demuxer, e.g. for stream discovery.
    pub fn demuxer(&self) -> &Demuxer {
        &self.demuxer
    }

    /// Route an audio stream through a decoder and filters into a sink.
    pub fn route_audio(
        &mut self,
        stream_index: usize,
        decoder: Box<dyn AudioDecodeTransform>,
        filters: FilterChain<dyn AudioFilter>,
        sink: Box<dyn SampleSink>,
    ) -> Result<()> {
        let info = self
            .demuxer
            .stream_info(stream_index)
            .ok_or(PipelineError::StreamNotFound(stream_index))?;
        self.routes.push(Route::Audio {
            input: InputStream::new(info),
            decoder,
            filters,
            sink,
        });
        Ok(())
    }

    /// Route a video stream through a decoder and filters into a sink.
    pub fn route_video(
        &mut self,
        stream_index: usize,
        decoder: Box<dyn VideoDecodeTransform>,
        filters: FilterChain<dyn VideoFilter>,
        sink: Box<dyn FrameSink>,
    ) -> Result<()> {
        let info = self
            .demuxer
            .stream_info(stream_index)
            .ok_or(PipelineError::StreamNotFound(stream_index))?;
        self.routes.push(Route::Video {
            input: InputStream::new(info),
            decoder,
            filters,
            sink,
        });
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        debug!(source = %self.name, "input exhausted, draining routes");
        for route in &mut self.routes {
            match route {
                Route::Audio {
                    decoder,
                    filters,
                    sink,
                    ..
                } => {
                    for sample in decoder.flush()? {
                        let sample = filters.process(sample)?;
                        sink.write_sample(&sample)?;
                    }
                    for sample in filters.flush()? {
                        sink.write_sample(&sample)?;
                    }
                    sink.finish()?;
                }
                Route::Video {
                    decoder,
                    filters,
                    sink,
                    ..
                } => {
                    for frame in decoder.flush()? {
                        let frame = filters.process(frame)?;
                        sink.write_frame(&frame)?;
                    }
                    for frame in filters.flush()? {
                        sink.write_frame(&frame)?;
                    }
                    sink.finish()?;
                }
            }
        }
        self.done = true;
        Ok(())
    }
}

impl Source for DemuxSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }

        let packet = match self.demuxer.read_packet()? {
            Some(packet) => packet,
            None => return self.drain(),
        };

        let Some(route) = self.routes.iter_mut().find(|r| r.accepts(&packet)) else {
            trace!(
                source = %self.name,
                stream = packet.stream_index,
                "no route for packet, skipping"
            );
            return Ok(());
        };

        match route {
            Route::Audio {
                decoder,
                filters,
                sink,
                ..
            } => {
                for sample in decoder.send_packet(&packet)? {
                    let sample = filters.process(sample)?;
                    sink.write_sample(&sample)?;
                }
            }
            Route::Video {
                decoder,
                filters,
                sink,
                ..
            } => {
                for frame in decoder.send_packet(&packet)? {
                    let frame = filters.process(frame)?;
                    sink.write_frame(&frame)?;
                }
            }
        }
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn is_primed(&self) -> bool {
        self.done || self.routes.iter().all(|r| r.sink_primed())
    }
}

/// Source feeding pre-decoded audio from an iterator.
pub struct SampleFeedSource<I> {
    name: String,
    feed: I,
    sink: Box<dyn SampleSink>,
    done: bool,
}

impl<I> SampleFeedSource<I>
where
    I: Iterator<Item = Sample>,
{
    /// Create a source over a sample iterator.
    pub fn new(name: impl Into<String>, feed: I, sink: Box<dyn SampleSink>) -> Self {
        Self {
            name: name.into(),
            feed,
            sink,
            done: false,
        }
    }
}

impl<I> Source for SampleFeedSource<I>
where
    I: Iterator<Item = Sample>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        match self.feed.next() {
            Some(sample) => self.sink.write_sample(&sample),
            None => {
                self.sink.finish()?;
                self.done = true;
                Ok(())
            }
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn is_primed(&self) -> bool {
        self.done || self.sink.is_primed()
    }
}

/// Source feeding pre-decoded video from an iterator.
pub struct FrameFeedSource<I> {
    name: String,
    feed: I,
    sink: Box<dyn FrameSink>,
    done: bool,
}

impl<I> FrameFeedSource<I>
where
    I: Iterator<Item = Frame>,
{
    /// Create a source over a frame iterator.
    pub fn new(name: impl Into<String>, feed: I, sink: Box<dyn FrameSink>) -> Self {
        Self {
            name: name.into(),
            feed,
            sink,
            done: false,
        }
    }
}

impl<I> Source for FrameFeedSource<I>
where
    I: Iterator<Item = Frame>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        match self.feed.next() {
            Some(frame) => self.sink.write_frame(&frame),
            None => {
                self.sink.finish()?;
                self.done = true;
                Ok(())
            }
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn is_primed(&self) -> bool {
        self.done || self.sink.is_primed()
    }
}
