//! Encoder stages.
//!
//! A stage accepts decoded media, pushes it through its encoder and delivers
//! the resulting packets to the shared muxer. The audio stage routes samples
//! through an [`AudioConverter`] first, so the encoder always sees exactly
//! the format and frame size it asked for.

use crate::mux::{Muxer, StreamHandle};
use crate::transform::{AudioEncodeTransform, VideoEncodeTransform};
use crate::Result;
use avpipe_convert::{AudioConverter, ConvertedFrameSink};
use avpipe_core::{Frame, Sample};
use std::cell::RefCell;
use std::rc::Rc;

/// Destination for decoded audio.
pub trait SampleSink {
    /// Accept one frame of decoded samples.
    fn write_sample(&mut self, sample: &Sample) -> Result<()>;

    /// Signal that no more samples will arrive.
    fn finish(&mut self) -> Result<()>;

    /// Whether this sink has produced output downstream yet.
    fn is_primed(&self) -> bool;
}

/// Destination for decoded video.
pub trait FrameSink {
    /// Accept one decoded frame.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Signal that no more frames will arrive.
    fn finish(&mut self) -> Result<()>;

    /// Whether this sink has produced output downstream yet.
    fn is_primed(&self) -> bool;
}

/// Audio encoding stage: converter, encoder and muxer stream in series.
pub struct AudioEncoderStage {
    transform: Rc<RefCell<dyn AudioEncodeTransform>>,
    converter: AudioConverter,
    muxer: Rc<RefCell<Muxer>>,
    handle: StreamHandle,
    primed: bool,
}

impl AudioEncoderStage {
    /// Create a stage and register its stream with the muxer.
    pub fn new(
        transform: Rc<RefCell<dyn AudioEncodeTransform>>,
        muxer: Rc<RefCell<Muxer>>,
    ) -> Result<Self> {
        let spec = transform.borrow().spec();
        let converter = AudioConverter::new(spec)?;
        let handle = muxer.borrow_mut().add_audio_stream(transform.clone())?;
        Ok(Self {
            transform,
            converter,
            muxer,
            handle,
            primed: false,
        })
    }

    /// Muxer handle for this stage's stream.
    pub fn handle(&self) -> StreamHandle {
        self.handle
    }
}

impl SampleSink for AudioEncoderStage {
    fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        let mut sink = EncodeSink {
            transform: &self.transform,
            muxer: &self.muxer,
            handle: self.handle,
            primed: &mut self.primed,
        };
        self.converter.process_frame(sample, &mut sink)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut sink = EncodeSink {
            transform: &self.transform,
            muxer: &self.muxer,
            handle: self.handle,
            primed: &mut self.primed,
        };
        self.converter.flush(&mut sink)?;
        Ok(())
    }

    fn is_primed(&self) -> bool {
        self.primed
    }
}

/// Adapter feeding converted frames into the encoder and its packets into
/// the muxer.
struct EncodeSink<'a> {
    transform: &'a Rc<RefCell<dyn AudioEncodeTransform>>,
    muxer: &'a Rc<RefCell<Muxer>>,
    handle: StreamHandle,
    primed: &'a mut bool,
}

impl ConvertedFrameSink for EncodeSink<'_> {
    fn write_converted(
        &mut self,
        sample: &Sample,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let packets = self.transform.borrow_mut().send_sample(sample)?;
        for packet in packets {
            *self.primed = true;
            self.muxer.borrow_mut().write_packet(self.handle, packet)?;
        }
        Ok(())
    }
}

/// Video encoding stage: encoder and muxer stream in series.
pub struct VideoEncoderStage {
    transform: Rc<RefCell<dyn VideoEncodeTransform>>,
    muxer: Rc<RefCell<Muxer>>,
    handle: StreamHandle,
    primed: bool,
}

impl VideoEncoderStage {
    /// Create a stage and register its stream with the muxer.
    pub fn new(
        transform: Rc<RefCell<dyn VideoEncodeTransform>>,
        muxer: Rc<RefCell<Muxer>>,
    ) -> Result<Self> {
        let handle = muxer.borrow_mut().add_video_stream(transform.clone())?;
        Ok(Self {
            transform,
            muxer,
            handle,
            primed: false,
        })
    }

    /// Muxer handle for this stage's stream.
    pub fn handle(&self) -> StreamHandle {
        self.handle
    }
}

impl FrameSink for VideoEncoderStage {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let packets = self.transform.borrow_mut().send_frame(frame)?;
        for packet in packets {
            self.primed = true;
            self.muxer.borrow_mut().write_packet(self.handle, packet)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Encoder lookahead drains when the muxer closes the endpoint.
        Ok(())
    }

    fn is_primed(&self) -> bool {
        self.primed
    }
}
