//! Stream pipeline for the avpipe toolkit.
//!
//! Connects containers, codecs and the audio format converter into a
//! transcoding pipeline:
//!
//! - [`transform`]: seam traits concrete codecs and containers implement
//! - [`endpoint`]: per-stream lifecycle (unopened, opened, closed)
//! - [`mux`]: muxing with lazy header writing, and demuxing
//! - [`stage`]: encoder stages feeding the shared muxer
//! - [`source`]: unit-at-a-time producers with a priming protocol
//! - [`driver`]: round-robin execution and ordered shutdown
//!
//! The pipeline is single-threaded; stages and the driver share the muxer
//! through `Rc<RefCell<..>>`.

pub mod driver;
pub mod endpoint;
pub mod error;
pub mod filter;
pub mod mux;
pub mod source;
pub mod stage;
pub mod transform;

pub use driver::PipelineDriver;
pub use endpoint::{InputStream, OutputStream, OutputTransform, StreamState};
pub use error::{PipelineError, Result};
pub use filter::{AudioFilter, Filter, FilterChain, NullAudioFilter, NullVideoFilter, VideoFilter, VolumeFilter};
pub use mux::{Demuxer, Muxer, StreamHandle};
pub use source::{DemuxSource, FrameFeedSource, SampleFeedSource, Source};
pub use stage::{AudioEncoderStage, FrameSink, SampleSink, VideoEncoderStage};
pub use transform::{
    AudioDecodeTransform, AudioEncodeTransform, ContainerSink, ContainerSource, StreamBinding,
    StreamConfig, StreamInfo, StreamKind, VideoDecodeTransform, VideoEncodeTransform,
};
