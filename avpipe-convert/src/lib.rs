//! Audio format conversion for the avpipe toolkit.
//!
//! Bridges the gap between what a decoder produces and what an encoder
//! accepts: sample format, channel layout, sample rate and samples per
//! frame. The central type is [`AudioConverter`], which binds lazily to the
//! first input frame, restructures input into exact target-sized frames and
//! stamps each one from a cumulative sample counter so the output timeline
//! has no gaps or overlaps.
//!
//! # Example
//!
//! ```no_run
//! use avpipe_convert::{AudioConverter, AudioSpec};
//! use avpipe_core::{ChannelLayout, SampleFormat, TimeBase};
//!
//! let spec = AudioSpec {
//!     format: SampleFormat::S16,
//!     layout: ChannelLayout::Stereo,
//!     sample_rate: 44100,
//!     frame_size: Some(1152),
//!     time_base: TimeBase::new(1, 44100),
//! };
//! let converter = AudioConverter::new(spec).unwrap();
//! ```

pub mod converter;
pub mod error;
pub mod linear;

pub use converter::{AudioConverter, AudioSpec, ConvertedFrameSink, VARIABLE_FRAME_CAPACITY};
pub use error::{ConvertError, Result};
pub use linear::LinearResampler;
