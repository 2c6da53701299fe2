//! Core media types for the avpipe toolkit.
//!
//! This crate provides the shared data model used by the conversion and
//! pipeline crates:
//!
//! - [`Packet`]: encoded media data with timestamps and stream routing
//! - [`Frame`]: decoded video frames in various pixel formats
//! - [`Sample`]: decoded audio with interleaved-f32 normalization
//! - [`Timestamp`], [`TimeBase`], [`Rational`]: precise time handling
//!
//! # Example
//!
//! ```
//! use avpipe_core::{Timestamp, TimeBase};
//!
//! let pts = Timestamp::new(90000, TimeBase::MPEG);
//! assert_eq!(pts.rescale(TimeBase::MILLISECONDS).value, 1000);
//! ```

pub mod error;
pub mod frame;
pub mod packet;
pub mod rational;
pub mod sample;
pub mod timestamp;

pub use error::{Error, Result};
pub use frame::{Frame, FrameBuffer, FrameFlags, PixelFormat};
pub use packet::{OwnedPacket, Packet, PacketFlags};
pub use rational::Rational;
pub use sample::{ChannelLayout, Sample, SampleBuffer, SampleFormat};
pub use timestamp::{Duration, TimeBase, Timestamp};
