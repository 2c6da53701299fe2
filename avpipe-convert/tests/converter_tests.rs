//! Integration tests for the audio format converter.

use avpipe_convert::{AudioConverter, AudioSpec, ConvertError, ConvertedFrameSink};
use avpipe_core::{ChannelLayout, Sample, SampleFormat, TimeBase};
use proptest::prelude::*;

/// Sink that collects every delivered frame.
#[derive(Default)]
struct CollectSink {
    frames: Vec<Sample>,
}

impl ConvertedFrameSink for CollectSink {
    fn write_converted(
        &mut self,
        sample: &Sample,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.frames.push(sample.clone());
        Ok(())
    }
}

/// Sink that rejects everything.
struct FailingSink;

impl ConvertedFrameSink for FailingSink {
    fn write_converted(
        &mut self,
        _sample: &Sample,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("sink full".into())
    }
}

fn spec_44100_stereo(frame_size: usize) -> AudioSpec {
    AudioSpec {
        format: SampleFormat::S16,
        layout: ChannelLayout::Stereo,
        sample_rate: 44100,
        frame_size: Some(frame_size),
        time_base: TimeBase::new(1, 44100),
    }
}

fn input_frame(num_samples: usize, rate: u32) -> Sample {
    Sample::new(num_samples, SampleFormat::S16, ChannelLayout::Stereo, rate)
}

#[test]
fn test_restructures_input_into_fixed_frames() {
    let mut converter = AudioConverter::new(spec_44100_stereo(1152)).unwrap();
    let mut sink = CollectSink::default();

    // 480 + 480 + 960 = 1920 samples in, frame size 1152
    for n in [480, 480, 960] {
        converter
            .process_frame(&input_frame(n, 44100), &mut sink)
            .unwrap();
    }

    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].num_samples(), 1152);
    assert_eq!(sink.frames[0].pts.value, 0);

    // Flush emits the 768 leftover samples as a short final frame
    converter.flush(&mut sink).unwrap();
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[1].num_samples(), 768);
    assert_eq!(sink.frames[1].pts.value, 1152);
    assert_eq!(converter.samples_emitted(), 1920);
}

#[test]
fn test_gapless_timeline() {
    let mut converter = AudioConverter::new(spec_44100_stereo(256)).unwrap();
    let mut sink = CollectSink::default();

    for _ in 0..40 {
        converter
            .process_frame(&input_frame(100, 44100), &mut sink)
            .unwrap();
    }
    converter.flush(&mut sink).unwrap();

    assert!(!sink.frames.is_empty());
    let mut expected_pts = 0i64;
    for frame in &sink.frames {
        assert_eq!(frame.pts.value, expected_pts);
        expected_pts += frame.num_samples() as i64;
    }
    assert_eq!(expected_pts, 4000);
}

#[test]
fn test_underrun_defers_output() {
    let mut converter = AudioConverter::new(spec_44100_stereo(1024)).unwrap();
    let mut sink = CollectSink::default();

    // 5 * 100 = 500 samples, under the 1024 frame size
    for _ in 0..5 {
        converter
            .process_frame(&input_frame(100, 44100), &mut sink)
            .unwrap();
    }
    assert!(sink.frames.is_empty());

    // crossing the threshold releases exactly one frame
    for _ in 0..6 {
        converter
            .process_frame(&input_frame(100, 44100), &mut sink)
            .unwrap();
    }
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].num_samples(), 1024);
}

#[test]
fn test_binds_to_first_frame_and_rejects_changes() {
    let mut converter = AudioConverter::new(spec_44100_stereo(1024)).unwrap();
    let mut sink = CollectSink::default();

    assert!(!converter.is_bound());
    converter
        .process_frame(&input_frame(100, 48000), &mut sink)
        .unwrap();
    assert!(converter.is_bound());

    // same parameters keep flowing
    converter
        .process_frame(&input_frame(200, 48000), &mut sink)
        .unwrap();

    // a different source rate is rejected
    let err = converter
        .process_frame(&input_frame(100, 22050), &mut sink)
        .unwrap_err();
    assert!(matches!(err, ConvertError::FormatMismatch { .. }));
}

#[test]
fn test_resamples_to_target_rate() {
    let mut converter = AudioConverter::new(spec_44100_stereo(512)).unwrap();
    let mut sink = CollectSink::default();

    // 22050 Hz input roughly doubles in sample count
    for _ in 0..10 {
        converter
            .process_frame(&input_frame(100, 22050), &mut sink)
            .unwrap();
    }
    converter.flush(&mut sink).unwrap();

    let total: usize = sink.frames.iter().map(|f| f.num_samples()).sum();
    assert!((1998..=2002).contains(&total), "got {} samples", total);
    for frame in &sink.frames {
        assert_eq!(frame.sample_rate(), 44100);
        assert_eq!(frame.channels(), 2);
    }
}

#[test]
fn test_mono_input_upmixed_to_stereo() {
    let mut converter = AudioConverter::new(spec_44100_stereo(256)).unwrap();
    let mut sink = CollectSink::default();

    let mono = Sample::new(300, SampleFormat::F32, ChannelLayout::Mono, 44100);
    converter.process_frame(&mono, &mut sink).unwrap();
    converter.flush(&mut sink).unwrap();

    let total: usize = sink.frames.iter().map(|f| f.num_samples()).sum();
    assert_eq!(total, 300);
    assert!(sink.frames.iter().all(|f| f.channels() == 2));
}

#[test]
fn test_flush_before_input_is_noop() {
    let mut converter = AudioConverter::new(spec_44100_stereo(1024)).unwrap();
    let mut sink = CollectSink::default();

    converter.flush(&mut sink).unwrap();
    assert!(sink.frames.is_empty());

    // closed converter rejects further input
    let err = converter
        .process_frame(&input_frame(100, 44100), &mut sink)
        .unwrap_err();
    assert!(matches!(err, ConvertError::Closed));
}

#[test]
fn test_flush_is_idempotent() {
    let mut converter = AudioConverter::new(spec_44100_stereo(1024)).unwrap();
    let mut sink = CollectSink::default();

    converter
        .process_frame(&input_frame(100, 44100), &mut sink)
        .unwrap();
    converter.flush(&mut sink).unwrap();
    assert_eq!(sink.frames.len(), 1);

    converter.flush(&mut sink).unwrap();
    converter.flush(&mut sink).unwrap();
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn test_sink_failure_propagates() {
    let mut converter = AudioConverter::new(spec_44100_stereo(64)).unwrap();
    let mut sink = FailingSink;

    let err = converter
        .process_frame(&input_frame(128, 44100), &mut sink)
        .unwrap_err();
    assert!(matches!(err, ConvertError::Delivery(_)));
}

proptest! {
    #[test]
    fn prop_same_rate_conserves_samples(
        sizes in prop::collection::vec(1usize..500, 1..20),
        frame_size in 1usize..2000,
    ) {
        let mut converter = AudioConverter::new(spec_44100_stereo(frame_size)).unwrap();
        let mut sink = CollectSink::default();

        let mut pushed = 0usize;
        for n in &sizes {
            converter.process_frame(&input_frame(*n, 44100), &mut sink).unwrap();
            pushed += n;
        }
        converter.flush(&mut sink).unwrap();

        let total: usize = sink.frames.iter().map(|f| f.num_samples()).sum();
        prop_assert_eq!(total, pushed);

        // every frame but the last is exactly the target size
        for frame in sink.frames.iter().rev().skip(1) {
            prop_assert_eq!(frame.num_samples(), frame_size);
        }
    }

    #[test]
    fn prop_upsample_doubles_within_tolerance(
        sizes in prop::collection::vec(10usize..300, 1..15),
    ) {
        let mut converter = AudioConverter::new(spec_44100_stereo(512)).unwrap();
        let mut sink = CollectSink::default();

        let mut pushed = 0usize;
        for n in &sizes {
            converter.process_frame(&input_frame(*n, 22050), &mut sink).unwrap();
            pushed += n;
        }
        converter.flush(&mut sink).unwrap();

        let total: i64 = sink.frames.iter().map(|f| f.num_samples() as i64).sum();
        prop_assert!((total - 2 * pushed as i64).abs() <= 2);
    }
}
