//! Integration tests for the staged pipeline.

use framechain::error::{Error, Result};
use framechain::frame::{Frame, PixelFormat};
use framechain::io::{TestPattern, TestPatternSource};
use framechain::metadata::FrameMetadata;
use framechain::pipeline::{Pipeline, PipelineConfig, PipelineEvent, PipelineState};
use framechain::stage::{BoxedStage, Chain, FnStage, Stage};
use framechain::stages::{EdgeDetect, Grayscale, Identity, Mirror, Resize};

fn camera_frame(sequence: u64) -> Frame {
    TestPatternSource::new()
        .with_pattern(TestPattern::Gradient)
        .with_resolution(640, 480)
        .generate(sequence)
}

fn small_frame(sequence: u64) -> Frame {
    Frame::from_fn(8, 6, PixelFormat::Bgr24, |x, y| {
        [(x * 30) as u8, (y * 40) as u8, sequence as u8, 0]
    })
    .with_metadata(FrameMetadata::from_sequence(sequence))
}

/// Drain the output after `stop`, collecting frames and failures in order.
fn drain(pipeline: &mut Pipeline) -> Vec<Result<Frame>> {
    let mut out = Vec::new();
    loop {
        match pipeline.retrieve() {
            Ok(Some(frame)) => out.push(Ok(frame)),
            Ok(None) => return out,
            Err(e) => out.push(Err(e)),
        }
    }
}

/// Grayscale, mirror and half-size resize on a 640x480 BGR frame produce a
/// 320x240 Gray8 frame, identical to applying the stages one after another.
#[test]
fn test_camera_chain_matches_sequential() {
    let mut pipeline = Pipeline::builder()
        .stage(Grayscale::new())
        .stage(Mirror::new())
        .stage(Resize::new(0.5).unwrap())
        .build()
        .unwrap();
    pipeline.start().unwrap();

    let input = camera_frame(0);
    pipeline.submit(input.clone()).unwrap();
    let out = pipeline.retrieve().unwrap().unwrap();

    assert_eq!(out.width(), 320);
    assert_eq!(out.height(), 240);
    assert_eq!(out.format(), PixelFormat::Gray8);

    let sequential = Chain::new()
        .then(Grayscale::new())
        .then(Mirror::new())
        .then(Resize::new(0.5).unwrap());
    assert_eq!(out, sequential.apply(input).unwrap());

    pipeline.stop().unwrap();
    assert!(pipeline.retrieve().unwrap().is_none());
    pipeline.join().unwrap();
}

/// With no stages the submitted frame comes back unmodified.
#[test]
fn test_empty_pipeline_is_identity() {
    let mut pipeline = Pipeline::new(vec![]);
    pipeline.start().unwrap();

    let input = small_frame(7);
    pipeline.submit(input.clone()).unwrap();
    assert_eq!(pipeline.retrieve().unwrap().unwrap(), input);

    pipeline.stop().unwrap();
    assert!(pipeline.retrieve().unwrap().is_none());
    let report = pipeline.join().unwrap();
    assert!(report.workers.is_empty());
}

/// Five frames in, stop, five frames out, then end of stream exactly once.
#[test]
fn test_five_frames_then_end_of_stream() {
    let mut pipeline = Pipeline::new(vec![Box::new(Mirror::new()), Box::new(Identity::new())]);
    pipeline.start().unwrap();

    for seq in 0..5 {
        pipeline.submit(small_frame(seq)).unwrap();
    }
    pipeline.stop().unwrap();

    for seq in 0..5 {
        let frame = pipeline.retrieve().unwrap().unwrap();
        assert_eq!(frame.metadata().sequence, seq);
    }
    assert!(pipeline.retrieve().unwrap().is_none());
    assert!(matches!(pipeline.retrieve(), Err(Error::StreamEnded)));

    let report = pipeline.join().unwrap();
    assert_eq!(report.discarded_frames, 0);
    for worker in &report.workers {
        assert_eq!(worker.frames_processed, 5);
    }
}

/// A stage failing on frame #3 yields exactly one stage error in that slot,
/// and the stream still terminates cleanly.
#[test]
fn test_failure_on_third_frame() {
    let fails_on_three = FnStage::new("fails-on-3", |frame: Frame| {
        if frame.metadata().sequence == 3 {
            Err(Error::InvalidFrame("frame 3 rejected".into()))
        } else {
            Ok(frame)
        }
    });
    let mut pipeline = Pipeline::new(vec![
        Box::new(Identity::new()),
        Box::new(fails_on_three),
        Box::new(Mirror::new()),
    ]);
    pipeline.start().unwrap();

    for seq in 0..6 {
        pipeline.submit(small_frame(seq)).unwrap();
    }
    pipeline.stop().unwrap();

    let results = drain(&mut pipeline);
    assert_eq!(results.len(), 6);

    let failures: Vec<_> = results
        .iter()
        .enumerate()
        .filter_map(|(slot, r)| r.as_ref().err().map(|e| (slot, e)))
        .collect();
    assert_eq!(failures.len(), 1);

    let (slot, err) = failures[0];
    assert_eq!(slot, 3);
    let failure = err.as_stage_failure().unwrap();
    assert_eq!(failure.stage, "fails-on-3");
    assert_eq!(failure.index, 1);
    assert_eq!(failure.frame_index, 3);

    for (slot, result) in results.iter().enumerate() {
        if slot != 3 {
            let frame = result.as_ref().unwrap();
            assert_eq!(frame.metadata().sequence, slot as u64);
        }
    }

    let report = pipeline.join().unwrap();
    assert_eq!(report.failures(), 1);
    assert_eq!(report.workers[2].forwarded_failures, 1);
    assert_eq!(report.workers[2].frames_processed, 5);
}

/// A panicking stage is reported like an error and does not kill its worker.
#[test]
fn test_panicking_stage_is_contained() {
    let panics = FnStage::new("panics-on-1", |frame: Frame| {
        if frame.metadata().sequence == 1 {
            panic!("bad frame");
        }
        Ok(frame)
    });
    let mut pipeline = Pipeline::new(vec![Box::new(panics)]);
    pipeline.start().unwrap();

    for seq in 0..3 {
        pipeline.submit(small_frame(seq)).unwrap();
    }

    assert!(pipeline.retrieve().unwrap().is_some());
    let err = pipeline.retrieve().unwrap_err();
    assert!(err.as_stage_failure().unwrap().message.contains("bad frame"));
    assert!(pipeline.retrieve().unwrap().is_some());

    pipeline.stop().unwrap();
    assert!(pipeline.retrieve().unwrap().is_none());
    assert_eq!(pipeline.join().unwrap().failures(), 1);
}

/// Running two stages concurrently equals composing them.
#[test]
fn test_composition_law() {
    let stage_sets: Vec<(Vec<BoxedStage>, Chain)> = vec![
        (
            vec![Box::new(Grayscale::new()), Box::new(Mirror::new())],
            Chain::new().then(Grayscale::new()).then(Mirror::new()),
        ),
        (
            vec![Box::new(Resize::half()), Box::new(EdgeDetect::new())],
            Chain::new().then(Resize::half()).then(EdgeDetect::new()),
        ),
    ];

    for (stages, chain) in stage_sets {
        let mut pipeline = Pipeline::new(stages);
        pipeline.start().unwrap();

        for seq in 0..4 {
            pipeline.submit(small_frame(seq)).unwrap();
        }
        pipeline.stop().unwrap();

        for (seq, result) in drain(&mut pipeline).into_iter().enumerate() {
            let expected = chain.apply(small_frame(seq as u64)).unwrap();
            assert_eq!(result.unwrap(), expected);
        }
        pipeline.join().unwrap();
    }
}

/// Order is preserved across many frames and stages.
#[test]
fn test_order_preserved_under_load() {
    let stages: Vec<BoxedStage> = (0..4)
        .map(|i| Box::new(Identity::with_name(format!("hop-{i}"))) as BoxedStage)
        .collect();
    let config = PipelineConfig::with_capacity(2);
    let mut pipeline = Pipeline::with_config(stages, config).unwrap();
    pipeline.start().unwrap();

    let total = 200;
    let mut received = Vec::new();
    for seq in 0..total {
        pipeline.submit(small_frame(seq)).unwrap();
        // Keep the pipeline partially full.
        if seq >= 5 {
            let frame = pipeline.retrieve().unwrap().unwrap();
            received.push(frame.metadata().sequence);
        }
    }
    pipeline.stop().unwrap();
    for result in drain(&mut pipeline) {
        received.push(result.unwrap().metadata().sequence);
    }

    assert_eq!(received, (0..total).collect::<Vec<_>>());
    pipeline.join().unwrap();
}

/// Workers finish in stage order and none sees a frame after end of stream.
#[test]
fn test_end_of_stream_reaches_stages_in_order() {
    let mut pipeline = Pipeline::new(vec![
        Box::new(Identity::with_name("a")),
        Box::new(Identity::with_name("b")),
        Box::new(Identity::with_name("c")),
    ]);
    let mut events = pipeline.subscribe();
    pipeline.start().unwrap();

    for seq in 0..3 {
        pipeline.submit(small_frame(seq)).unwrap();
    }
    pipeline.stop().unwrap();
    assert_eq!(drain(&mut pipeline).len(), 3);
    let report = pipeline.join().unwrap();

    let events = events.drain();
    assert_eq!(events.first(), Some(&PipelineEvent::Started { stages: 3 }));
    assert_eq!(events.last(), Some(&PipelineEvent::Joined));

    let finished: Vec<(String, usize, u64)> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::WorkerFinished {
                stage,
                index,
                frames_processed,
                ..
            } => Some((stage.clone(), *index, *frames_processed)),
            _ => None,
        })
        .collect();
    assert_eq!(
        finished,
        vec![
            ("a".to_string(), 0, 3),
            ("b".to_string(), 1, 3),
            ("c".to_string(), 2, 3),
        ]
    );

    let position = |wanted: &PipelineEvent| events.iter().position(|e| e == wanted).unwrap();
    assert!(position(&PipelineEvent::StopRequested) < position(&PipelineEvent::Eos));
    assert!(position(&PipelineEvent::Eos) < position(&PipelineEvent::Joined));

    let started = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::WorkerStarted { .. }))
        .count();
    assert_eq!(started, 3);

    for worker in report.workers {
        assert_eq!(worker.frames_processed, 3);
    }
}

/// Stage failures are broadcast as events as well as returned in-band.
#[test]
fn test_failure_event() {
    let always_fails = FnStage::new("always-fails", |_frame: Frame| -> Result<Frame> {
        Err(Error::InvalidFrame("nope".into()))
    });
    let mut pipeline = Pipeline::new(vec![Box::new(always_fails)]);
    let mut events = pipeline.subscribe();
    pipeline.start().unwrap();

    pipeline.submit(small_frame(0)).unwrap();
    assert!(pipeline.retrieve().unwrap_err().is_stage_failure());
    pipeline.stop().unwrap();
    pipeline.join().unwrap();

    let failed: Vec<_> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            PipelineEvent::StageFailed(failure) => Some(failure),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].stage, "always-fails");
    assert_eq!(failed[0].frame_index, 0);
}

/// A stage that rejects a frame shape does not poison later frames.
#[test]
fn test_resize_rejects_tiny_frame_and_continues() {
    let mut pipeline = Pipeline::new(vec![Box::new(Resize::half())]);
    pipeline.start().unwrap();

    pipeline
        .submit(Frame::zeroed(1, 1, PixelFormat::Gray8))
        .unwrap();
    pipeline.submit(small_frame(1)).unwrap();
    pipeline.stop().unwrap();

    let results = drain(&mut pipeline);
    assert!(results[0].as_ref().unwrap_err().is_stage_failure());
    let frame = results[1].as_ref().unwrap();
    assert_eq!((frame.width(), frame.height()), (4, 3));

    pipeline.join().unwrap();
}

/// An upscale too large to allocate fails that frame only.
#[test]
fn test_oversized_resize_fails_frame_not_process() {
    let huge = Resize::new(1.0e6).unwrap();
    let mut pipeline = Pipeline::new(vec![Box::new(huge)]);
    pipeline.start().unwrap();

    pipeline
        .submit(Frame::zeroed(10_000, 1, PixelFormat::Gray8))
        .unwrap();
    pipeline.stop().unwrap();

    let results = drain(&mut pipeline);
    assert_eq!(results.len(), 1);
    let failure = results[0].as_ref().unwrap_err().as_stage_failure().unwrap();
    assert_eq!(failure.stage, "resize");
    assert_eq!(failure.frame_index, 0);

    let report = pipeline.join().unwrap();
    assert_eq!(report.workers[0].failures, 1);
}

/// Lifecycle misuse is reported, never ignored.
#[test]
fn test_lifecycle_misuse() {
    let mut pipeline = Pipeline::new(vec![Box::new(Identity::new())]);
    assert!(matches!(pipeline.join(), Err(Error::NotStarted)));

    pipeline.start().unwrap();
    assert!(matches!(pipeline.start(), Err(Error::AlreadyStarted)));
    assert!(matches!(pipeline.join(), Err(Error::JoinWithoutStop)));

    pipeline.stop().unwrap();
    assert!(matches!(
        pipeline.submit(small_frame(0)),
        Err(Error::ChannelClosed(_))
    ));
    assert!(pipeline.retrieve().unwrap().is_none());
    assert!(matches!(pipeline.retrieve(), Err(Error::StreamEnded)));

    pipeline.join().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Joined);
}

/// Joining without draining discards what is left and still returns.
#[test]
fn test_join_without_drain() {
    let mut pipeline = Pipeline::builder()
        .stage(Grayscale::new())
        .stage(Mirror::new())
        .config(PipelineConfig::with_capacity(1))
        .build()
        .unwrap();
    pipeline.start().unwrap();

    // Capacity 1 per link: two stages hold at most five frames in flight.
    for seq in 0..4 {
        pipeline.submit(small_frame(seq)).unwrap();
    }
    pipeline.stop().unwrap();

    let report = pipeline.join().unwrap();
    assert_eq!(report.discarded_frames, 4);
}

/// Dropping a running pipeline does not hang.
#[test]
fn test_drop_running_pipeline() {
    let mut pipeline = Pipeline::new(vec![Box::new(Grayscale::new()), Box::new(Mirror::new())]);
    pipeline.start().unwrap();
    for seq in 0..3 {
        pipeline.submit(small_frame(seq)).unwrap();
    }
    drop(pipeline);
}
