//! Collaborators around a pipeline: where frames come from, where they go,
//! and when to stop.
//!
//! The [`Driver`](crate::pipeline::Driver) talks to these through three
//! small traits:
//!
//! - [`FrameSource`]: produces frames until it is exhausted
//! - [`FrameSink`]: renders each processed frame
//! - [`StopSignal`]: polled once per iteration
//!
//! Reference implementations cover tests and demos; capture devices and
//! display windows live outside this crate.

mod sinks;
mod stop;
mod testsrc;

pub use sinks::{CollectSink, LogSink, NullSink};
pub use stop::{NeverStop, StopAfter, StopFlag};
pub use testsrc::{TestPattern, TestPatternSource};

use crate::error::Result;
use crate::frame::Frame;
use std::collections::VecDeque;

/// A producer of frames.
pub trait FrameSource {
    /// Read the next frame. `Ok(None)` means the source is exhausted.
    fn read(&mut self) -> Result<Option<Frame>>;

    /// Release any underlying resources. Called once by the driver on exit.
    fn release(&mut self) {}
}

/// A consumer of processed frames.
pub trait FrameSink {
    /// Render one frame. Failures are counted by the driver, not fatal.
    fn render(&mut self, frame: &Frame) -> Result<()>;
}

/// Polled once per driver iteration; `true` ends the loop.
pub trait StopSignal {
    /// Whether the driver should stop.
    fn should_stop(&mut self) -> bool;
}

impl<F: FnMut() -> bool> StopSignal for F {
    fn should_stop(&mut self) -> bool {
        self()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<Option<Frame>> {
        (**self).read()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        (**self).render(frame)
    }
}

/// A source that replays a fixed list of frames.
///
/// Frames are returned exactly as given; their metadata is never rewritten.
#[derive(Debug, Default)]
pub struct VecSource {
    frames: VecDeque<Frame>,
    released: bool,
}

impl VecSource {
    /// Create a source from frames in playback order.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            released: false,
        }
    }

    /// Frames still to be read.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Whether `release` was called.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSource for VecSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.frames.clear();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;
    use crate::metadata::FrameMetadata;

    #[test]
    fn test_vec_source_replays_in_order() {
        let frames = [7, 0, 3].map(|seq| {
            Frame::zeroed(1, 1, PixelFormat::Gray8).with_metadata(FrameMetadata::from_sequence(seq))
        });
        let mut source = VecSource::new(frames);
        assert_eq!(source.remaining(), 3);

        let sequences: Vec<u64> = std::iter::from_fn(|| source.read().unwrap())
            .map(|f| f.metadata().sequence)
            .collect();
        assert_eq!(sequences, vec![7, 0, 3]);
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn test_vec_source_keeps_zero_sequence() {
        let mut source = VecSource::new((0..3).map(|_| Frame::zeroed(1, 1, PixelFormat::Gray8)));
        for _ in 0..3 {
            assert_eq!(source.read().unwrap().unwrap().metadata().sequence, 0);
        }
    }

    #[test]
    fn test_vec_source_release() {
        let mut source = VecSource::new([Frame::zeroed(1, 1, PixelFormat::Gray8)]);
        source.release();
        assert!(source.is_released());
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn test_closure_stop_signal() {
        let mut calls = 0;
        let mut signal = move || {
            calls += 1;
            calls > 2
        };
        assert!(!signal.should_stop());
        assert!(!signal.should_stop());
        assert!(signal.should_stop());
    }
}
