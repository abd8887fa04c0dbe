//! Reference sinks.

use super::FrameSink;
use crate::error::Result;
use crate::frame::Frame;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A sink that discards all frames.
///
/// This is useful for:
/// - Benchmarking pipeline throughput
/// - Draining a pipeline without side effects
///
/// # Example
///
/// ```rust
/// use framechain::frame::{Frame, PixelFormat};
/// use framechain::io::{FrameSink, NullSink};
///
/// let mut sink = NullSink::new();
/// sink.render(&Frame::zeroed(2, 2, PixelFormat::Gray8)).unwrap();
/// assert_eq!(sink.count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct NullSink {
    count: u64,
}

impl NullSink {
    /// Create a new NullSink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of frames rendered.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl FrameSink for NullSink {
    fn render(&mut self, _frame: &Frame) -> Result<()> {
        self.count += 1;
        Ok(())
    }
}

/// A sink that keeps a copy of every frame it renders.
///
/// Clones share the same storage, so a test can hand one clone to a driver
/// and inspect the frames through another.
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl CollectSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the frames rendered so far.
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().clone()
    }

    /// Take the frames rendered so far, leaving the sink empty.
    pub fn take(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of frames rendered.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSink for CollectSink {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        self.lock().push(frame.clone());
        Ok(())
    }
}

/// A sink that logs the shape of every frame through `tracing`.
#[derive(Debug)]
pub struct LogSink {
    name: String,
    count: u64,
}

impl LogSink {
    /// Create a new LogSink.
    pub fn new() -> Self {
        Self::with_name("logsink")
    }

    /// Create a new LogSink with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
        }
    }

    /// Get the number of frames rendered.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for LogSink {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        self.count += 1;
        tracing::info!(
            sink = %self.name,
            sequence = frame.metadata().sequence,
            "frame {}",
            frame.shape()
        );
        Ok(())
    }
}
