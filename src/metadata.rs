//! Frame metadata types.

use std::time::Duration;

/// Metadata associated with a frame.
///
/// Stages carry metadata through unchanged; only sources set it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Presentation timestamp (when this frame should be displayed).
    pub pts: Option<Duration>,

    /// Monotonic sequence number within a stream, as assigned by the source.
    pub sequence: u64,
}

impl FrameMetadata {
    /// Create new metadata with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metadata with a sequence number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    /// Set the presentation timestamp.
    pub fn with_pts(mut self, pts: Duration) -> Self {
        self.pts = Some(pts);
        self
    }
}
