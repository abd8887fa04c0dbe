//! Error types for framechain.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using framechain's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A stage failed to transform one frame.
///
/// The failure occupies the slot of the frame it replaced, so the pipeline
/// owner sees it at the same position the frame would have been retrieved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stage '{stage}' (#{index}) failed on frame {frame_index}: {message}")]
pub struct StageFailure {
    /// Name of the failing stage.
    pub stage: String,
    /// Position of the stage in the pipeline (0-based).
    pub index: usize,
    /// Submission position of the frame (0-based).
    pub frame_index: u64,
    /// Rendered error or panic message.
    pub message: String,
}

/// Main error type for framechain operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A stage failed on a frame. The pipeline is still alive.
    #[error(transparent)]
    Stage(#[from] StageFailure),

    /// Frame data does not match its declared shape, or a stage cannot
    /// handle the frame.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Invalid configuration or stage parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start` was called on a pipeline that was already started.
    #[error("pipeline already started")]
    AlreadyStarted,

    /// The pipeline has not been started.
    #[error("pipeline not started")]
    NotStarted,

    /// `stop` was called twice.
    #[error("pipeline already stopped")]
    AlreadyStopped,

    /// `join` was called a second time.
    #[error("pipeline already joined")]
    AlreadyJoined,

    /// `join` was called before `stop`.
    #[error("join called before stop")]
    JoinWithoutStop,

    /// End of stream was already observed on this channel.
    #[error("end of stream already observed")]
    StreamEnded,

    /// A send or receive happened on a closed channel.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Nothing arrived before the receive timeout expired.
    #[error("timed out after {0:?} waiting for a frame")]
    Timeout(Duration),

    /// A worker thread panicked outside of its stage.
    #[error("worker '{0}' panicked")]
    WorkerPanicked(String),

    /// The frame source failed.
    #[error("source error: {0}")]
    Source(String),

    /// The rendering sink failed.
    #[error("sink error: {0}")]
    Sink(String),

    /// I/O error (thread spawn).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a per-frame stage failure the pipeline survives.
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, Error::Stage(_))
    }

    /// Get the stage failure, if this is one.
    pub fn as_stage_failure(&self) -> Option<&StageFailure> {
        match self {
            Error::Stage(failure) => Some(failure),
            _ => None,
        }
    }
}
