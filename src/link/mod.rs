//! Hand-off links between pipeline workers.
//!
//! Every pair of adjacent pipeline points is connected by one link: a FIFO
//! with exactly one producer and one consumer. Links carry [`Message`]s and
//! enforce that end-of-stream is the last message ever sent.
//!
//! Frames are moved through links, so ownership passes from producer to
//! consumer on every hand-off.

mod local;

pub use local::{FrameLink, LinkReceiver, LinkSender};

use crate::error::StageFailure;
use crate::frame::Frame;

/// Item carried by a link.
#[derive(Debug)]
pub enum Message {
    /// A frame, tagged with its submission position.
    Frame {
        /// Position of the frame in submission order (0-based).
        index: u64,
        /// The frame itself.
        frame: Frame,
    },
    /// A stage failed on the frame that occupied this slot.
    Failed(StageFailure),
    /// End of stream. Always the last message on a link.
    Eos,
}

impl Message {
    /// Check if this is end-of-stream.
    #[inline]
    pub fn is_eos(&self) -> bool {
        matches!(self, Message::Eos)
    }
}
