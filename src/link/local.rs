//! Local (in-process) links using kanal channels.

use super::Message;
use crate::error::{Error, Result, StageFailure};
use crate::frame::Frame;
use std::time::Duration;

/// A single-producer, single-consumer hand-off between two pipeline points.
///
/// This is a thin wrapper around kanal channels that adds the end-of-stream
/// protocol: once [`LinkSender::send_eos`] succeeds nothing else can be sent,
/// and once the receiver has returned [`Message::Eos`] it refuses to receive
/// again. Neither half is `Clone`.
///
/// # Example
///
/// ```rust
/// use framechain::frame::{Frame, PixelFormat};
/// use framechain::link::{FrameLink, Message};
///
/// let (mut tx, mut rx) = FrameLink::bounded(4);
///
/// tx.send(Frame::zeroed(2, 2, PixelFormat::Gray8), 0).unwrap();
/// tx.send_eos().unwrap();
///
/// assert!(matches!(rx.recv().unwrap(), Message::Frame { index: 0, .. }));
/// assert!(matches!(rx.recv().unwrap(), Message::Eos));
/// assert!(rx.recv().is_err());
/// ```
pub struct FrameLink;

impl FrameLink {
    /// Create a bounded link with the specified capacity.
    ///
    /// A capacity of zero gives a rendezvous channel: every send waits for
    /// the matching receive.
    pub fn bounded(capacity: usize) -> (LinkSender, LinkReceiver) {
        let (tx, rx) = kanal::bounded(capacity);
        (LinkSender::new(tx), LinkReceiver::new(rx))
    }

    /// Create an unbounded link.
    ///
    /// Use with caution - can consume unbounded memory if producer is faster
    /// than consumer.
    pub fn unbounded() -> (LinkSender, LinkReceiver) {
        let (tx, rx) = kanal::unbounded();
        (LinkSender::new(tx), LinkReceiver::new(rx))
    }
}

/// Sender half of a link.
pub struct LinkSender {
    inner: kanal::Sender<Message>,
    eos_sent: bool,
}

impl LinkSender {
    fn new(inner: kanal::Sender<Message>) -> Self {
        Self {
            inner,
            eos_sent: false,
        }
    }

    /// Send a frame with its submission index.
    ///
    /// Blocks if the channel is full (for bounded links).
    pub fn send(&mut self, frame: Frame, index: u64) -> Result<()> {
        self.send_message(Message::Frame { index, frame })
    }

    /// Send a stage failure in place of a frame.
    pub fn send_failure(&mut self, failure: StageFailure) -> Result<()> {
        self.send_message(Message::Failed(failure))
    }

    /// Send end-of-stream. Nothing can be sent afterwards.
    pub fn send_eos(&mut self) -> Result<()> {
        self.send_message(Message::Eos)
    }

    /// Try to send end-of-stream without blocking.
    ///
    /// Returns `Ok(false)` if a bounded link is full.
    pub fn try_send_eos(&mut self) -> Result<bool> {
        if self.eos_sent {
            return Err(Error::ChannelClosed("send after end of stream".into()));
        }
        let sent = self
            .inner
            .try_send(Message::Eos)
            .map_err(|_| Error::ChannelClosed("receiver dropped".into()))?;
        self.eos_sent = sent;
        Ok(sent)
    }

    /// Send any message, enforcing the end-of-stream protocol.
    pub fn send_message(&mut self, message: Message) -> Result<()> {
        if self.eos_sent {
            return Err(Error::ChannelClosed("send after end of stream".into()));
        }
        let is_eos = message.is_eos();
        self.inner
            .send(message)
            .map_err(|_| Error::ChannelClosed("receiver dropped".into()))?;
        self.eos_sent = is_eos;
        Ok(())
    }

    /// Send asynchronously.
    pub async fn send_async(&mut self, message: Message) -> Result<()> {
        if self.eos_sent {
            return Err(Error::ChannelClosed("send after end of stream".into()));
        }
        let is_eos = message.is_eos();
        self.inner
            .as_async()
            .send(message)
            .await
            .map_err(|_| Error::ChannelClosed("receiver dropped".into()))?;
        self.eos_sent = is_eos;
        Ok(())
    }

    /// Whether end-of-stream has been sent.
    pub fn eos_sent(&self) -> bool {
        self.eos_sent
    }

    /// Check if the receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.inner.is_disconnected()
    }

    /// Get the number of pending messages in the channel.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the channel is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Receiver half of a link.
pub struct LinkReceiver {
    inner: kanal::Receiver<Message>,
    eos_seen: bool,
}

impl LinkReceiver {
    fn new(inner: kanal::Receiver<Message>) -> Self {
        Self {
            inner,
            eos_seen: false,
        }
    }

    /// Receive the next message.
    ///
    /// Blocks until a message is available. Returns
    /// [`Error::StreamEnded`] if end-of-stream was already returned and
    /// [`Error::ChannelClosed`] if the sender disappeared without sending it.
    pub fn recv(&mut self) -> Result<Message> {
        self.check_open()?;
        let message = self
            .inner
            .recv()
            .map_err(|_| Error::ChannelClosed("sender dropped before end of stream".into()))?;
        Ok(self.observe(message))
    }

    /// Receive with a timeout.
    ///
    /// Returns [`Error::Timeout`] if nothing arrives in time.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Message> {
        self.check_open()?;
        let message = self.inner.recv_timeout(timeout).map_err(|e| match e {
            kanal::ReceiveErrorTimeout::Timeout => Error::Timeout(timeout),
            _ => Error::ChannelClosed("sender dropped before end of stream".into()),
        })?;
        Ok(self.observe(message))
    }

    /// Receive asynchronously.
    pub async fn recv_async(&mut self) -> Result<Message> {
        self.check_open()?;
        let message = self
            .inner
            .as_async()
            .recv()
            .await
            .map_err(|_| Error::ChannelClosed("sender dropped before end of stream".into()))?;
        Ok(self.observe(message))
    }

    /// Whether end-of-stream has been received.
    pub fn eos_seen(&self) -> bool {
        self.eos_seen
    }

    /// Check if the sender is gone.
    pub fn is_closed(&self) -> bool {
        self.inner.is_disconnected()
    }

    /// Get the number of pending messages in the channel.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the channel is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn check_open(&self) -> Result<()> {
        if self.eos_seen {
            return Err(Error::StreamEnded);
        }
        Ok(())
    }

    fn observe(&mut self, message: Message) -> Message {
        if message.is_eos() {
            self.eos_seen = true;
        }
        message
    }
}
