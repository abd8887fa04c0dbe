//! Pipeline event system.
//!
//! Events are emitted by the pipeline and its workers during execution and
//! can be received by any number of subscribers, either by polling
//! ([`EventReceiver::try_recv`]) or asynchronously ([`EventReceiver::recv`]).

use crate::error::StageFailure;
use std::fmt;
use tokio::sync::broadcast;

/// Events emitted by the pipeline during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The pipeline is spawning its workers. Always the first event.
    Started {
        /// Number of stages.
        stages: usize,
    },

    /// A worker entered its loop.
    WorkerStarted {
        /// Stage name.
        stage: String,
        /// Stage position.
        index: usize,
    },

    /// A stage failed on one frame. The pipeline keeps running.
    StageFailed(StageFailure),

    /// A worker observed end-of-stream and is forwarding it.
    ///
    /// Emitted before the end-of-stream is passed on, so these events
    /// arrive in stage order.
    WorkerFinished {
        /// Stage name.
        stage: String,
        /// Stage position.
        index: usize,
        /// Frames the stage transformed successfully.
        frames_processed: u64,
        /// Frames the stage failed on.
        failures: u64,
    },

    /// `stop` sent end-of-stream into the pipeline.
    StopRequested,

    /// End of stream reached the output.
    Eos,

    /// All workers were joined.
    Joined,
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::Started { stages } => write!(f, "Pipeline started ({} stages)", stages),
            PipelineEvent::WorkerStarted { stage, index } => {
                write!(f, "Worker {} ({}) started", index, stage)
            }
            PipelineEvent::StageFailed(failure) => write!(f, "Error: {}", failure),
            PipelineEvent::WorkerFinished {
                stage,
                index,
                frames_processed,
                failures,
            } => write!(
                f,
                "Worker {} ({}) finished ({} frames, {} failures)",
                index, stage, frames_processed, failures
            ),
            PipelineEvent::StopRequested => write!(f, "Stop requested"),
            PipelineEvent::Eos => write!(f, "EOS"),
            PipelineEvent::Joined => write!(f, "Pipeline joined"),
        }
    }
}

/// Sender for pipeline events.
///
/// This is held by the pipeline and cloned into every worker.
#[derive(Clone)]
pub struct EventSender {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventSender {
    /// Create a new event sender with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event.
    ///
    /// Returns the number of receivers that received the event.
    /// Returns 0 if there are no receivers (which is fine).
    pub fn send(&self, event: PipelineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Send an EOS event.
    pub fn send_eos(&self) {
        self.send(PipelineEvent::Eos);
    }

    /// Send a stage failure event.
    pub fn send_failure(&self, failure: StageFailure) {
        self.send(PipelineEvent::StageFailed(failure));
    }

    /// Send a worker started event.
    pub fn send_worker_started(&self, stage: impl Into<String>, index: usize) {
        self.send(PipelineEvent::WorkerStarted {
            stage: stage.into(),
            index,
        });
    }

    /// Send a worker finished event.
    pub fn send_worker_finished(
        &self,
        stage: impl Into<String>,
        index: usize,
        frames_processed: u64,
        failures: u64,
    ) {
        self.send(PipelineEvent::WorkerFinished {
            stage: stage.into(),
            index,
            frames_processed,
            failures,
        });
    }

    /// Create a receiver for events.
    ///
    /// The receiver only sees events sent after this call.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new(256) // Default capacity
    }
}

/// Receiver for pipeline events.
///
/// Multiple receivers can be created from a single sender.
pub struct EventReceiver {
    receiver: broadcast::Receiver<PipelineEvent>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` if the sender has been dropped.
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("event receiver lagged, {} events dropped", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is available or the sender has been dropped.
    pub fn try_recv(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // We missed some events, try again
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// Drain every event currently queued.
    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Wait for the output to reach end of stream.
    ///
    /// Stage failures seen on the way are collected and returned.
    pub async fn wait_eos(&mut self) -> Result<Vec<StageFailure>, String> {
        let mut failures = Vec::new();
        while let Some(event) = self.recv().await {
            match event {
                PipelineEvent::Eos => return Ok(failures),
                PipelineEvent::StageFailed(failure) => failures.push(failure),
                _ => continue,
            }
        }
        Err("Event channel closed unexpectedly".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(frame_index: u64) -> StageFailure {
        StageFailure {
            stage: "resize".into(),
            index: 1,
            frame_index,
            message: "bad".into(),
        }
    }

    #[tokio::test]
    async fn test_event_send_recv() {
        let sender = EventSender::new(16);
        let mut receiver = sender.subscribe();

        sender.send_eos();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event, PipelineEvent::Eos);
    }

    #[tokio::test]
    async fn test_multiple_receivers() {
        let sender = EventSender::new(16);
        let mut receiver1 = sender.subscribe();
        let mut receiver2 = sender.subscribe();

        sender.send_worker_started("mirror", 0);

        // Both receivers should get the event
        let e1 = receiver1.recv().await.unwrap();
        let e2 = receiver2.recv().await.unwrap();

        assert!(matches!(e1, PipelineEvent::WorkerStarted { .. }));
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_wait_eos_collects_failures() {
        let sender = EventSender::new(16);
        let mut receiver = sender.subscribe();

        // Spawn a task to send events
        let sender_clone = sender.clone();
        tokio::spawn(async move {
            sender_clone.send(PipelineEvent::Started { stages: 2 });
            sender_clone.send_failure(failure(3));
            sender_clone.send_eos();
        });

        let failures = receiver.wait_eos().await.unwrap();
        assert_eq!(failures, vec![failure(3)]);
    }

    #[tokio::test]
    async fn test_wait_eos_closed() {
        let sender = EventSender::new(16);
        let mut receiver = sender.subscribe();
        drop(sender);

        assert!(receiver.wait_eos().await.is_err());
    }

    #[test]
    fn test_try_recv_and_drain() {
        let sender = EventSender::default();
        let mut receiver = sender.subscribe();

        assert!(receiver.try_recv().is_none());
        sender.send(PipelineEvent::StopRequested);
        sender.send_worker_finished("mirror", 0, 5, 1);
        sender.send(PipelineEvent::Joined);

        let events = receiver.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], PipelineEvent::StopRequested);
        assert_eq!(events[2], PipelineEvent::Joined);
    }

    #[test]
    fn test_no_receivers_is_fine() {
        let sender = EventSender::new(4);
        assert_eq!(sender.send(PipelineEvent::Eos), 0);
    }

    #[test]
    fn test_event_display() {
        let event = PipelineEvent::StageFailed(failure(2));
        assert_eq!(
            format!("{}", event),
            "Error: stage 'resize' (#1) failed on frame 2: bad"
        );

        let event = PipelineEvent::WorkerFinished {
            stage: "mirror".into(),
            index: 0,
            frames_processed: 4,
            failures: 1,
        };
        assert_eq!(
            format!("{}", event),
            "Worker 0 (mirror) finished (4 frames, 1 failures)"
        );

        assert_eq!(format!("{}", PipelineEvent::Eos), "EOS");
    }
}
