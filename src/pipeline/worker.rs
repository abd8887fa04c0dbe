//! Stage workers.
//!
//! A worker is one OS thread bound to one stage and the two links around it.
//! It receives from upstream, applies its stage and sends downstream until it
//! observes end-of-stream, which it forwards before terminating.

use crate::error::{Error, Result, StageFailure};
use crate::frame::Frame;
use crate::link::{LinkReceiver, LinkSender, Message};
use crate::observability::{StageMetrics, TracingConfig, trace_eos};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::events::EventSender;
use crate::stage::BoxedStage;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Receiving and transforming frames.
    Running,
    /// End-of-stream observed, forwarding it downstream.
    Draining,
    /// The loop has exited. Never left.
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Running => write!(f, "Running"),
            WorkerState::Draining => write!(f, "Draining"),
            WorkerState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// What a worker did, returned when its thread is joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Stage name.
    pub stage: String,
    /// Stage position (0-based).
    pub index: usize,
    /// Frames the stage transformed successfully.
    pub frames_processed: u64,
    /// Frames the stage failed on.
    pub failures: u64,
    /// Upstream failures passed through without applying the stage.
    pub forwarded_failures: u64,
    /// State the worker ended in.
    pub state: WorkerState,
}

/// Spawn the worker thread for stage `index`.
///
/// The thread is named `<prefix>-<index>-<stage>`.
pub(crate) fn spawn_worker(
    config: &PipelineConfig,
    index: usize,
    stage: BoxedStage,
    upstream: LinkReceiver,
    downstream: LinkSender,
    events: EventSender,
) -> Result<JoinHandle<Result<WorkerReport>>> {
    let name = stage.name().to_string();
    let thread_name = format!("{}-{}-{}", config.thread_name_prefix, index, name);

    let worker = Worker {
        metrics: StageMetrics::new(&config.thread_name_prefix, &name, index),
        pipeline: config.thread_name_prefix.clone(),
        tracing: config.tracing.clone(),
        name,
        index,
        stage,
        upstream,
        downstream,
        events,
        state: WorkerState::Running,
        frames_processed: 0,
        failures: 0,
        forwarded_failures: 0,
    };

    let mut builder = thread::Builder::new().name(thread_name);
    if let Some(size) = config.stack_size {
        builder = builder.stack_size(size);
    }
    Ok(builder.spawn(move || worker.run())?)
}

struct Worker {
    name: String,
    index: usize,
    pipeline: String,
    stage: BoxedStage,
    upstream: LinkReceiver,
    downstream: LinkSender,
    events: EventSender,
    metrics: StageMetrics,
    tracing: TracingConfig,
    state: WorkerState,
    frames_processed: u64,
    failures: u64,
    forwarded_failures: u64,
}

impl Worker {
    fn run(mut self) -> Result<WorkerReport> {
        let span = self.tracing.stage_span(&self.pipeline, &self.name, self.index);
        let _enter = span.enter();

        tracing::debug!("worker '{}' started", self.name);
        self.events.send_worker_started(&self.name, self.index);

        while self.state == WorkerState::Running {
            let message = match self.upstream.recv() {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(
                        "worker '{}': upstream closed without end of stream ({}), forwarding EOS",
                        self.name,
                        e
                    );
                    Message::Eos
                }
            };

            match message {
                Message::Frame { index, frame } => {
                    let out = self.process(index, frame);
                    self.forward(out)?;
                }
                Message::Failed(failure) => {
                    tracing::trace!(
                        "worker '{}' passing through failure from '{}'",
                        self.name,
                        failure.stage
                    );
                    self.forwarded_failures += 1;
                    self.forward(Message::Failed(failure))?;
                }
                Message::Eos => {
                    self.state = WorkerState::Draining;
                    trace_eos(&self.pipeline, &self.name);
                    self.events.send_worker_finished(
                        &self.name,
                        self.index,
                        self.frames_processed,
                        self.failures,
                    );
                    self.forward(Message::Eos)?;
                    self.state = WorkerState::Terminated;
                }
            }
        }

        tracing::debug!(
            "worker '{}' finished ({} frames, {} failures)",
            self.name,
            self.frames_processed,
            self.failures
        );
        Ok(self.report())
    }

    /// Apply the stage to one frame, turning errors and panics into a
    /// failure message for the same slot.
    fn process(&mut self, frame_index: u64, frame: Frame) -> Message {
        let span = self.tracing.frame_span(frame_index);
        let _enter = span.enter();

        let result = {
            let _timer = self.metrics.start_timer();
            let stage = &self.stage;
            panic::catch_unwind(AssertUnwindSafe(|| stage.apply(frame)))
        };

        let message = match result {
            Ok(Ok(frame)) => {
                self.frames_processed += 1;
                self.metrics.record_processed();
                tracing::trace!("worker '{}' processed frame {}", self.name, frame_index);
                return Message::Frame {
                    index: frame_index,
                    frame,
                };
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("stage panicked: {}", panic_message(payload.as_ref())),
        };

        let failure = StageFailure {
            stage: self.name.clone(),
            index: self.index,
            frame_index,
            message,
        };
        self.failures += 1;
        self.metrics.record_failure();
        tracing::warn!("{}", failure);
        self.events.send_failure(failure.clone());
        Message::Failed(failure)
    }

    fn forward(&mut self, message: Message) -> Result<()> {
        if let Err(e) = self.downstream.send_message(message) {
            tracing::warn!("worker '{}': downstream receiver dropped", self.name);
            self.state = WorkerState::Terminated;
            return Err(match e {
                Error::ChannelClosed(_) => Error::ChannelClosed(format!(
                    "stage '{}' (#{}) lost its downstream link",
                    self.name, self.index
                )),
                other => other,
            });
        }
        Ok(())
    }

    fn report(&self) -> WorkerReport {
        WorkerReport {
            stage: self.name.clone(),
            index: self.index,
            frames_processed: self.frames_processed,
            failures: self.failures,
            forwarded_failures: self.forwarded_failures,
            state: self.state,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
