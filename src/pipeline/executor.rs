//! The staged pipeline.
//!
//! A [`Pipeline`] owns an ordered list of stages. `start` allocates N + 1
//! links and spawns one worker thread per stage; the pipeline keeps the
//! sending end of the first link and the receiving end of the last one.

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::link::{LinkReceiver, LinkSender, Message};
use crate::observability::{PipelineMetrics, init_metrics, record_channel_depth};
use crate::pipeline::builder::PipelineBuilder;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::events::{EventReceiver, EventSender, PipelineEvent};
use crate::pipeline::worker::{WorkerReport, spawn_worker};
use crate::stage::BoxedStage;
use std::fmt;
use std::thread::JoinHandle;
use std::time::Duration;

/// Lifecycle of a pipeline. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, no threads yet.
    Idle,
    /// Workers are running and frames may be submitted.
    Running,
    /// End-of-stream was sent into the pipeline.
    Stopping,
    /// End-of-stream was retrieved from the output.
    Drained,
    /// All workers were joined.
    Joined,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::Running => write!(f, "Running"),
            PipelineState::Stopping => write!(f, "Stopping"),
            PipelineState::Drained => write!(f, "Drained"),
            PipelineState::Joined => write!(f, "Joined"),
        }
    }
}

/// Summary returned by [`Pipeline::join`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// One report per stage, in stage order.
    pub workers: Vec<WorkerReport>,
    /// Frames and failures still queued at the output when `join` drained it.
    pub discarded_frames: u64,
}

impl PipelineReport {
    /// Total stage failures across all workers.
    pub fn failures(&self) -> u64 {
        self.workers.iter().map(|w| w.failures).sum()
    }

    /// Frames the last stage produced, or `None` for an empty pipeline.
    pub fn frames_out(&self) -> Option<u64> {
        self.workers.last().map(|w| w.frames_processed)
    }
}

/// A linear chain of stages, each running on its own thread.
///
/// # Example
///
/// ```rust
/// use framechain::frame::{Frame, PixelFormat};
/// use framechain::pipeline::Pipeline;
/// use framechain::stages::{Grayscale, Mirror};
///
/// let mut pipeline = Pipeline::builder()
///     .stage(Grayscale::new())
///     .stage(Mirror::new())
///     .build()
///     .unwrap();
///
/// pipeline.start().unwrap();
/// pipeline.submit(Frame::zeroed(4, 4, PixelFormat::Bgr24)).unwrap();
/// let out = pipeline.retrieve().unwrap().unwrap();
/// assert_eq!(out.format(), PixelFormat::Gray8);
///
/// pipeline.stop().unwrap();
/// assert!(pipeline.retrieve().unwrap().is_none());
/// pipeline.join().unwrap();
/// ```
pub struct Pipeline {
    stages: Vec<BoxedStage>,
    stage_names: Vec<String>,
    config: PipelineConfig,
    state: PipelineState,
    input: Option<LinkSender>,
    output: Option<LinkReceiver>,
    workers: Vec<JoinHandle<Result<WorkerReport>>>,
    events: EventSender,
    metrics: PipelineMetrics,
    next_index: u64,
}

impl Pipeline {
    /// Create a pipeline with the default configuration.
    pub fn new(stages: Vec<BoxedStage>) -> Self {
        let config = PipelineConfig::default();
        Self::build(stages, config)
    }

    /// Create a pipeline with a custom configuration.
    pub fn with_config(stages: Vec<BoxedStage>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(stages, config))
    }

    /// Start building a pipeline stage by stage.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    fn build(stages: Vec<BoxedStage>, config: PipelineConfig) -> Self {
        let stage_names = stages.iter().map(|s| s.name().to_string()).collect();
        Self {
            stages,
            stage_names,
            events: EventSender::new(config.event_capacity),
            metrics: PipelineMetrics::new(&config.thread_name_prefix),
            config,
            state: PipelineState::Idle,
            input: None,
            output: None,
            workers: Vec::new(),
            next_index: 0,
        }
    }

    /// Allocate the links and spawn one worker per stage.
    pub fn start(&mut self) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(Error::AlreadyStarted);
        }
        init_metrics();
        let _span = self.lifecycle_span().entered();

        tracing::info!(
            "starting pipeline '{}' with {} stages",
            self.config.thread_name_prefix,
            self.stage_names.len()
        );
        self.events.send(PipelineEvent::Started {
            stages: self.stage_names.len(),
        });

        let stages = std::mem::take(&mut self.stages);
        let (input, mut upstream) = self.config.channel_capacity.link();
        let mut workers = Vec::with_capacity(stages.len());

        for (index, stage) in stages.into_iter().enumerate() {
            let (tx, rx) = self.config.channel_capacity.link();
            match spawn_worker(&self.config, index, stage, upstream, tx, self.events.clone()) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    tracing::error!("failed to spawn worker {}: {}", index, e);
                    // Dropping the input unwinds the workers spawned so far.
                    drop(input);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    self.state = PipelineState::Joined;
                    return Err(e);
                }
            }
            upstream = rx;
        }

        self.input = Some(input);
        self.output = Some(upstream);
        self.workers = workers;
        self.state = PipelineState::Running;
        Ok(())
    }

    /// Submit a frame. Blocks while the first link is full.
    pub fn submit(&mut self, frame: Frame) -> Result<()> {
        match self.state {
            PipelineState::Idle => return Err(Error::NotStarted),
            PipelineState::Running => {}
            _ => return Err(Error::ChannelClosed("submit after stop".into())),
        }
        let input = self.input.as_mut().ok_or(Error::NotStarted)?;

        let index = self.next_index;
        input.send(frame, index)?;
        self.next_index += 1;

        self.metrics.record_submitted();
        record_channel_depth(self.metrics.name(), 0, input.len());
        tracing::trace!("submitted frame {}", index);
        Ok(())
    }

    /// Retrieve the next processed frame.
    ///
    /// - `Ok(Some(frame))`: the next frame in submission order.
    /// - `Ok(None)`: end of stream; the pipeline is drained.
    /// - `Err(Error::Stage(_))`: the frame in this slot failed in a stage.
    ///
    /// Uses [`PipelineConfig::retrieve_timeout`] when it is set.
    pub fn retrieve(&mut self) -> Result<Option<Frame>> {
        let timeout = self.config.retrieve_timeout;
        self.receive(timeout)
    }

    /// Retrieve with an explicit timeout, returning [`Error::Timeout`] on
    /// expiry.
    pub fn retrieve_timeout(&mut self, timeout: Duration) -> Result<Option<Frame>> {
        self.receive(Some(timeout))
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Option<Frame>> {
        match self.state {
            PipelineState::Idle => return Err(Error::NotStarted),
            PipelineState::Drained | PipelineState::Joined => return Err(Error::StreamEnded),
            PipelineState::Running | PipelineState::Stopping => {}
        }
        let output = self.output.as_mut().ok_or(Error::NotStarted)?;

        let message = match timeout {
            Some(timeout) => output.recv_timeout(timeout)?,
            None => output.recv()?,
        };

        match message {
            Message::Frame { index, frame } => {
                self.metrics.record_retrieved();
                tracing::trace!("retrieved frame {}", index);
                Ok(Some(frame))
            }
            Message::Failed(failure) => Err(Error::Stage(failure)),
            Message::Eos => {
                self.state = PipelineState::Drained;
                tracing::debug!("pipeline '{}' drained", self.config.thread_name_prefix);
                self.events.send_eos();
                Ok(None)
            }
        }
    }

    /// Send end-of-stream into the pipeline.
    ///
    /// Blocks while the first link is full.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Idle => return Err(Error::NotStarted),
            PipelineState::Running => {}
            _ => return Err(Error::AlreadyStopped),
        }
        self.state = PipelineState::Stopping;
        let _span = self.lifecycle_span().entered();

        tracing::info!("stopping pipeline '{}'", self.config.thread_name_prefix);
        self.events.send(PipelineEvent::StopRequested);

        let mut input = self.input.take().ok_or(Error::NotStarted)?;
        input.send_eos()
    }

    /// Wait for every worker to finish.
    ///
    /// Frames still queued at the output are discarded so that no worker
    /// stays blocked on a full link.
    pub fn join(&mut self) -> Result<PipelineReport> {
        match self.state {
            PipelineState::Idle => return Err(Error::NotStarted),
            PipelineState::Running => return Err(Error::JoinWithoutStop),
            PipelineState::Joined => return Err(Error::AlreadyJoined),
            PipelineState::Stopping | PipelineState::Drained => {}
        }
        let _span = self.lifecycle_span().entered();

        let discarded_frames = if self.state == PipelineState::Stopping {
            self.drain_output()
        } else {
            0
        };
        self.output = None;

        let mut workers = Vec::with_capacity(self.workers.len());
        let mut first_error = None;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            match handle.join() {
                Ok(Ok(report)) => workers.push(report),
                Ok(Err(e)) => {
                    tracing::warn!("worker '{}' ended with error: {}", name, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(_) => {
                    tracing::error!("worker '{}' panicked", name);
                    if first_error.is_none() {
                        first_error = Some(Error::WorkerPanicked(name));
                    }
                }
            }
        }

        self.state = PipelineState::Joined;
        self.events.send(PipelineEvent::Joined);
        tracing::info!("pipeline '{}' joined", self.config.thread_name_prefix);

        match first_error {
            Some(e) => Err(e),
            None => Ok(PipelineReport {
                workers,
                discarded_frames,
            }),
        }
    }

    /// Span entered by `start`, `stop` and `join`.
    fn lifecycle_span(&self) -> tracing::Span {
        self.config.tracing.pipeline_span(&self.config.thread_name_prefix)
    }

    /// Receive until end of stream, counting what is thrown away.
    fn drain_output(&mut self) -> u64 {
        let Some(output) = self.output.as_mut() else {
            return 0;
        };

        let mut discarded = 0;
        loop {
            match output.recv() {
                Ok(Message::Eos) => {
                    self.state = PipelineState::Drained;
                    self.events.send_eos();
                    break;
                }
                Ok(Message::Frame { index, .. }) => {
                    tracing::warn!("discarding unretrieved frame {}", index);
                    discarded += 1;
                }
                Ok(Message::Failed(failure)) => {
                    tracing::warn!("discarding unretrieved failure: {}", failure);
                    discarded += 1;
                }
                Err(e) => {
                    tracing::warn!("output closed while draining: {}", e);
                    break;
                }
            }
        }
        discarded
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Stage names in order.
    pub fn stage_names(&self) -> &[String] {
        &self.stage_names
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stage_names.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stage_names.is_empty()
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Subscribe to pipeline events.
    ///
    /// The receiver only sees events sent after this call, so subscribe
    /// before `start` to observe everything.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(mut input) = self.input.take() {
            // A full link is fine: the first worker sees the disconnect instead.
            let _ = input.try_send_eos();
        }
        // Dropping the output unblocks a last worker waiting on a full link;
        // the handles are detached.
        self.output = None;
        if !self.workers.is_empty() {
            tracing::debug!(
                "pipeline '{}' dropped with {} unjoined workers",
                self.config.thread_name_prefix,
                self.workers.len()
            );
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}
