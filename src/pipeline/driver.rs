//! The calling loop around a pipeline.
//!
//! A [`Driver`] reads frames from a [`FrameSource`], submits them, retrieves
//! the processed result, renders it on a [`FrameSink`] and polls a
//! [`StopSignal`], one frame per iteration. On exit it stops the pipeline,
//! drains the output, releases the source and joins the workers.

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::io::{FrameSink, FrameSource, StopSignal};
use crate::pipeline::executor::{Pipeline, PipelineReport, PipelineState};

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source returned no more frames.
    SourceExhausted,
    /// The stop signal fired.
    Requested,
    /// The pipeline ended its stream before the driver stopped it.
    StreamEnded,
}

/// Summary of a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverReport {
    /// Frames read from the source and submitted.
    pub frames_submitted: u64,
    /// Frames rendered successfully.
    pub frames_rendered: u64,
    /// Frames the sink failed to render.
    pub render_failures: u64,
    /// Slots that came back as stage failures.
    pub stage_failures: u64,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Report from joining the pipeline.
    pub pipeline: PipelineReport,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: u64,
    rendered: u64,
    render_failures: u64,
    stage_failures: u64,
}

/// Drives a pipeline from a source to a sink.
///
/// # Example
///
/// ```rust
/// use framechain::io::{NeverStop, NullSink, TestPatternSource};
/// use framechain::pipeline::{Driver, Pipeline};
/// use framechain::stages::Grayscale;
///
/// let mut pipeline = Pipeline::builder().stage(Grayscale::new()).build().unwrap();
/// let source = TestPatternSource::new().with_resolution(32, 24).with_num_frames(5);
///
/// let mut driver = Driver::new(source, NullSink::new(), NeverStop);
/// let report = driver.run(&mut pipeline).unwrap();
/// assert_eq!(report.frames_rendered, 5);
/// ```
pub struct Driver<S, K, T> {
    source: S,
    sink: K,
    stop: T,
}

impl<S, K, T> Driver<S, K, T>
where
    S: FrameSource,
    K: FrameSink,
    T: StopSignal,
{
    /// Create a driver.
    pub fn new(source: S, sink: K, stop: T) -> Self {
        Self { source, sink, stop }
    }

    /// Get the sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Get the source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Take the collaborators back.
    pub fn into_parts(self) -> (S, K, T) {
        (self.source, self.sink, self.stop)
    }

    /// Run until the source is exhausted or the stop signal fires.
    ///
    /// Starts the pipeline if it is idle. The pipeline is always stopped and
    /// joined before this returns, even when the loop fails.
    pub fn run(&mut self, pipeline: &mut Pipeline) -> Result<DriverReport> {
        if pipeline.state() == PipelineState::Idle {
            pipeline.start()?;
        }

        let mut counters = Counters::default();
        let outcome = self.pump(pipeline, &mut counters);
        let finished = self.finish(pipeline, &mut counters);

        let stop_reason = outcome?;
        let pipeline_report = finished?;

        tracing::info!(
            "driver finished ({:?}): {} rendered, {} render failures, {} stage failures",
            stop_reason,
            counters.rendered,
            counters.render_failures,
            counters.stage_failures
        );

        Ok(DriverReport {
            frames_submitted: counters.submitted,
            frames_rendered: counters.rendered,
            render_failures: counters.render_failures,
            stage_failures: counters.stage_failures,
            stop_reason,
            pipeline: pipeline_report,
        })
    }

    fn pump(&mut self, pipeline: &mut Pipeline, counters: &mut Counters) -> Result<StopReason> {
        loop {
            let Some(frame) = self.source.read()? else {
                tracing::debug!("source exhausted");
                return Ok(StopReason::SourceExhausted);
            };
            pipeline.submit(frame)?;
            counters.submitted += 1;

            match pipeline.retrieve() {
                Ok(Some(frame)) => self.render(&frame, counters),
                Ok(None) => {
                    tracing::warn!("pipeline ended its stream unexpectedly");
                    return Ok(StopReason::StreamEnded);
                }
                Err(Error::Stage(failure)) => {
                    tracing::warn!("dropping frame: {}", failure);
                    counters.stage_failures += 1;
                }
                Err(e) => return Err(e),
            }

            if self.stop.should_stop() {
                tracing::debug!("stop requested");
                return Ok(StopReason::Requested);
            }
        }
    }

    fn render(&mut self, frame: &Frame, counters: &mut Counters) {
        match self.sink.render(frame) {
            Ok(()) => counters.rendered += 1,
            Err(e) => {
                tracing::warn!("render failed: {}", e);
                counters.render_failures += 1;
            }
        }
    }

    /// Release, stop, drain, join.
    fn finish(
        &mut self,
        pipeline: &mut Pipeline,
        counters: &mut Counters,
    ) -> Result<PipelineReport> {
        self.source.release();
        if pipeline.state() == PipelineState::Running {
            pipeline.stop()?;
        }
        if pipeline.state() == PipelineState::Stopping {
            loop {
                match pipeline.retrieve() {
                    Ok(Some(frame)) => self.render(&frame, counters),
                    Ok(None) => break,
                    Err(Error::Stage(failure)) => {
                        tracing::warn!("dropping frame: {}", failure);
                        counters.stage_failures += 1;
                    }
                    // join discards whatever is left
                    Err(e) => {
                        tracing::warn!("draining output failed: {}", e);
                        break;
                    }
                }
            }
        }
        pipeline.join()
    }
}
