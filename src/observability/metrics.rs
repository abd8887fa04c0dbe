//! Metrics collection using metrics-rs.

use metrics::{Counter, Histogram, Unit, counter, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

// Metric names as constants for consistency
const FRAMES_SUBMITTED: &str = "framechain_frames_submitted";
const FRAMES_RETRIEVED: &str = "framechain_frames_retrieved";
const FRAMES_PROCESSED: &str = "framechain_frames_processed";
const STAGE_FAILURES: &str = "framechain_stage_failures";
const STAGE_TIME_NS: &str = "framechain_stage_time_ns";
const CHANNEL_DEPTH: &str = "framechain_channel_depth";

/// Initialize metrics descriptions.
///
/// Call this once at application startup, after installing a recorder.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    metrics::describe_counter!(
        FRAMES_SUBMITTED,
        Unit::Count,
        "Frames submitted into a pipeline"
    );
    metrics::describe_counter!(
        FRAMES_RETRIEVED,
        Unit::Count,
        "Frames retrieved from a pipeline's output"
    );
    metrics::describe_counter!(
        FRAMES_PROCESSED,
        Unit::Count,
        "Frames transformed successfully by a stage"
    );
    metrics::describe_counter!(
        STAGE_FAILURES,
        Unit::Count,
        "Frames a stage failed to transform"
    );
    metrics::describe_histogram!(
        STAGE_TIME_NS,
        Unit::Nanoseconds,
        "Time for a stage to transform a single frame"
    );
    metrics::describe_gauge!(
        CHANNEL_DEPTH,
        Unit::Count,
        "Number of messages pending in a link"
    );
}

/// Record channel depth (pending messages).
#[inline]
pub fn record_channel_depth(pipeline: &str, link: usize, depth: usize) {
    gauge!(CHANNEL_DEPTH, "pipeline" => pipeline.to_string(), "link" => link.to_string())
        .set(depth as f64);
}

/// Metrics collector for one stage worker.
///
/// Provides a convenient way to record metrics with pre-configured labels.
#[derive(Clone)]
pub struct StageMetrics {
    stage: String,
    processed: Counter,
    failures: Counter,
    processing_time: Histogram,
}

impl StageMetrics {
    /// Create a new stage metrics collector.
    pub fn new(pipeline: &str, stage: &str, index: usize) -> Self {
        Self {
            stage: stage.to_string(),
            processed: counter!(
                FRAMES_PROCESSED,
                "pipeline" => pipeline.to_string(),
                "stage" => stage.to_string(),
                "index" => index.to_string()
            ),
            failures: counter!(
                STAGE_FAILURES,
                "pipeline" => pipeline.to_string(),
                "stage" => stage.to_string(),
                "index" => index.to_string()
            ),
            processing_time: histogram!(
                STAGE_TIME_NS,
                "pipeline" => pipeline.to_string(),
                "stage" => stage.to_string(),
                "index" => index.to_string()
            ),
        }
    }

    /// Record a successfully transformed frame.
    #[inline]
    pub fn record_processed(&self) {
        self.processed.increment(1);
    }

    /// Record a failed frame.
    #[inline]
    pub fn record_failure(&self) {
        self.failures.increment(1);
    }

    /// Record processing time.
    #[inline]
    pub fn record_time(&self, duration: Duration) {
        self.processing_time.record(duration.as_nanos() as f64);
    }

    /// Start a timer and return a guard that records on drop.
    pub fn start_timer(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Get the stage name.
    pub fn stage(&self) -> &str {
        &self.stage
    }
}

/// Guard that records processing time when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    metrics: &'a StageMetrics,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_time(self.start.elapsed());
    }
}

/// Metrics collector for the pipeline's input and output points.
#[derive(Clone)]
pub struct PipelineMetrics {
    name: String,
    submitted: Counter,
    retrieved: Counter,
}

impl PipelineMetrics {
    /// Create a new pipeline metrics collector.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            submitted: counter!(FRAMES_SUBMITTED, "pipeline" => name.to_string()),
            retrieved: counter!(FRAMES_RETRIEVED, "pipeline" => name.to_string()),
        }
    }

    /// Record a submitted frame.
    #[inline]
    pub fn record_submitted(&self) {
        self.submitted.increment(1);
    }

    /// Record a retrieved frame.
    #[inline]
    pub fn record_retrieved(&self) {
        self.retrieved.increment(1);
    }

    /// Get the pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
