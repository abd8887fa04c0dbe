//! Tracing integration for structured logging and spans.

use tracing::{Level, Span, span};

/// Configuration for tracing behavior.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Whether to create a span around pipeline lifecycle calls.
    pub pipeline_spans: bool,
    /// Whether each worker thread runs inside a stage span.
    pub stage_spans: bool,
    /// Whether to create a span per frame (can be expensive).
    pub frame_spans: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            pipeline_spans: true,
            stage_spans: true,
            frame_spans: false, // Can be expensive
        }
    }
}

impl TracingConfig {
    /// Create a new tracing config with all spans enabled.
    pub fn all() -> Self {
        Self {
            pipeline_spans: true,
            stage_spans: true,
            frame_spans: true,
        }
    }

    /// Disable all spans.
    pub fn none() -> Self {
        Self {
            pipeline_spans: false,
            stage_spans: false,
            frame_spans: false,
        }
    }

    /// Span for a pipeline lifecycle call, or a disabled span.
    pub(crate) fn pipeline_span(&self, pipeline: &str) -> Span {
        if self.pipeline_spans {
            span_pipeline(pipeline)
        } else {
            Span::none()
        }
    }

    /// Span for a worker thread, or a disabled span.
    pub(crate) fn stage_span(&self, pipeline: &str, stage: &str, index: usize) -> Span {
        if self.stage_spans {
            span_stage(pipeline, stage, index)
        } else {
            Span::none()
        }
    }

    /// Span for one frame inside a stage, or a disabled span.
    pub(crate) fn frame_span(&self, frame_index: u64) -> Span {
        if self.frame_spans {
            span!(Level::TRACE, "frame", index = frame_index)
        } else {
            Span::none()
        }
    }
}

/// Create a span for pipeline lifecycle calls.
///
/// # Example
///
/// ```rust
/// use framechain::observability::span_pipeline;
///
/// let span = span_pipeline("camera");
/// let _guard = span.enter();
/// // Pipeline calls here...
/// ```
#[inline]
pub fn span_pipeline(name: &str) -> Span {
    span!(Level::INFO, "pipeline", name = %name)
}

/// Create a span for one stage worker.
#[inline]
pub fn span_stage(pipeline: &str, stage: &str, index: usize) -> Span {
    span!(
        Level::DEBUG,
        "stage",
        pipeline = %pipeline,
        stage = %stage,
        index = index
    )
}

/// Log end-of-stream passing a stage.
#[inline]
pub fn trace_eos(pipeline: &str, stage: &str) {
    tracing::debug!(
        pipeline = %pipeline,
        stage = %stage,
        "end of stream"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert!(config.pipeline_spans);
        assert!(config.stage_spans);
        assert!(!config.frame_spans);
    }

    #[test]
    fn test_tracing_config_presets() {
        assert!(TracingConfig::all().frame_spans);
        let none = TracingConfig::none();
        assert!(!none.pipeline_spans && !none.stage_spans && !none.frame_spans);
        assert!(none.stage_span("p", "s", 0).is_none());
    }

    #[test]
    fn test_span_creation() {
        // These should not panic without a subscriber
        let _span = span_pipeline("test-pipeline");
        let _span = span_stage("test-pipeline", "mirror", 1);
        trace_eos("test-pipeline", "mirror");
    }
}
