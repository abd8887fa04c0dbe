//! Observability features: metrics and tracing.
//!
//! - **Metrics**: counters, gauges and histograms via `metrics-rs`. Nothing
//!   is recorded until the application installs a recorder.
//! - **Tracing**: structured logging and spans via `tracing`.
//!
//! ## Metrics
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `framechain_frames_submitted` | Counter | Frames submitted |
//! | `framechain_frames_retrieved` | Counter | Frames retrieved |
//! | `framechain_frames_processed` | Counter | Frames a stage transformed |
//! | `framechain_stage_failures` | Counter | Frames a stage failed on |
//! | `framechain_stage_time_ns` | Histogram | Stage time per frame |
//! | `framechain_channel_depth` | Gauge | Messages pending in a link |
//!
//! ## Tracing
//!
//! Every worker thread runs inside a `stage` span; frame spans are opt-in
//! through [`TracingConfig`].

mod metrics;
mod tracing_support;

pub use metrics::{PipelineMetrics, StageMetrics, TimerGuard, init_metrics, record_channel_depth};
pub use tracing_support::{TracingConfig, span_pipeline, span_stage, trace_eos};
