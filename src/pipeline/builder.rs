//! Fluent pipeline builder.
//!
//! # Example
//!
//! ```rust
//! use framechain::pipeline::{Pipeline, PipelineConfig};
//! use framechain::stages::{Grayscale, Mirror, Resize};
//!
//! let pipeline = Pipeline::builder()
//!     .stage(Grayscale::new())
//!     .stage(Mirror::new())
//!     .stage(Resize::half())
//!     .config(PipelineConfig::with_capacity(4))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(pipeline.stage_names(), &["grayscale", "mirror", "resize"]);
//! ```

use crate::error::Result;
use crate::pipeline::config::{Capacity, PipelineConfig};
use crate::pipeline::executor::Pipeline;
use crate::stage::{BoxedStage, Stage};

/// A fluent builder for constructing pipelines.
///
/// Stages run in the order they are added.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedStage>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new empty pipeline builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append an already boxed stage.
    pub fn boxed(mut self, stage: BoxedStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append several stages.
    pub fn stages(mut self, stages: impl IntoIterator<Item = BoxedStage>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the link capacity.
    pub fn channel_capacity(mut self, capacity: Capacity) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Set the worker thread name prefix.
    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Validate the configuration and build the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::with_config(self.stages, self.config)
    }
}
