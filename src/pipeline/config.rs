//! Pipeline configuration.

use crate::error::{Error, Result};
use crate::link::{FrameLink, LinkReceiver, LinkSender};
use crate::observability::TracingConfig;
use std::time::Duration;

/// Capacity of each link between pipeline points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// At most this many frames wait in each link. Zero makes every hand-off
    /// a rendezvous.
    Bounded(usize),
    /// Links never block the sender.
    Unbounded,
}

impl Capacity {
    /// Create a link with this capacity.
    pub(crate) fn link(&self) -> (LinkSender, LinkReceiver) {
        match *self {
            Capacity::Bounded(n) => FrameLink::bounded(n),
            Capacity::Unbounded => FrameLink::unbounded(),
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Bounded(16)
    }
}

/// Configuration for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capacity of every link (N stages use N + 1 links).
    pub channel_capacity: Capacity,
    /// Prefix for worker thread names: `<prefix>-<index>-<stage>`.
    pub thread_name_prefix: String,
    /// Stack size for worker threads; the platform default when `None`.
    pub stack_size: Option<usize>,
    /// Capacity of the event broadcast buffer.
    pub event_capacity: usize,
    /// Timeout applied by `retrieve`; blocks forever when `None`.
    pub retrieve_timeout: Option<Duration>,
    /// Which tracing spans workers create.
    pub tracing: TracingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: Capacity::default(),
            thread_name_prefix: "framechain".to_string(),
            stack_size: None,
            event_capacity: 256,
            retrieve_timeout: None,
            tracing: TracingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a config with custom channel capacity.
    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: Capacity::Bounded(channel_capacity),
            ..Default::default()
        }
    }

    /// Use unbounded links.
    pub fn unbounded(mut self) -> Self {
        self.channel_capacity = Capacity::Unbounded;
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker stack size.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Set the event buffer capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the retrieve timeout.
    pub fn with_retrieve_timeout(mut self, timeout: Duration) -> Self {
        self.retrieve_timeout = Some(timeout);
        self
    }

    /// Set the tracing configuration.
    pub fn with_tracing(mut self, tracing: TracingConfig) -> Self {
        self.tracing = tracing;
        self
    }

    /// Check the configuration for values the pipeline cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.is_empty() {
            return Err(Error::InvalidConfig("thread name prefix is empty".into()));
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig("event capacity must be non-zero".into()));
        }
        if self.stack_size == Some(0) {
            return Err(Error::InvalidConfig("stack size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.channel_capacity, Capacity::Bounded(16));
        assert_eq!(config.thread_name_prefix, "framechain");
        assert!(config.retrieve_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = PipelineConfig::with_capacity(2)
            .with_thread_name_prefix("cam")
            .with_stack_size(1 << 20)
            .with_retrieve_timeout(Duration::from_millis(50));

        assert_eq!(config.channel_capacity, Capacity::Bounded(2));
        assert_eq!(config.thread_name_prefix, "cam");
        assert_eq!(config.stack_size, Some(1 << 20));
        assert_eq!(config.retrieve_timeout, Some(Duration::from_millis(50)));
        assert_eq!(config.unbounded().channel_capacity, Capacity::Unbounded);
    }

    #[test]
    fn test_validate() {
        assert!(
            PipelineConfig::default()
                .with_thread_name_prefix("")
                .validate()
                .is_err()
        );
        assert!(
            PipelineConfig::default()
                .with_event_capacity(0)
                .validate()
                .is_err()
        );
        assert!(PipelineConfig::default().with_stack_size(0).validate().is_err());
    }
}
