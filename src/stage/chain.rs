//! Sequential stage composition.

use super::{BoxedStage, Stage};
use crate::error::Result;
use crate::frame::Frame;

/// Applies an ordered list of stages one after another on the calling thread.
///
/// This is the single-threaded counterpart of
/// [`Pipeline`](crate::pipeline::Pipeline): for any input,
/// `Chain::process` and a pipeline built from the same stages produce the
/// same frame. A `Chain` is itself a [`Stage`], so it can be nested inside a
/// pipeline to run several transformations on one worker.
///
/// # Example
///
/// ```rust
/// use framechain::frame::{Frame, PixelFormat};
/// use framechain::stage::Chain;
/// use framechain::stages::{Grayscale, Mirror, Resize};
///
/// let chain = Chain::new()
///     .then(Grayscale::new())
///     .then(Mirror::new())
///     .then(Resize::half());
///
/// let out = chain.process(Frame::zeroed(64, 48, PixelFormat::Bgr24)).unwrap();
/// assert_eq!((out.width(), out.height(), out.channels()), (32, 24, 1));
/// ```
pub struct Chain {
    name: String,
    stages: Vec<BoxedStage>,
}

impl Chain {
    /// Create an empty chain. An empty chain returns its input unchanged.
    pub fn new() -> Self {
        Self {
            name: "chain".to_string(),
            stages: Vec::new(),
        }
    }

    /// Create a chain from already boxed stages.
    pub fn from_stages(stages: Vec<BoxedStage>) -> Self {
        Self {
            name: "chain".to_string(),
            stages,
        }
    }

    /// Set a custom name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a stage.
    pub fn then(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Pass a frame through every stage in order.
    pub fn process(&self, frame: Frame) -> Result<Frame> {
        self.stages
            .iter()
            .try_fold(frame, |frame, stage| stage.apply(frame))
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Names of the contained stages, in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Chain {
    fn apply(&self, frame: Frame) -> Result<Frame> {
        self.process(frame)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::frame::PixelFormat;
    use crate::stage::FnStage;

    fn add(n: u8) -> FnStage<impl Fn(Frame) -> Result<Frame> + Send + Sync> {
        FnStage::new(format!("add{n}"), move |mut frame: Frame| {
            for b in frame.as_bytes_mut() {
                *b = b.wrapping_add(n);
            }
            Ok(frame)
        })
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let frame = Frame::from_fn(4, 4, PixelFormat::Bgr24, |x, y| [x as u8, y as u8, 7, 0]);
        let chain = Chain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.process(frame.clone()).unwrap(), frame);
    }

    #[test]
    fn test_stages_run_in_order() {
        let double = FnStage::new("double", |mut frame: Frame| {
            for b in frame.as_bytes_mut() {
                *b = b.wrapping_mul(2);
            }
            Ok(frame)
        });
        let chain = Chain::new().then(add(1)).then(double);

        let out = chain.process(Frame::zeroed(1, 1, PixelFormat::Gray8)).unwrap();
        // (0 + 1) * 2, not 0 * 2 + 1
        assert_eq!(out.as_bytes(), &[2]);
        assert_eq!(chain.stage_names(), vec!["add1", "double"]);
    }

    #[test]
    fn test_first_error_short_circuits() {
        let chain = Chain::new()
            .then(FnStage::new("fail", |_f: Frame| {
                Err(Error::InvalidFrame("bad".into()))
            }))
            .then(add(1));

        assert!(matches!(
            chain.process(Frame::zeroed(1, 1, PixelFormat::Gray8)),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_chain_is_a_stage() {
        let inner = Chain::new().then(add(2)).with_name("inner");
        let outer = Chain::new().then(inner).then(add(3));

        let out = outer.apply(Frame::zeroed(1, 1, PixelFormat::Gray8)).unwrap();
        assert_eq!(out.as_bytes(), &[5]);
        assert_eq!(outer.stage_names(), vec!["inner", "add3"]);
    }
}
