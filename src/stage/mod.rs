//! Stage traits.
//!
//! A [`Stage`] is one pure transformation step: it takes ownership of a
//! frame and returns a new one. Stages hold only parameters fixed at
//! construction, so `apply` takes `&self`.
//!
//! # Example
//!
//! ```rust
//! use framechain::frame::{Frame, PixelFormat};
//! use framechain::stage::{FnStage, Stage};
//!
//! let invert = FnStage::new("invert", |mut frame: Frame| {
//!     for b in frame.as_bytes_mut() {
//!         *b = 255 - *b;
//!     }
//!     Ok(frame)
//! });
//!
//! let out = invert.apply(Frame::zeroed(2, 2, PixelFormat::Gray8)).unwrap();
//! assert_eq!(out.as_bytes(), &[255, 255, 255, 255]);
//! ```

mod chain;

pub use chain::Chain;

use crate::error::Result;
use crate::frame::Frame;
use std::sync::Arc;

/// A pure transformation `Frame -> Frame`.
///
/// # Contract
///
/// - Deterministic given its input and construction-time parameters.
/// - Never retains a frame between calls.
/// - Returns `Err` for input it cannot handle; it must not panic for
///   well-formed input.
pub trait Stage: Send + Sync {
    /// Transform one frame.
    fn apply(&self, frame: Frame) -> Result<Frame>;

    /// Get the name of this stage (for debugging/logging).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Boxed stage, as stored by pipelines.
pub type BoxedStage = Box<dyn Stage>;

impl<S: Stage + ?Sized> Stage for Box<S> {
    fn apply(&self, frame: Frame) -> Result<Frame> {
        (**self).apply(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: Stage + ?Sized> Stage for Arc<S> {
    fn apply(&self, frame: Frame) -> Result<Frame> {
        (**self).apply(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A stage backed by a closure.
pub struct FnStage<F> {
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(Frame) -> Result<Frame> + Send + Sync,
{
    /// Wrap `func` under the given name.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(Frame) -> Result<Frame> + Send + Sync,
{
    fn apply(&self, frame: Frame) -> Result<Frame> {
        (self.func)(frame)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}
