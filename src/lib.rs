//! # framechain
//!
//! A staged, concurrent frame processing pipeline.
//!
//! Frames flow through an ordered chain of independent stages. Each stage
//! runs on its own thread, connected to its neighbours by bounded hand-off
//! links, so a live stream is processed by all stages at once while every
//! frame still passes through them in order.
//!
//! ## Features
//!
//! - **Thread per stage**: one named worker thread per [`Stage`](stage::Stage)
//! - **Backpressure**: bounded links block fast producers
//! - **Deterministic shutdown**: end-of-stream travels down the chain and
//!   every worker is joined
//! - **Failures stay in order**: a frame a stage fails on comes back as an
//!   error in that frame's slot, and the pipeline keeps running
//!
//! ## Quick Start
//!
//! ```rust
//! use framechain::prelude::*;
//!
//! let mut pipeline = Pipeline::builder()
//!     .stage(Grayscale::new())
//!     .stage(Mirror::new())
//!     .stage(Resize::half())
//!     .build()?;
//!
//! pipeline.start()?;
//! pipeline.submit(Frame::zeroed(640, 480, PixelFormat::Bgr24))?;
//!
//! let out = pipeline.retrieve()?.expect("one frame in, one frame out");
//! assert_eq!((out.width(), out.height()), (320, 240));
//! assert_eq!(out.format(), PixelFormat::Gray8);
//!
//! pipeline.stop()?;
//! assert!(pipeline.retrieve()?.is_none());
//! pipeline.join()?;
//! # Ok::<(), framechain::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod frame;
pub mod io;
pub mod link;
pub mod metadata;
pub mod observability;
pub mod pipeline;
pub mod stage;
pub mod stages;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result, StageFailure};
    pub use crate::frame::{Frame, PixelFormat};
    pub use crate::io::{FrameSink, FrameSource, StopSignal};
    pub use crate::metadata::FrameMetadata;
    pub use crate::pipeline::{Driver, Pipeline, PipelineConfig, PipelineState};
    pub use crate::stage::{BoxedStage, Chain, FnStage, Stage};
    pub use crate::stages::{EdgeDetect, Grayscale, Identity, Mirror, Resize};
}

pub use error::{Error, Result};
