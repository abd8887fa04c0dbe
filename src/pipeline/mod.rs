//! Pipeline construction and execution.
//!
//! This module provides the staged pipeline engine:
//!
//! - [`Pipeline`]: owns the stages, the links and one worker per stage
//! - [`PipelineBuilder`]: fluent construction
//! - [`PipelineConfig`]: link capacity, thread naming, timeouts
//! - [`PipelineEvent`]: events broadcast during execution
//! - [`Driver`]: the read / submit / retrieve / render loop
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Running --stop--> Stopping --retrieve EOS--> Drained --join--> Joined
//!                                       \_____________________join______________/
//! ```
//!
//! # Example
//!
//! ```rust
//! use framechain::frame::{Frame, PixelFormat};
//! use framechain::pipeline::Pipeline;
//! use framechain::stages::{Grayscale, Mirror, Resize};
//!
//! let mut pipeline = Pipeline::builder()
//!     .stage(Grayscale::new())
//!     .stage(Mirror::new())
//!     .stage(Resize::half())
//!     .build()
//!     .unwrap();
//!
//! pipeline.start().unwrap();
//! for _ in 0..3 {
//!     pipeline.submit(Frame::zeroed(64, 48, PixelFormat::Bgr24)).unwrap();
//! }
//! pipeline.stop().unwrap();
//!
//! while let Some(frame) = pipeline.retrieve().unwrap() {
//!     assert_eq!((frame.width(), frame.height()), (32, 24));
//! }
//! pipeline.join().unwrap();
//! ```

mod builder;
mod config;
mod driver;
mod events;
mod executor;
mod worker;

pub use builder::PipelineBuilder;
pub use config::{Capacity, PipelineConfig};
pub use driver::{Driver, DriverReport, StopReason};
pub use events::{EventReceiver, EventSender, PipelineEvent};
pub use executor::{Pipeline, PipelineReport, PipelineState};
pub use worker::{WorkerReport, WorkerState};
