//! Built-in stages.
//!
//! ## Colour
//! - [`Grayscale`]: colour to single-channel luma
//!
//! ## Geometry
//! - [`Mirror`]: horizontal flip
//! - [`Resize`]: scale by a fixed factor
//!
//! ## Analysis
//! - [`EdgeDetect`]: Canny edge detection
//!
//! ## Utility
//! - [`Identity`]: returns its input unchanged

mod edge;
mod grayscale;
mod identity;
mod mirror;
mod resize;

pub use edge::EdgeDetect;
pub use grayscale::Grayscale;
pub(crate) use grayscale::luma;
pub use identity::Identity;
pub use mirror::Mirror;
pub use resize::{Resize, ScaleMode};
