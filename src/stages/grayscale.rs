//! Colour to grayscale conversion.

use crate::error::Result;
use crate::frame::{Frame, PixelFormat};
use crate::stage::Stage;

// BT.601 luma weights in 14-bit fixed point (sum is 1 << 14).
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;
const ROUND: u32 = 1 << (SHIFT - 1);

/// Converts colour frames to single-channel [`PixelFormat::Gray8`].
///
/// Uses `Y = 0.299 R + 0.587 G + 0.114 B`, reading channels in the order the
/// frame's format declares. Alpha is ignored. `Gray8` input is returned
/// unchanged.
///
/// # Example
///
/// ```rust
/// use framechain::frame::{Frame, PixelFormat};
/// use framechain::stage::Stage;
/// use framechain::stages::Grayscale;
///
/// let white = Frame::new(1, 1, PixelFormat::Bgr24, vec![255, 255, 255]).unwrap();
/// let gray = Grayscale::new().apply(white).unwrap();
/// assert_eq!(gray.as_bytes(), &[255]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Grayscale;

impl Grayscale {
    /// Create a new grayscale stage.
    pub fn new() -> Self {
        Self
    }
}

/// Luma of one pixel given its red, green and blue samples.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + ROUND) >> SHIFT) as u8
}

/// Luma plane of a frame; a copy of the data for `Gray8`.
pub(crate) fn luma_plane(frame: &Frame) -> Vec<u8> {
    let Some((r, g, b)) = frame.format().rgb_offsets() else {
        return frame.as_bytes().to_vec();
    };
    frame
        .as_bytes()
        .chunks_exact(frame.channels())
        .map(|px| luma(px[r], px[g], px[b]))
        .collect()
}

impl Stage for Grayscale {
    fn apply(&self, frame: Frame) -> Result<Frame> {
        if frame.format() == PixelFormat::Gray8 {
            return Ok(frame);
        }

        let plane = luma_plane(&frame);
        tracing::trace!(
            "grayscale: {} -> {}x{} Gray8",
            frame.shape(),
            frame.width(),
            frame.height()
        );
        frame.replace(frame.width(), frame.height(), PixelFormat::Gray8, plane)
    }

    fn name(&self) -> &str {
        "grayscale"
    }
}
