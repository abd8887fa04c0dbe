//! Frame scaling by a fixed factor.
//!
//! # Example
//!
//! ```rust
//! use framechain::frame::{Frame, PixelFormat};
//! use framechain::stage::Stage;
//! use framechain::stages::{Resize, ScaleMode};
//!
//! // Halve both dimensions
//! let half = Resize::half();
//! let out = half.apply(Frame::zeroed(640, 480, PixelFormat::Bgr24)).unwrap();
//! assert_eq!((out.width(), out.height()), (320, 240));
//!
//! // Or with explicit mode
//! let nearest = Resize::new(0.25).unwrap().with_mode(ScaleMode::NearestNeighbor);
//! ```

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::stage::Stage;

// ============================================================================
// Scale Mode
// ============================================================================

/// Scaling interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Bilinear interpolation (smoother, slower).
    #[default]
    Bilinear,
    /// Nearest neighbor (faster, pixelated).
    NearestNeighbor,
}

// ============================================================================
// Resize
// ============================================================================

/// Scales frames by a factor fixed at construction.
///
/// The output is `floor(width * scale) x floor(height * scale)` in the input's
/// pixel format. Each channel is interpolated independently. A frame that
/// would scale to zero width or height is rejected with
/// [`Error::InvalidFrame`].
#[derive(Debug, Clone)]
pub struct Resize {
    /// Scale factor applied to both axes.
    scale: f64,
    /// Interpolation mode.
    mode: ScaleMode,
}

impl Resize {
    /// Default scale factor.
    pub const DEFAULT_SCALE: f64 = 0.5;

    /// Largest output buffer, in bytes, a single frame may scale to.
    pub const MAX_OUTPUT_BYTES: usize = 1 << 30;

    /// Create a resize stage with the given factor.
    ///
    /// Fails for non-finite or non-positive factors.
    pub fn new(scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "resize scale must be finite and positive, got {scale}"
            )));
        }
        Ok(Self {
            scale,
            mode: ScaleMode::default(),
        })
    }

    /// Halve both dimensions.
    pub fn half() -> Self {
        Self {
            scale: Self::DEFAULT_SCALE,
            mode: ScaleMode::default(),
        }
    }

    /// Set the interpolation mode.
    pub fn with_mode(mut self, mode: ScaleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get the scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Get the interpolation mode.
    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    /// Output dimensions for an input of the given size.
    ///
    /// Fails when a scaled side does not fit in a `u32`.
    pub fn output_size(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        Ok((self.scale_side(width)?, self.scale_side(height)?))
    }

    fn scale_side(&self, len: u32) -> Result<u32> {
        let scaled = (f64::from(len) * self.scale).floor();
        if scaled > f64::from(u32::MAX) {
            return Err(Error::InvalidFrame(format!(
                "scaling {} by {} overflows the frame size",
                len, self.scale
            )));
        }
        Ok(scaled as u32)
    }
}

impl Default for Resize {
    fn default() -> Self {
        Self::half()
    }
}

// ============================================================================
// Stage Implementation
// ============================================================================

impl Stage for Resize {
    fn apply(&self, frame: Frame) -> Result<Frame> {
        let (src_width, src_height) = (frame.width(), frame.height());
        let (dst_width, dst_height) = self.output_size(src_width, src_height)?;

        if dst_width == 0 || dst_height == 0 {
            return Err(Error::InvalidFrame(format!(
                "resizing {}x{} by {} gives an empty frame",
                src_width, src_height, self.scale
            )));
        }

        if (dst_width, dst_height) == (src_width, src_height) {
            return Ok(frame);
        }

        let channels = frame.channels();
        let mut output = output_buffer(dst_width, dst_height, channels)?;
        let plane = Plane {
            data: frame.as_bytes(),
            width: src_width,
            height: src_height,
            channels,
        };

        match self.mode {
            ScaleMode::Bilinear => scale_bilinear(&plane, &mut output, dst_width, dst_height),
            ScaleMode::NearestNeighbor => {
                scale_nearest(&plane, &mut output, dst_width, dst_height)
            }
        }

        frame.replace(dst_width, dst_height, frame.format(), output)
    }

    fn name(&self) -> &str {
        "resize"
    }
}

// ============================================================================
// Scaling Algorithms
// ============================================================================

/// Zeroed destination buffer, refusing sizes past `Resize::MAX_OUTPUT_BYTES`.
fn output_buffer(width: u32, height: u32, channels: usize) -> Result<Vec<u8>> {
    let too_large = || {
        Error::InvalidFrame(format!(
            "resized frame {}x{} with {} channels is too large",
            width, height, channels
        ))
    };
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(channels))
        .filter(|&len| len <= Resize::MAX_OUTPUT_BYTES)
        .ok_or_else(too_large)?;

    let mut output = Vec::new();
    output.try_reserve_exact(len).map_err(|_| too_large())?;
    output.resize(len, 0);
    Ok(output)
}

/// Interleaved source pixels.
struct Plane<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    channels: usize,
}

impl Plane<'_> {
    #[inline]
    fn sample(&self, x: u32, y: u32, c: usize) -> u8 {
        self.data[(y as usize * self.width as usize + x as usize) * self.channels + c]
    }
}

/// Source coordinate of a destination pixel centre, clamped to the image.
#[inline]
fn source_coord(dst: u32, ratio: f32, src_len: u32) -> (u32, u32, f32) {
    let f = ((dst as f32 + 0.5) * ratio - 0.5).max(0.0);
    let i0 = (f.floor() as u32).min(src_len - 1);
    let i1 = (i0 + 1).min(src_len - 1);
    (i0, i1, f - i0 as f32)
}

/// Bilinear interpolation with pixel-centre alignment.
fn scale_bilinear(src: &Plane<'_>, dst: &mut [u8], dst_width: u32, dst_height: u32) {
    let x_ratio = src.width as f32 / dst_width as f32;
    let y_ratio = src.height as f32 / dst_height as f32;
    let channels = src.channels;

    for dst_y in 0..dst_height {
        let (y0, y1, y_frac) = source_coord(dst_y, y_ratio, src.height);

        for dst_x in 0..dst_width {
            let (x0, x1, x_frac) = source_coord(dst_x, x_ratio, src.width);
            let out = (dst_y as usize * dst_width as usize + dst_x as usize) * channels;

            for c in 0..channels {
                let p00 = src.sample(x0, y0, c) as f32;
                let p10 = src.sample(x1, y0, c) as f32;
                let p01 = src.sample(x0, y1, c) as f32;
                let p11 = src.sample(x1, y1, c) as f32;

                let top = p00 * (1.0 - x_frac) + p10 * x_frac;
                let bottom = p01 * (1.0 - x_frac) + p11 * x_frac;
                let value = top * (1.0 - y_frac) + bottom * y_frac;

                dst[out + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Nearest neighbor scaling.
fn scale_nearest(src: &Plane<'_>, dst: &mut [u8], dst_width: u32, dst_height: u32) {
    let x_ratio = src.width as f32 / dst_width as f32;
    let y_ratio = src.height as f32 / dst_height as f32;
    let channels = src.channels;

    for dst_y in 0..dst_height {
        let src_y = (((dst_y as f32 + 0.5) * y_ratio) as u32).min(src.height - 1);

        for dst_x in 0..dst_width {
            let src_x = (((dst_x as f32 + 0.5) * x_ratio) as u32).min(src.width - 1);
            let out = (dst_y as usize * dst_width as usize + dst_x as usize) * channels;

            for c in 0..channels {
                dst[out + c] = src.sample(src_x, src_y, c);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
