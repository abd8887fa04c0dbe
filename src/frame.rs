//! Image frames.
//!
//! A [`Frame`] is an interleaved, row-major pixel buffer plus its shape. The
//! pipeline moves frames between workers without looking inside them; only
//! stages read or produce pixel data.

use crate::error::{Error, Result};
use crate::metadata::FrameMetadata;
use std::fmt;

/// Pixel layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Single 8-bit luma channel.
    Gray8,
    /// Blue, green, red; 8 bits each. The usual camera capture order.
    #[default]
    Bgr24,
    /// Red, green, blue; 8 bits each.
    Rgb24,
    /// Blue, green, red, alpha; 8 bits each.
    Bgra32,
    /// Red, green, blue, alpha; 8 bits each.
    Rgba32,
}

impl PixelFormat {
    /// Number of interleaved channels (bytes per pixel).
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Bgr24 | PixelFormat::Rgb24 => 3,
            PixelFormat::Bgra32 | PixelFormat::Rgba32 => 4,
        }
    }

    /// Buffer size in bytes for a frame of the given dimensions.
    pub fn buffer_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.channels()
    }

    /// Byte offsets of the red, green and blue samples within a pixel.
    ///
    /// Returns `None` for single-channel formats.
    pub fn rgb_offsets(&self) -> Option<(usize, usize, usize)> {
        match self {
            PixelFormat::Gray8 => None,
            PixelFormat::Bgr24 | PixelFormat::Bgra32 => Some((2, 1, 0)),
            PixelFormat::Rgb24 | PixelFormat::Rgba32 => Some((0, 1, 2)),
        }
    }
}

/// Width, height and pixel format of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameShape {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
}

impl FrameShape {
    /// Channel depth of the shape.
    pub fn channels(&self) -> usize {
        self.format.channels()
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} ({:?})",
            self.width,
            self.height,
            self.channels(),
            self.format
        )
    }
}

/// One unit of image data flowing through the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    metadata: FrameMetadata,
}

impl Frame {
    /// Create a frame from raw interleaved pixel data.
    ///
    /// Fails with [`Error::InvalidFrame`] if `data.len()` does not match
    /// `width * height * channels`.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = format.buffer_size(width, height);
        if data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "{}x{} {:?} needs {} bytes, got {}",
                width,
                height,
                format,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            metadata: FrameMetadata::default(),
        })
    }

    /// Create a zero-filled frame.
    pub fn zeroed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data: vec![0; format.buffer_size(width, height)],
            width,
            height,
            format,
            metadata: FrameMetadata::default(),
        }
    }

    /// Create a frame by evaluating `f(x, y)` for every pixel.
    ///
    /// `f` must return exactly `format.channels()` samples.
    pub fn from_fn<F>(width: u32, height: u32, format: PixelFormat, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let channels = format.channels();
        let mut data = Vec::with_capacity(format.buffer_size(width, height));
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                data.extend_from_slice(&px[..channels]);
            }
        }
        Self {
            data,
            width,
            height,
            format,
            metadata: FrameMetadata::default(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: FrameMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Channel depth.
    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Width, height and format together.
    pub fn shape(&self) -> FrameShape {
        FrameShape {
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    /// Frame metadata.
    #[inline]
    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    /// Raw pixel data.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixel data. The shape cannot change through this.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Samples of the pixel at `(x, y)`.
    ///
    /// Returns `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels();
        let start = y as usize * self.stride() + x as usize * channels;
        Some(&self.data[start..start + channels])
    }

    /// One row of pixel data.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        Some(&self.data[start..start + stride])
    }

    /// Consume the frame and return its pixel data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Build a new frame with different pixels and the same metadata.
    ///
    /// Used by stages that change shape.
    pub fn replace(&self, width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        Ok(Frame::new(width, height, format, data)?.with_metadata(self.metadata))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}
