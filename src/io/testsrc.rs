//! Test pattern source.
//!
//! Generates synthetic video frames for pipeline testing, demos and
//! benchmarks. Frames are BGR by default, like a typical camera capture.

use super::FrameSource;
use crate::error::Result;
use crate::frame::{Frame, PixelFormat};
use crate::metadata::FrameMetadata;
use crate::stages::luma;
use std::time::Duration;

/// Video test pattern types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestPattern {
    /// Seven vertical 75% colour bars.
    #[default]
    ColorBars,
    /// Black and white squares (configurable size).
    Checkerboard,
    /// Solid color fill.
    SolidColor,
    /// Horizontal red ramp over a vertical green ramp; blue advances with
    /// each frame.
    Gradient,
    /// Black screen.
    Black,
    /// White screen.
    White,
}

/// A source that generates test pattern frames.
///
/// # Example
///
/// ```rust
/// use framechain::io::{FrameSource, TestPattern, TestPatternSource};
///
/// let mut src = TestPatternSource::new()
///     .with_pattern(TestPattern::Checkerboard)
///     .with_resolution(64, 48)
///     .with_num_frames(2);
///
/// assert!(src.read().unwrap().is_some());
/// assert!(src.read().unwrap().is_some());
/// assert!(src.read().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    pattern: TestPattern,
    format: PixelFormat,
    width: u32,
    height: u32,
    framerate_num: u32,
    framerate_den: u32,
    num_frames: Option<u64>,
    frames_produced: u64,
    solid_color: (u8, u8, u8),
    checker_size: u32,
}

impl TestPatternSource {
    /// Create a new test source with default settings.
    ///
    /// Defaults to colour bars at 640x480 BGR, 30fps timestamps, unbounded.
    pub fn new() -> Self {
        Self {
            pattern: TestPattern::default(),
            format: PixelFormat::Bgr24,
            width: 640,
            height: 480,
            framerate_num: 30,
            framerate_den: 1,
            num_frames: None,
            frames_produced: 0,
            solid_color: (128, 128, 128),
            checker_size: 32,
        }
    }

    /// Set the test pattern.
    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the pixel format.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the frame resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the framerate used for timestamps, as numerator/denominator.
    pub fn with_framerate(mut self, num: u32, den: u32) -> Self {
        self.framerate_num = num;
        self.framerate_den = den;
        self
    }

    /// Set the number of frames to produce (unbounded by default).
    pub fn with_num_frames(mut self, count: u64) -> Self {
        self.num_frames = Some(count);
        self
    }

    /// Set the solid color (for SolidColor pattern).
    pub fn with_solid_color(mut self, r: u8, g: u8, b: u8) -> Self {
        self.solid_color = (r, g, b);
        self
    }

    /// Set the checkerboard square size (for Checkerboard pattern).
    pub fn with_checker_size(mut self, size: u32) -> Self {
        self.checker_size = size;
        self
    }

    /// Get the number of frames produced.
    pub fn frames_produced(&self) -> u64 {
        self.frames_produced
    }

    /// Get the frame size in bytes.
    pub fn frame_size(&self) -> usize {
        self.format.buffer_size(self.width, self.height)
    }

    /// Get the frame duration, or `None` for a zero framerate.
    pub fn frame_duration(&self) -> Option<Duration> {
        if self.framerate_num == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            (self.framerate_den as u64 * 1_000_000_000) / self.framerate_num as u64,
        ))
    }

    /// Reset the source.
    pub fn reset(&mut self) {
        self.frames_produced = 0;
    }

    /// Generate the frame with the given sequence number.
    pub fn generate(&self, sequence: u64) -> Frame {
        let format = self.format;
        let (width, height) = (self.width, self.height);
        let frame = Frame::from_fn(width, height, format, |x, y| {
            let (r, g, b) = self.color_at(x, y, sequence);
            encode(format, r, g, b)
        });

        let mut metadata = FrameMetadata::from_sequence(sequence);
        if let Some(duration) = self.frame_duration() {
            let n = u32::try_from(sequence).unwrap_or(u32::MAX);
            metadata = metadata.with_pts(duration.saturating_mul(n));
        }
        frame.with_metadata(metadata)
    }

    fn color_at(&self, x: u32, y: u32, sequence: u64) -> (u8, u8, u8) {
        match self.pattern {
            TestPattern::ColorBars => {
                // 75% white, yellow, cyan, green, magenta, red, blue
                const BARS: [(u8, u8, u8); 7] = [
                    (191, 191, 191),
                    (191, 191, 0),
                    (0, 191, 191),
                    (0, 191, 0),
                    (191, 0, 191),
                    (191, 0, 0),
                    (0, 0, 191),
                ];
                let bar = (x as u64 * 7 / self.width.max(1) as u64).min(6) as usize;
                BARS[bar]
            }
            TestPattern::Checkerboard => {
                let size = self.checker_size.max(1);
                if (x / size + y / size) % 2 == 0 {
                    (255, 255, 255)
                } else {
                    (0, 0, 0)
                }
            }
            TestPattern::SolidColor => self.solid_color,
            TestPattern::Gradient => {
                let r = (x as u64 * 255 / self.width.saturating_sub(1).max(1) as u64) as u8;
                let g = (y as u64 * 255 / self.height.saturating_sub(1).max(1) as u64) as u8;
                let b = (sequence % 256) as u8;
                (r, g, b)
            }
            TestPattern::Black => (0, 0, 0),
            TestPattern::White => (255, 255, 255),
        }
    }
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for TestPatternSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if let Some(max) = self.num_frames {
            if self.frames_produced >= max {
                return Ok(None);
            }
        }

        let frame = self.generate(self.frames_produced);
        self.frames_produced += 1;
        Ok(Some(frame))
    }
}

/// Lay out an RGB colour in the given pixel format.
fn encode(format: PixelFormat, r: u8, g: u8, b: u8) -> [u8; 4] {
    match format.rgb_offsets() {
        None => [luma(r, g, b), 0, 0, 0],
        Some((ro, go, bo)) => {
            let mut px = [255u8; 4];
            px[ro] = r;
            px[go] = g;
            px[bo] = b;
            px
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mut src = TestPatternSource::new();
        let frame = src.read().unwrap().unwrap();

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.format(), PixelFormat::Bgr24);
        assert_eq!(frame.as_bytes().len(), src.frame_size());
        assert_eq!(frame.metadata().sequence, 0);
        assert_eq!(frame.metadata().pts, Some(Duration::ZERO));
    }

    #[test]
    fn test_num_frames_and_reset() {
        let mut src = TestPatternSource::new()
            .with_resolution(8, 8)
            .with_num_frames(3);

        for expected in 0..3 {
            let frame = src.read().unwrap().unwrap();
            assert_eq!(frame.metadata().sequence, expected);
        }
        assert!(src.read().unwrap().is_none());
        assert_eq!(src.frames_produced(), 3);

        src.reset();
        assert!(src.read().unwrap().is_some());
    }

    #[test]
    fn test_timestamps_follow_framerate() {
        let src = TestPatternSource::new()
            .with_resolution(2, 2)
            .with_framerate(25, 1);
        let frame = src.generate(10);
        assert_eq!(frame.metadata().pts, Some(Duration::from_millis(400)));

        let src = src.with_framerate(0, 1);
        assert_eq!(src.generate(1).metadata().pts, None);
    }

    #[test]
    fn test_solid_color_channel_order() {
        let src = TestPatternSource::new()
            .with_pattern(TestPattern::SolidColor)
            .with_solid_color(10, 20, 30)
            .with_resolution(2, 2);

        let bgr = src.clone().with_format(PixelFormat::Bgr24).generate(0);
        assert_eq!(bgr.pixel(0, 0), Some(&[30, 20, 10][..]));

        let rgba = src.clone().with_format(PixelFormat::Rgba32).generate(0);
        assert_eq!(rgba.pixel(1, 1), Some(&[10, 20, 30, 255][..]));

        let gray = src.with_format(PixelFormat::Gray8).generate(0);
        assert_eq!(gray.pixel(0, 0), Some(&[luma(10, 20, 30)][..]));
    }

    #[test]
    fn test_checkerboard() {
        let frame = TestPatternSource::new()
            .with_pattern(TestPattern::Checkerboard)
            .with_checker_size(2)
            .with_resolution(4, 4)
            .with_format(PixelFormat::Gray8)
            .generate(0);

        assert_eq!(frame.pixel(0, 0), Some(&[255][..]));
        assert_eq!(frame.pixel(2, 0), Some(&[0][..]));
        assert_eq!(frame.pixel(2, 2), Some(&[255][..]));
    }

    #[test]
    fn test_color_bars() {
        let frame = TestPatternSource::new()
            .with_resolution(7, 1)
            .with_format(PixelFormat::Rgb24)
            .generate(0);

        assert_eq!(frame.pixel(0, 0), Some(&[191, 191, 191][..]));
        assert_eq!(frame.pixel(6, 0), Some(&[0, 0, 191][..]));
    }
}
