//! Horizontal flip.

use crate::error::Result;
use crate::frame::Frame;
use crate::stage::Stage;

/// Flips frames horizontally (mirror effect).
///
/// Works for every pixel format; whole pixels are swapped, so channel order
/// within a pixel is preserved.
#[derive(Debug, Clone, Default)]
pub struct Mirror;

impl Mirror {
    /// Create a new mirror stage.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Mirror {
    fn apply(&self, mut frame: Frame) -> Result<Frame> {
        let channels = frame.channels();
        let stride = frame.stride();
        if stride == 0 {
            return Ok(frame);
        }

        for row in frame.as_bytes_mut().chunks_exact_mut(stride) {
            let width = stride / channels;
            for x in 0..width / 2 {
                let left = x * channels;
                let right = (width - 1 - x) * channels;
                for c in 0..channels {
                    row.swap(left + c, right + c);
                }
            }
        }

        Ok(frame)
    }

    fn name(&self) -> &str {
        "mirror"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    #[test]
    fn test_mirror_gray() {
        let frame = Frame::new(3, 2, PixelFormat::Gray8, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let out = Mirror::new().apply(frame).unwrap();
        assert_eq!(out.as_bytes(), &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_mirror_keeps_channel_order() {
        let frame =
            Frame::new(2, 1, PixelFormat::Bgr24, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let out = Mirror::new().apply(frame).unwrap();
        assert_eq!(out.as_bytes(), &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_mirror_twice_is_identity() {
        let frame = Frame::from_fn(7, 5, PixelFormat::Rgba32, |x, y| {
            [x as u8, y as u8, (x * y) as u8, 255]
        });
        let stage = Mirror::new();
        let twice = stage.apply(stage.apply(frame.clone()).unwrap()).unwrap();
        assert_eq!(twice, frame);
    }

    #[test]
    fn test_mirror_empty_frame() {
        let frame = Frame::zeroed(0, 4, PixelFormat::Bgr24);
        assert_eq!(Mirror::new().apply(frame.clone()).unwrap(), frame);
    }
}
