//! Identity stage.

use crate::error::Result;
use crate::frame::Frame;
use crate::stage::Stage;

/// A stage that passes frames through unchanged.
///
/// Useful as a placeholder and for measuring hand-off overhead.
#[derive(Debug, Clone)]
pub struct Identity {
    name: String,
}

impl Identity {
    /// Create a new identity stage.
    pub fn new() -> Self {
        Self {
            name: "identity".to_string(),
        }
    }

    /// Create an identity stage with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Identity {
    #[inline]
    fn apply(&self, frame: Frame) -> Result<Frame> {
        Ok(frame)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    #[test]
    fn test_identity() {
        let frame = Frame::from_fn(3, 3, PixelFormat::Bgr24, |x, y| [x as u8, y as u8, 1, 0]);
        assert_eq!(Identity::new().apply(frame.clone()).unwrap(), frame);
        assert_eq!(Identity::with_name("noop").name(), "noop");
    }
}
