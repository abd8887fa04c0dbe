//! Canny edge detection.

use super::grayscale::luma_plane;
use crate::error::{Error, Result};
use crate::frame::{Frame, PixelFormat};
use crate::stage::Stage;

/// tan(22.5 deg) and tan(67.5 deg), used to bin gradient directions.
const TAN_22_5: f32 = 0.414_213_56;
const TAN_67_5: f32 = 2.414_213_6;

/// Detects edges with the Canny algorithm.
///
/// Steps: 3x3 Sobel gradients with replicated borders, L1 gradient magnitude,
/// non-maximum suppression along the binned gradient direction, then
/// hysteresis. Pixels above `high` seed edges; pixels above `low` join an edge
/// when 8-connected to one. Colour input is reduced to luma first. The output
/// is [`PixelFormat::Gray8`] with edges at 255 and everything else at 0.
#[derive(Debug, Clone)]
pub struct EdgeDetect {
    low: u32,
    high: u32,
}

impl EdgeDetect {
    /// Default lower hysteresis threshold.
    pub const DEFAULT_LOW: u32 = 100;
    /// Default upper hysteresis threshold.
    pub const DEFAULT_HIGH: u32 = 200;

    /// Create an edge detector with the default thresholds (100, 200).
    pub fn new() -> Self {
        Self {
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
        }
    }

    /// Create an edge detector with custom thresholds.
    ///
    /// Fails if `low > high`.
    pub fn with_thresholds(low: u32, high: u32) -> Result<Self> {
        if low > high {
            return Err(Error::InvalidConfig(format!(
                "edge thresholds out of order: low {low} > high {high}"
            )));
        }
        Ok(Self { low, high })
    }

    /// Get the (low, high) thresholds.
    pub fn thresholds(&self) -> (u32, u32) {
        (self.low, self.high)
    }
}

impl Default for EdgeDetect {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for EdgeDetect {
    fn apply(&self, frame: Frame) -> Result<Frame> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        let gray = luma_plane(&frame);

        let edges = if width == 0 || height == 0 {
            Vec::new()
        } else {
            let gradients = Gradients::sobel(&gray, width, height);
            let candidates = gradients.suppress_non_maxima(self.low, self.high);
            hysteresis(candidates, width, height)
        };

        frame.replace(frame.width(), frame.height(), PixelFormat::Gray8, edges)
    }

    fn name(&self) -> &str {
        "edge-detect"
    }
}

/// Per-pixel Sobel responses and their L1 magnitude.
struct Gradients {
    gx: Vec<i32>,
    gy: Vec<i32>,
    magnitude: Vec<u32>,
    width: usize,
    height: usize,
}

impl Gradients {
    fn sobel(gray: &[u8], width: usize, height: usize) -> Self {
        let at = |x: isize, y: isize| -> i32 {
            let x = x.clamp(0, width as isize - 1) as usize;
            let y = y.clamp(0, height as isize - 1) as usize;
            gray[y * width + x] as i32
        };

        let len = width * height;
        let mut gx = vec![0i32; len];
        let mut gy = vec![0i32; len];
        let mut magnitude = vec![0u32; len];

        for y in 0..height as isize {
            for x in 0..width as isize {
                let dx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
                let dy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
                let i = y as usize * width + x as usize;
                gx[i] = dx;
                gy[i] = dy;
                magnitude[i] = dx.unsigned_abs() + dy.unsigned_abs();
            }
        }

        Self {
            gx,
            gy,
            magnitude,
            width,
            height,
        }
    }

    fn magnitude_at(&self, x: isize, y: isize) -> u32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0;
        }
        self.magnitude[y as usize * self.width + x as usize]
    }

    /// Keep local maxima above `low`, classified as strong or weak.
    fn suppress_non_maxima(&self, low: u32, high: u32) -> Vec<Candidate> {
        let mut out = vec![Candidate::None; self.width * self.height];

        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                let m = self.magnitude[i];
                if m <= low {
                    continue;
                }

                let (ax, ay) = (self.gx[i].unsigned_abs() as f32, self.gy[i].unsigned_abs() as f32);
                let (xi, yi) = (x as isize, y as isize);
                let (a, b) = if ay <= ax * TAN_22_5 {
                    (self.magnitude_at(xi - 1, yi), self.magnitude_at(xi + 1, yi))
                } else if ay >= ax * TAN_67_5 {
                    (self.magnitude_at(xi, yi - 1), self.magnitude_at(xi, yi + 1))
                } else if (self.gx[i] < 0) != (self.gy[i] < 0) {
                    (self.magnitude_at(xi - 1, yi + 1), self.magnitude_at(xi + 1, yi - 1))
                } else {
                    (self.magnitude_at(xi - 1, yi - 1), self.magnitude_at(xi + 1, yi + 1))
                };

                // Asymmetric comparison keeps one pixel of a flat ridge.
                if m > a && m >= b {
                    out[i] = if m > high {
                        Candidate::Strong
                    } else {
                        Candidate::Weak
                    };
                }
            }
        }

        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    None,
    Weak,
    Strong,
}

/// Grow edges from strong pixels through 8-connected weak ones.
fn hysteresis(candidates: Vec<Candidate>, width: usize, height: usize) -> Vec<u8> {
    let mut edges = vec![0u8; width * height];
    let mut stack: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == Candidate::Strong)
        .map(|(i, _)| i)
        .collect();

    for &i in &stack {
        edges[i] = 255;
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % width) as isize, (i / width) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let n = ny as usize * width + nx as usize;
                if edges[n] == 0 && candidates[n] == Candidate::Weak {
                    edges[n] = 255;
                    stack.push(n);
                }
            }
        }
    }

    edges
}
