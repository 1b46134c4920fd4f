// THEORY:
// The `sampler` turns a full frame (hundreds of thousands of pixels) into a small,
// bounded set of color samples that the quantizers can afford to process every
// frame. It uses a fixed, evenly spaced grid rather than random sampling so that
// two identical frames always produce the exact same sample sequence; any
// randomness here would leak straight into the palette as flicker.
//
// The grid step is chosen so that (W / step) * (H / step) ≈ target, rounded to an
// integer step so that small changes in the target never make the grid jitter.
// The first sample sits half a step in from the top-left corner, centering the
// grid on the frame.

use crate::core_modules::color::color::RgbColor;
use crate::core_modules::frame::frame::{BYTES_PER_PIXEL, Frame};

/// The regular sampling lattice for a frame of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGrid {
    pub step: usize,
    pub offset: usize,
}

impl SampleGrid {
    pub fn new(width: usize, height: usize, max_samples: usize) -> Self {
        let target = max_samples.max(1) as f64;
        let raw_step = ((width * height) as f64 / target).sqrt();
        let step = (raw_step.round() as usize).max(1);
        Self {
            step,
            offset: step / 2,
        }
    }

    /// Number of points the grid visits on a `width` x `height` frame.
    pub fn point_count(&self, width: usize, height: usize) -> usize {
        let along = |extent: usize| {
            if extent > self.offset {
                (extent - self.offset).div_ceil(self.step)
            } else {
                0
            }
        };
        along(width) * along(height)
    }
}

/// Samples a frame on a regular grid, returning normalized RGB colors.
///
/// Returns an empty vector for empty or unreadable frames; callers treat that as
/// "no palette this frame".
pub fn sample(frame: &Frame, max_samples: usize) -> Vec<RgbColor> {
    if frame.pixel_count() == 0 || !frame.is_readable() {
        return Vec::new();
    }

    let grid = SampleGrid::new(frame.width, frame.height, max_samples);
    let mut samples = Vec::with_capacity(grid.point_count(frame.width, frame.height));

    for y in (grid.offset..frame.height).step_by(grid.step) {
        let row = y * frame.bytes_per_row;
        for x in (grid.offset..frame.width).step_by(grid.step) {
            let offset = row + x * BYTES_PER_PIXEL;
            let bgr = &frame.data[offset..offset + 3];
            samples.push(RgbColor::from_bytes(bgr[2], bgr[1], bgr[0]));
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_step_approximates_target() {
        let grid = SampleGrid::new(640, 480, 2000);
        // sqrt(307200 / 2000) = 12.39 -> 12
        assert_eq!(grid, SampleGrid { step: 12, offset: 6 });
        // x: 6, 18, .., 630 (53 columns); y: 6, 18, .., 474 (40 rows)
        assert_eq!(grid.point_count(640, 480), 53 * 40);
    }

    #[test]
    fn tiny_frames_sample_every_pixel() {
        let grid = SampleGrid::new(3, 3, 2000);
        assert_eq!(grid, SampleGrid { step: 1, offset: 0 });
        let frame = Frame::solid(RgbColor::BLUE, 3, 3);
        assert_eq!(sample(&frame, 2000).len(), 9);
    }

    #[test]
    fn zero_target_is_treated_as_one() {
        let frame = Frame::solid(RgbColor::GREEN, 10, 10);
        let samples = sample(&frame, 0);
        // step = 10, offset = 5: a single centered sample.
        assert_eq!(samples, vec![RgbColor::GREEN]);
    }

    #[test]
    fn reads_bgr_order_through_stride() {
        // 2x2 frame with a stride of 12 bytes (4 bytes of padding per row).
        let mut data = vec![0u8; 24];
        data[12 + 4..12 + 8].copy_from_slice(&[30, 20, 10, 255]); // pixel (1, 1)
        let frame = Frame::new(2, 2, 12, data).expect("frame should be valid");
        let samples = sample(&frame, 4);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[3], RgbColor::from_bytes(10, 20, 30));
    }

    #[test]
    fn unreadable_and_empty_frames_yield_nothing() {
        let truncated = Frame {
            width: 100,
            height: 100,
            bytes_per_row: 400,
            data: vec![0; 100],
        };
        assert!(sample(&truncated, 2000).is_empty());

        let empty = Frame::solid(RgbColor::RED, 0, 10);
        assert!(sample(&empty, 2000).is_empty());
    }

    #[test]
    fn sampling_is_deterministic() {
        let frame = Frame::from_fn(97, 61, |x, y| {
            RgbColor::from_bytes((x * 3) as u8, (y * 5) as u8, ((x + y) * 7) as u8)
        });
        assert_eq!(sample(&frame, 500), sample(&frame, 500));
    }
}
