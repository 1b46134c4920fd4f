// THEORY:
// Median-Cut partitions color space instead of searching it. All samples start in
// one block; the block with the widest spread on any single channel is sorted
// along that channel and cut in half at the median sample, and the process repeats
// until there are enough blocks. Each block's mean is one palette color.
//
// Determinism hinges on the sort. Many samples share a value on the split channel
// (a flat wall, a saturated sign), so sorting on that channel alone would leave
// their relative order, and therefore the cut, up to the sort implementation.
// Every split therefore sorts on a full lexicographic key: the split channel first,
// then the remaining channels in a fixed rotation (R→G→B, G→B→R, B→R→G).

use super::{PaletteAlgorithm, meets_min_cluster};
use crate::config::ProcessingOptions;
use crate::core_modules::color::color::RgbColor;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default)]
pub struct MedianCutAlgorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn value(self, color: &RgbColor) -> f64 {
        match self {
            Channel::Red => color.r,
            Channel::Green => color.g,
            Channel::Blue => color.b,
        }
    }

    /// The split channel followed by the tie-breaking channels.
    fn sort_keys(self) -> [Channel; 3] {
        match self {
            Channel::Red => [Channel::Red, Channel::Green, Channel::Blue],
            Channel::Green => [Channel::Green, Channel::Blue, Channel::Red],
            Channel::Blue => [Channel::Blue, Channel::Red, Channel::Green],
        }
    }
}

/// A working partition of the samples.
#[derive(Debug, Clone)]
pub struct ColorBlock {
    pixels: Vec<RgbColor>,
    ranges: [f64; 3],
}

impl ColorBlock {
    pub fn new(pixels: Vec<RgbColor>) -> Self {
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for pixel in &pixels {
            for (i, value) in [pixel.r, pixel.g, pixel.b].into_iter().enumerate() {
                min[i] = min[i].min(value);
                max[i] = max[i].max(value);
            }
        }
        let ranges = if pixels.is_empty() {
            [0.0; 3]
        } else {
            [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
        };
        Self { pixels, ranges }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The largest single-channel spread.
    pub fn range(&self) -> f64 {
        self.ranges[0].max(self.ranges[1]).max(self.ranges[2])
    }

    /// The channel with the widest spread; red, then green, win ties.
    pub fn widest_channel(&self) -> Channel {
        let [r, g, b] = self.ranges;
        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    pub fn mean(&self) -> RgbColor {
        RgbColor::mean(&self.pixels)
    }

    /// Sorts along the widest channel and cuts at the median index.
    pub fn split(self) -> (ColorBlock, ColorBlock) {
        let keys = self.widest_channel().sort_keys();
        let mut pixels = self.pixels;
        pixels.sort_by(|a, b| {
            keys.iter().fold(Ordering::Equal, |ordering, key| {
                ordering.then_with(|| key.value(a).total_cmp(&key.value(b)))
            })
        });
        let upper = pixels.split_off(pixels.len() / 2);
        (ColorBlock::new(pixels), ColorBlock::new(upper))
    }
}

impl PaletteAlgorithm for MedianCutAlgorithm {
    fn name(&self) -> &'static str {
        "Median Cut"
    }

    fn extract_colors(
        &self,
        samples: &[RgbColor],
        max_colors: usize,
        options: &ProcessingOptions,
    ) -> Vec<RgbColor> {
        if samples.is_empty() {
            return Vec::new();
        }

        partition(samples, max_colors)
            .iter()
            .filter(|block| meets_min_cluster(block.len(), samples.len(), options))
            .map(ColorBlock::mean)
            .collect()
    }
}

/// Splits the samples into at most `min(max_blocks, samples.len())` blocks.
pub fn partition(samples: &[RgbColor], max_blocks: usize) -> Vec<ColorBlock> {
    if samples.is_empty() || max_blocks == 0 {
        return Vec::new();
    }

    let mut blocks = vec![ColorBlock::new(samples.to_vec())];

    while blocks.len() < max_blocks && blocks.len() < samples.len() {
        // Widest splittable block; the first one wins on ties.
        let mut widest: Option<usize> = None;
        for (index, block) in blocks.iter().enumerate() {
            if block.len() < 2 {
                continue;
            }
            match widest {
                Some(best) if block.range() <= blocks[best].range() => {}
                _ => widest = Some(index),
            }
        }
        let Some(widest) = widest else {
            break;
        };

        let (lower, upper) = blocks.remove(widest).split();
        blocks.push(lower);
        blocks.push(upper);
    }

    blocks
}
