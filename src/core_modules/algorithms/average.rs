// The baseline strategy: one color, the arithmetic mean of every sample. Useful as a
// reference point when judging the clustering strategies, and as the cheapest
// possible "ambient color" mode.

use super::PaletteAlgorithm;
use crate::config::ProcessingOptions;
use crate::core_modules::color::color::RgbColor;

#[derive(Debug, Clone, Copy, Default)]
pub struct AverageAlgorithm;

impl PaletteAlgorithm for AverageAlgorithm {
    fn name(&self) -> &'static str {
        "Average"
    }

    fn extract_colors(
        &self,
        samples: &[RgbColor],
        max_colors: usize,
        _options: &ProcessingOptions,
    ) -> Vec<RgbColor> {
        if samples.is_empty() || max_colors == 0 {
            return Vec::new();
        }
        vec![RgbColor::mean(samples)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_all_samples() {
        let samples = [RgbColor::RED, RgbColor::BLUE];
        let colors = AverageAlgorithm.extract_colors(&samples, 4, &ProcessingOptions::default());
        assert_eq!(colors, vec![RgbColor::new(0.5, 0.0, 0.5)]);
    }
}
