// THEORY:
// The gray filter is an optional pre-pass between the sampler and the quantizer.
// Walls, shadows and blown-out highlights dominate most camera frames; when the
// caller asks for `filter_gray_colors`, samples that are barely saturated or that
// sit outside the useful brightness band are dropped so the palette is spent on
// actual colors.
//
// The filter never empties a frame: if every sample would be removed (a gray
// scene is still a scene), the unfiltered samples are returned instead.

use crate::config::ProcessingOptions;
use crate::core_modules::color::color::RgbColor;

/// Whether a single sample passes the saturation and brightness gates.
pub fn is_chromatic(color: &RgbColor, options: &ProcessingOptions) -> bool {
    let hsb = color.to_hsb();
    hsb.s >= options.saturation_threshold && options.brightness_range.contains(hsb.b)
}

/// Applies the gray filter when `filter_gray_colors` is set.
pub fn filter_samples(samples: Vec<RgbColor>, options: &ProcessingOptions) -> Vec<RgbColor> {
    if !options.filter_gray_colors {
        return samples;
    }
    let kept: Vec<RgbColor> = samples
        .iter()
        .filter(|color| is_chromatic(color, options))
        .copied()
        .collect();
    if kept.is_empty() { samples } else { kept }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filtering() -> ProcessingOptions {
        ProcessingOptions {
            filter_gray_colors: true,
            ..ProcessingOptions::default()
        }
    }

    #[test]
    fn disabled_filter_is_a_no_op() {
        let samples = vec![RgbColor::GRAY, RgbColor::BLACK];
        assert_eq!(filter_samples(samples.clone(), &ProcessingOptions::default()), samples);
    }

    #[test]
    fn drops_gray_dark_and_blown_out_samples() {
        let teal = RgbColor::new(0.1, 0.6, 0.6);
        let samples = vec![RgbColor::GRAY, RgbColor::new(0.05, 0.0, 0.1), RgbColor::RED, teal];
        // RED has brightness 1.0, above the default 0.9 ceiling.
        assert_eq!(filter_samples(samples, &filtering()), vec![teal]);
    }

    #[test]
    fn all_gray_frames_are_kept() {
        let samples = vec![RgbColor::GRAY; 4];
        assert_eq!(filter_samples(samples.clone(), &filtering()), samples);
    }
}
