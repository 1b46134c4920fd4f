// THEORY:
// The `PaletteStabilizer` is the temporal layer of the palette engine. The
// quantizers are stateless: each frame they hand back a raw, variable-length,
// arbitrarily ordered set of colors. Shown directly, that set would flicker:
// colors swap positions when two clusters trade places, the palette grows and
// shrinks, and small camera noise nudges every swatch every frame.
//
// Key architectural principles:
// 1.  **Fixed Cardinality**: The output always has exactly `number_of_colors`
//     entries. Short results are padded by repeating the last color (gray when the
//     algorithm found nothing); long ones are truncated after ordering.
// 2.  **Stable Ordering**: Colors are sorted by a total order that depends only on
//     the colors themselves: luma descending, then HSB saturation descending, then
//     hue ascending. Two frames with the same colors in a different internal order
//     produce the same palette.
// 3.  **Temporal Memory**: With smoothing enabled, the previous palette is matched
//     against the new one (greedy nearest neighbor, one-to-one), so each swatch
//     follows "its" color even if the sort order flips, and then blended toward it.
//     A large average jump raises the blend weight a little so a scene cut eases in
//     instead of snapping.
// 4.  **Single Owner**: The previous palette lives here and only here. It is
//     replaced wholesale each frame and is never visible to the quantizers.

use crate::core_modules::color::color::RgbColor;
use std::cmp::Ordering;

/// Average matched distance above which a frame counts as a scene change.
pub const SCENE_CHANGE_DISTANCE: f64 = 0.15;
/// How much the blend weight rises on a scene change.
pub const SCENE_CHANGE_BOOST: f64 = 0.1;
/// Upper bound on the boosted blend weight.
pub const MAX_SMOOTHING_FACTOR: f64 = 0.95;

/// The total order used for palettes: luma desc, saturation desc, hue asc.
pub fn palette_order(a: &RgbColor, b: &RgbColor) -> Ordering {
    let (hsb_a, hsb_b) = (a.to_hsb(), b.to_hsb());
    b.luma()
        .total_cmp(&a.luma())
        .then_with(|| hsb_b.s.total_cmp(&hsb_a.s))
        .then_with(|| hsb_a.h.total_cmp(&hsb_b.h))
}

/// Sorts into palette order and pads or truncates to exactly `number_of_colors`.
pub fn normalize(mut colors: Vec<RgbColor>, number_of_colors: usize) -> Vec<RgbColor> {
    colors.sort_by(palette_order);
    let filler = colors.last().copied().unwrap_or(RgbColor::GRAY);
    colors.resize(number_of_colors, filler);
    colors
}

/// For each previous color in order, the nearest still-unused new color.
///
/// Both slices must have the same length.
pub fn match_colors(previous: &[RgbColor], current: &[RgbColor]) -> Vec<RgbColor> {
    let mut used = vec![false; current.len()];
    previous
        .iter()
        .map(|old| {
            let mut best: Option<(usize, f64)> = None;
            for (index, candidate) in current.iter().enumerate() {
                if used[index] {
                    continue;
                }
                let distance = old.distance(candidate);
                if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                    best = Some((index, distance));
                }
            }
            // One-to-one over equal lengths: an unused candidate always remains.
            let (index, _) = best.unwrap_or((0, 0.0));
            used[index] = true;
            current[index]
        })
        .collect()
}

/// Owns the previous palette and turns raw per-frame colors into a stable palette.
#[derive(Debug, Clone)]
pub struct PaletteStabilizer {
    number_of_colors: usize,
    smoothing_factor: f64,
    previous: Option<Vec<RgbColor>>,
}

impl PaletteStabilizer {
    pub fn new(number_of_colors: usize, smoothing_factor: f64) -> Self {
        Self {
            number_of_colors,
            smoothing_factor: smoothing_factor.clamp(0.0, 1.0),
            previous: None,
        }
    }

    pub fn number_of_colors(&self) -> usize {
        self.number_of_colors
    }

    pub fn previous(&self) -> Option<&[RgbColor]> {
        self.previous.as_deref()
    }

    /// Forgets the previous palette; the next frame is taken as-is.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Orders, pads and smooths one frame's raw colors.
    pub fn stabilize(&mut self, raw: Vec<RgbColor>) -> Vec<RgbColor> {
        let ordered = normalize(raw, self.number_of_colors);

        let palette = match &self.previous {
            Some(previous) if self.smoothing_factor > 0.0 && previous.len() == ordered.len() => {
                self.smooth(previous, &ordered)
            }
            _ => ordered,
        };

        self.previous = Some(palette.clone());
        palette
    }

    fn smooth(&self, previous: &[RgbColor], current: &[RgbColor]) -> Vec<RgbColor> {
        if previous.is_empty() {
            return Vec::new();
        }

        let matched = match_colors(previous, current);
        let average_change = previous
            .iter()
            .zip(&matched)
            .map(|(old, new)| old.distance(new))
            .sum::<f64>()
            / previous.len() as f64;

        let factor = self.effective_factor(average_change);
        previous
            .iter()
            .zip(&matched)
            .map(|(old, new)| old.blend(new, factor))
            .collect()
    }

    /// The blend weight for a frame whose colors moved `average_change` on average.
    pub fn effective_factor(&self, average_change: f64) -> f64 {
        if average_change > SCENE_CHANGE_DISTANCE {
            (self.smoothing_factor + SCENE_CHANGE_BOOST).min(MAX_SMOOTHING_FACTOR)
        } else {
            self.smoothing_factor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: RgbColor, b: RgbColor) {
        assert!(a.distance(&b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn output_length_is_always_fixed() {
        let pool = [
            RgbColor::RED,
            RgbColor::GREEN,
            RgbColor::BLUE,
            RgbColor::WHITE,
            RgbColor::BLACK,
            RgbColor::GRAY,
            RgbColor::new(0.2, 0.4, 0.6),
            RgbColor::new(0.9, 0.8, 0.1),
        ];
        for n in 1..=4 {
            let mut stabilizer = PaletteStabilizer::new(n, 0.7);
            for len in 0..=2 * n {
                let palette = stabilizer.stabilize(pool[..len].to_vec());
                assert_eq!(palette.len(), n, "n = {n}, raw length = {len}");
            }
        }
    }

    #[test]
    fn empty_input_pads_with_gray() {
        assert_eq!(normalize(Vec::new(), 3), vec![RgbColor::GRAY; 3]);
    }

    #[test]
    fn short_input_repeats_the_last_color() {
        let palette = normalize(vec![RgbColor::BLUE, RgbColor::GREEN], 4);
        assert_eq!(palette, vec![RgbColor::GREEN, RgbColor::BLUE, RgbColor::BLUE, RgbColor::BLUE]);
    }

    #[test]
    fn ordering_ignores_input_order() {
        let colors = vec![
            RgbColor::BLUE,
            RgbColor::new(0.5, 0.5, 0.5),
            RgbColor::RED,
            RgbColor::new(0.3, 0.7, 0.2),
        ];
        let mut reversed = colors.clone();
        reversed.reverse();
        assert_eq!(normalize(colors, 4), normalize(reversed, 4));
    }

    #[test]
    fn sorts_by_descending_luma() {
        let gray = RgbColor::new(0.5, 0.5, 0.5);
        assert_eq!(palette_order(&gray, &gray), Ordering::Equal);

        let a = RgbColor::new(0.6, 0.2, 0.2);
        let b = RgbColor::new(0.2, 0.6, 0.2);
        let c = RgbColor::new(0.2, 0.2, 0.6);
        // Distinct luma: green, red, blue.
        assert_eq!(normalize(vec![a, b, c], 3), vec![b, a, c]);
    }

    #[test]
    fn truncation_keeps_the_brightest() {
        let palette = normalize(vec![RgbColor::BLACK, RgbColor::WHITE, RgbColor::GRAY], 2);
        assert_eq!(palette, vec![RgbColor::WHITE, RgbColor::GRAY]);
    }

    #[test]
    fn first_frame_is_not_blended() {
        let mut stabilizer = PaletteStabilizer::new(1, 0.7);
        assert_eq!(stabilizer.stabilize(vec![RgbColor::RED]), vec![RgbColor::RED]);
    }

    #[test]
    fn scene_change_raises_the_blend_weight() {
        let mut stabilizer = PaletteStabilizer::new(1, 0.7);
        stabilizer.stabilize(vec![RgbColor::RED]);
        // Red -> green moves sqrt(2) > 0.15, so the factor becomes 0.8.
        let palette = stabilizer.stabilize(vec![RgbColor::GREEN]);
        assert_close(palette[0], RgbColor::new(0.8, 0.2, 0.0));
        assert_eq!(stabilizer.previous(), Some(palette.as_slice()));
    }

    #[test]
    fn small_changes_use_the_base_factor() {
        let mut stabilizer = PaletteStabilizer::new(1, 0.5);
        stabilizer.stabilize(vec![RgbColor::new(0.5, 0.5, 0.5)]);
        let palette = stabilizer.stabilize(vec![RgbColor::new(0.6, 0.5, 0.5)]);
        assert_close(palette[0], RgbColor::new(0.55, 0.5, 0.5));
    }

    #[test]
    fn boosted_factor_is_capped() {
        let stabilizer = PaletteStabilizer::new(1, 0.9);
        assert!((stabilizer.effective_factor(1.0) - MAX_SMOOTHING_FACTOR).abs() < 1e-12);
        assert_eq!(stabilizer.effective_factor(0.1), 0.9);
    }

    #[test]
    fn matching_follows_colors_not_positions() {
        let previous = [RgbColor::WHITE, RgbColor::BLACK];
        let current = [RgbColor::new(0.05, 0.05, 0.05), RgbColor::new(0.95, 0.95, 0.95)];
        assert_eq!(match_colors(&previous, &current), vec![current[1], current[0]]);
    }

    #[test]
    fn matching_is_one_to_one() {
        let previous = [RgbColor::WHITE, RgbColor::new(0.9, 0.9, 0.9)];
        let current = [RgbColor::WHITE, RgbColor::BLACK];
        assert_eq!(match_colors(&previous, &current), vec![RgbColor::WHITE, RgbColor::BLACK]);
    }

    #[test]
    fn zero_factor_disables_memory() {
        let mut stabilizer = PaletteStabilizer::new(1, 0.0);
        stabilizer.stabilize(vec![RgbColor::RED]);
        assert_eq!(stabilizer.stabilize(vec![RgbColor::GREEN]), vec![RgbColor::GREEN]);
    }

    #[test]
    fn reset_forgets_the_previous_palette() {
        let mut stabilizer = PaletteStabilizer::new(1, 0.9);
        stabilizer.stabilize(vec![RgbColor::RED]);
        stabilizer.reset();
        assert_eq!(stabilizer.stabilize(vec![RgbColor::BLUE]), vec![RgbColor::BLUE]);
    }
}
