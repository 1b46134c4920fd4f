// THEORY:
// Every quantizer answers the same question: "given N color samples, which <= K
// colors best represent them?" The `PaletteAlgorithm` trait is that contract. The
// pipeline is generic over it, so a caller can plug in its own strategy, while
// `AlgorithmKind` is the closed set of built-in strategies that can be chosen by
// name at construction time (from configuration, for example).
//
// The contract every implementation honors:
// - Output length is <= max_colors. It may be shorter, or empty, when clusters
//   are too small to survive `min_cluster_percentage`; the stabilizer pads.
// - Output is a pure function of (samples, max_colors, options). No randomness, no
//   hidden state between calls. Identical frames give bit-identical palettes.
// - Empty input gives empty output, never a panic.

pub mod average;
pub mod kmeans;
pub mod median_cut;
pub mod octree;

use crate::config::ProcessingOptions;
use crate::core_modules::color::color::RgbColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use average::AverageAlgorithm;
pub use kmeans::KMeansLabAlgorithm;
pub use median_cut::MedianCutAlgorithm;
pub use octree::OctreeAlgorithm;

/// Reduces a set of color samples to at most `max_colors` representative colors.
pub trait PaletteAlgorithm: Send {
    fn name(&self) -> &'static str;

    fn extract_colors(
        &self,
        samples: &[RgbColor],
        max_colors: usize,
        options: &ProcessingOptions,
    ) -> Vec<RgbColor>;
}

/// The built-in quantization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Iterative clustering in CIE Lab with deterministic k-means++ seeding.
    KMeansLab,
    /// Recursive splitting of the widest color block at its median.
    MedianCut,
    /// Frequency-biased octree bucketing with bounded leaf count.
    Octree,
    /// A single color: the mean of all samples.
    Average,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::KMeansLab,
        AlgorithmKind::MedianCut,
        AlgorithmKind::Octree,
        AlgorithmKind::Average,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::KMeansLab => "kmeans",
            AlgorithmKind::MedianCut => "median_cut",
            AlgorithmKind::Octree => "octree",
            AlgorithmKind::Average => "average",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kmeans" | "k_means_lab" | "kmeans_lab" => Ok(AlgorithmKind::KMeansLab),
            "median_cut" | "mediancut" => Ok(AlgorithmKind::MedianCut),
            "octree" => Ok(AlgorithmKind::Octree),
            "average" => Ok(AlgorithmKind::Average),
            _ => Err("unknown palette algorithm"),
        }
    }
}

impl PaletteAlgorithm for AlgorithmKind {
    fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::KMeansLab => KMeansLabAlgorithm.name(),
            AlgorithmKind::MedianCut => MedianCutAlgorithm.name(),
            AlgorithmKind::Octree => OctreeAlgorithm.name(),
            AlgorithmKind::Average => AverageAlgorithm.name(),
        }
    }

    fn extract_colors(
        &self,
        samples: &[RgbColor],
        max_colors: usize,
        options: &ProcessingOptions,
    ) -> Vec<RgbColor> {
        match self {
            AlgorithmKind::KMeansLab => {
                KMeansLabAlgorithm.extract_colors(samples, max_colors, options)
            }
            AlgorithmKind::MedianCut => {
                MedianCutAlgorithm.extract_colors(samples, max_colors, options)
            }
            AlgorithmKind::Octree => OctreeAlgorithm.extract_colors(samples, max_colors, options),
            AlgorithmKind::Average => AverageAlgorithm.extract_colors(samples, max_colors, options),
        }
    }
}

/// Whether a cluster of `size` out of `total` samples is large enough to keep.
pub(crate) fn meets_min_cluster(size: usize, total: usize, options: &ProcessingOptions) -> bool {
    total > 0 && size as f64 / total as f64 >= options.min_cluster_percentage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in AlgorithmKind::ALL {
            assert_eq!(kind.as_str().parse::<AlgorithmKind>(), Ok(kind));
        }
        assert!("dbscan".parse::<AlgorithmKind>().is_err());
    }

    #[test]
    fn every_kind_handles_empty_input() {
        let options = ProcessingOptions::default();
        for kind in AlgorithmKind::ALL {
            assert!(kind.extract_colors(&[], 4, &options).is_empty(), "{kind}");
        }
    }

    #[test]
    fn uniform_red_collapses_to_one_color() {
        let samples = vec![RgbColor::RED; 2_000];
        let options = ProcessingOptions::default();
        for kind in AlgorithmKind::ALL {
            let colors = kind.extract_colors(&samples, 1, &options);
            assert_eq!(colors.len(), 1, "{kind}");
            let c = colors[0];
            assert!(
                (c.r - 1.0).abs() < 1e-3 && c.g.abs() < 1e-3 && c.b.abs() < 1e-3,
                "{kind} produced {c:?}"
            );
        }
    }

    #[test]
    fn min_cluster_threshold() {
        let options = ProcessingOptions {
            min_cluster_percentage: 0.1,
            ..ProcessingOptions::default()
        };
        assert!(meets_min_cluster(10, 100, &options));
        assert!(!meets_min_cluster(9, 100, &options));
        assert!(!meets_min_cluster(0, 0, &options));
    }
}
