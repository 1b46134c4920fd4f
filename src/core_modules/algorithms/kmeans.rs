// THEORY:
// K-means in CIE Lab. Clustering in Lab rather than RGB means the "mean" of a
// cluster is a perceptual average, and distances between centroids track how
// different the colors actually look.
//
// Key architectural principles:
// 1.  **Deterministic Seeding**: Classic k-means++ picks seeds at random, weighted by
//     distance. Random seeds make two identical frames produce different palettes,
//     which shows up as flicker. Instead, the first seed is the median-lightness
//     sample and every further seed is the sample farthest from all seeds chosen so
//     far (farthest-point traversal). Near-ties (within 0.001) go to the lighter
//     sample, so the choice is reproducible down to the bit.
// 2.  **Size Filtering**: After each assignment step, clusters holding less than
//     `min_cluster_percentage` of the samples are dropped outright rather than
//     merged. Their points simply join other clusters on the next assignment.
// 3.  **Early Exit**: Iteration stops when the centroid set has the same size as
//     before and no centroid moved more than 0.1 ΔE, or when every cluster has been
//     dropped.

use super::{PaletteAlgorithm, meets_min_cluster};
use crate::config::ProcessingOptions;
use crate::core_modules::color::color::{LabColor, RgbColor};

/// Two seeding candidates whose distances differ by no more than this are tied.
const SEED_TIE_TOLERANCE: f64 = 0.001;
/// Centroids that moved less than this (ΔE) count as converged.
const CONVERGENCE_DISTANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansLabAlgorithm;

impl PaletteAlgorithm for KMeansLabAlgorithm {
    fn name(&self) -> &'static str {
        "K-means++ (LAB)"
    }

    fn extract_colors(
        &self,
        samples: &[RgbColor],
        max_colors: usize,
        options: &ProcessingOptions,
    ) -> Vec<RgbColor> {
        if samples.is_empty() || max_colors == 0 {
            return Vec::new();
        }

        let points: Vec<LabColor> = samples.iter().map(|c| c.to_lab()).collect();
        let k = max_colors.min(points.len());

        cluster(&points, k, options)
            .iter()
            .map(LabColor::to_rgb)
            .collect()
    }
}

/// Runs seeding plus Lloyd iterations, returning the surviving centroids.
pub fn cluster(points: &[LabColor], k: usize, options: &ProcessingOptions) -> Vec<LabColor> {
    let mut centroids = seed_centroids(points, k);
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..options.max_iterations {
        for (assignment, point) in assignments.iter_mut().zip(points) {
            *assignment = nearest_centroid(point, &centroids);
        }

        let mut sizes = vec![0usize; centroids.len()];
        for &assignment in &assignments {
            sizes[assignment] += 1;
        }

        let new_centroids: Vec<LabColor> = (0..centroids.len())
            .filter(|&cluster| {
                sizes[cluster] > 0 && meets_min_cluster(sizes[cluster], points.len(), options)
            })
            .map(|cluster| {
                LabColor::mean(
                    points
                        .iter()
                        .zip(&assignments)
                        .filter(|(_, assignment)| **assignment == cluster)
                        .map(|(point, _)| point),
                )
            })
            .collect();

        if new_centroids.len() == centroids.len()
            && centroids
                .iter()
                .zip(&new_centroids)
                .all(|(old, new)| old.distance(new) <= CONVERGENCE_DISTANCE)
        {
            break;
        }

        centroids = new_centroids;
        if centroids.is_empty() {
            break;
        }
    }

    centroids
}

/// Deterministic farthest-point seeding starting from the median-lightness point.
pub fn seed_centroids(points: &[LabColor], k: usize) -> Vec<LabColor> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut by_lightness: Vec<&LabColor> = points.iter().collect();
    by_lightness.sort_by(|a, b| a.l.total_cmp(&b.l));
    let mut centroids = Vec::with_capacity(k);
    centroids.push(*by_lightness[by_lightness.len() / 2]);

    // Distance from every point to its nearest chosen centroid, updated incrementally.
    let mut nearest: Vec<f64> = points.iter().map(|p| p.distance(&centroids[0])).collect();

    while centroids.len() < k.min(points.len()) {
        let mut best = 0usize;
        for candidate in 1..points.len() {
            let gap = nearest[candidate] - nearest[best];
            let replace = if gap.abs() > SEED_TIE_TOLERANCE {
                gap > 0.0
            } else {
                points[candidate].l > points[best].l
            };
            if replace {
                best = candidate;
            }
        }

        let seed = points[best];
        centroids.push(seed);
        for (distance, point) in nearest.iter_mut().zip(points) {
            *distance = distance.min(point.distance(&seed));
        }
    }

    centroids
}

/// Index of the closest centroid; the first one wins on ties.
fn nearest_centroid(point: &LabColor, centroids: &[LabColor]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::MAX;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = point.distance(centroid);
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}
