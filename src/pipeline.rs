// THEORY:
// The `pipeline` module is the top-level synchronous API of the palette engine. It
// wires the full stack into a single object that takes one frame at a time and
// answers with a report: either "no palette this frame" or a fresh, stabilized
// palette.
//
// Key architectural principles:
// 1.  **Staged Processing**: Every frame runs through the same four stages, in
//     order: grid sampling, the optional gray filter, quantization, stabilization.
//     Only the last stage holds state.
// 2.  **Strategy At Construction**: The quantizer is fixed when the pipeline is
//     built. `PalettePipeline` is generic over any `PaletteAlgorithm`, and defaults
//     to `AlgorithmKind` so configuration can pick a built-in one by name.
// 3.  **Never Fails Per Frame**: Validation happens once, in the constructor. After
//     that, a frame that cannot be read, or that yields no samples, is reported as
//     `NoPaletteUpdate` and leaves the previous palette untouched.

use crate::config::{DEFAULT_NUMBER_OF_COLORS, ProcessingOptions, ServiceConfig};
use crate::core_modules::algorithms::{AlgorithmKind, PaletteAlgorithm};
use crate::core_modules::sample_filter::filter_samples;
use crate::core_modules::sampler;
use crate::core_modules::stabilizer::PaletteStabilizer;
use crate::error::{PaletteError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

// Re-export key data structures for the public API.
pub use crate::core_modules::color::color::RgbColor;
pub use crate::core_modules::frame::frame::Frame;

/// Configuration for a `PalettePipeline` built from a named algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub algorithm: AlgorithmKind,
    /// Exact length of every published palette.
    pub number_of_colors: usize,
    pub options: ProcessingOptions,
}

impl PipelineConfig {
    /// The algorithm's preset options with the default palette size.
    pub fn for_algorithm(algorithm: AlgorithmKind) -> Self {
        Self {
            algorithm,
            number_of_colors: DEFAULT_NUMBER_OF_COLORS,
            options: ProcessingOptions::preset_for(algorithm),
        }
    }
}

impl From<&ServiceConfig> for PipelineConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            number_of_colors: config.number_of_colors,
            options: config.options.clone(),
        }
    }
}

/// The data package for a frame that produced a palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteData {
    /// Exactly `number_of_colors` colors, brightest first.
    pub colors: Vec<RgbColor>,
    /// Samples that reached the quantizer.
    pub sample_count: usize,
    pub processing_time: Duration,
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    NoPaletteUpdate,
    PaletteUpdated(PaletteData),
}

impl Report {
    pub fn palette(&self) -> Option<&[RgbColor]> {
        match self {
            Report::NoPaletteUpdate => None,
            Report::PaletteUpdated(data) => Some(&data.colors),
        }
    }
}

/// The main, top-level struct for the palette engine.
#[derive(Debug)]
pub struct PalettePipeline<A = AlgorithmKind> {
    algorithm: A,
    number_of_colors: usize,
    options: ProcessingOptions,
    stabilizer: PaletteStabilizer,
}

impl PalettePipeline<AlgorithmKind> {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_algorithm(config.algorithm, config.number_of_colors, config.options)
    }

    /// K-means in Lab with its preset options.
    pub fn kmeans() -> Self {
        Self::preset(AlgorithmKind::KMeansLab)
    }

    /// Median-Cut with its preset options.
    pub fn median_cut() -> Self {
        Self::preset(AlgorithmKind::MedianCut)
    }

    /// Octree quantization with its preset options.
    pub fn octree() -> Self {
        Self::preset(AlgorithmKind::Octree)
    }

    fn preset(algorithm: AlgorithmKind) -> Self {
        let config = PipelineConfig::for_algorithm(algorithm);
        Self::build(config.algorithm, config.number_of_colors, config.options)
    }
}

impl<A: PaletteAlgorithm> PalettePipeline<A> {
    /// Builds a pipeline around any quantizer, validating the configuration.
    pub fn with_algorithm(
        algorithm: A,
        number_of_colors: usize,
        options: ProcessingOptions,
    ) -> Result<Self> {
        if number_of_colors == 0 {
            return Err(PaletteError::invalid_parameter("number_of_colors", number_of_colors));
        }
        options.validate()?;
        Ok(Self::build(algorithm, number_of_colors, options))
    }

    fn build(algorithm: A, number_of_colors: usize, options: ProcessingOptions) -> Self {
        info!(
            algorithm = algorithm.name(),
            number_of_colors,
            max_samples = options.max_pixels_to_sample,
            smoothing_factor = options.smoothing_factor,
            "Created palette pipeline"
        );
        let stabilizer = PaletteStabilizer::new(number_of_colors, options.smoothing_factor);
        Self {
            algorithm,
            number_of_colors,
            options,
            stabilizer,
        }
    }

    pub fn process_frame(&mut self, frame: &Frame) -> Report {
        let started = Instant::now();

        // Stage 1: Grid Sampling
        let samples = sampler::sample(frame, self.options.max_pixels_to_sample);
        if samples.is_empty() {
            trace!(
                width = frame.width,
                height = frame.height,
                "Frame yielded no samples, keeping previous palette"
            );
            return Report::NoPaletteUpdate;
        }

        // Stage 2: Optional Gray Filtering
        let samples = filter_samples(samples, &self.options);

        // Stage 3: Quantization
        let raw = self
            .algorithm
            .extract_colors(&samples, self.number_of_colors, &self.options);

        // Stage 4: Temporal Stabilization
        let raw_count = raw.len();
        let colors = self.stabilizer.stabilize(raw);

        let processing_time = started.elapsed();
        debug!(
            algorithm = self.algorithm.name(),
            samples = samples.len(),
            raw_colors = raw_count,
            elapsed_us = processing_time.as_micros() as u64,
            "Processed frame"
        );

        Report::PaletteUpdated(PaletteData {
            colors,
            sample_count: samples.len(),
            processing_time,
        })
    }

    /// Convenience wrapper returning only the palette.
    pub fn extract_palette(&mut self, frame: &Frame) -> Option<Vec<RgbColor>> {
        match self.process_frame(frame) {
            Report::PaletteUpdated(data) => Some(data.colors),
            Report::NoPaletteUpdate => None,
        }
    }

    /// Clears the stabilizer's memory, e.g. after a camera switch.
    pub fn reset(&mut self) {
        self.stabilizer.reset();
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    pub fn number_of_colors(&self) -> usize {
        self.number_of_colors
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn last_palette(&self) -> Option<&[RgbColor]> {
        self.stabilizer.previous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsmoothed(algorithm: AlgorithmKind, number_of_colors: usize) -> PalettePipeline {
        let options = ProcessingOptions {
            smoothing_factor: 0.0,
            ..ProcessingOptions::default()
        };
        PalettePipeline::with_algorithm(algorithm, number_of_colors, options).unwrap()
    }

    #[test]
    fn rejects_zero_colors() {
        let result =
            PalettePipeline::with_algorithm(AlgorithmKind::Octree, 0, ProcessingOptions::default());
        assert!(matches!(result, Err(PaletteError::InvalidParameter { .. })));
    }

    #[test]
    fn rejects_invalid_options() {
        let options = ProcessingOptions {
            smoothing_factor: 1.5,
            ..ProcessingOptions::default()
        };
        assert!(PalettePipeline::with_algorithm(AlgorithmKind::Average, 4, options).is_err());
    }

    #[test]
    fn presets_use_their_algorithm() {
        assert_eq!(PalettePipeline::kmeans().algorithm_name(), "K-means++ (LAB)");
        assert_eq!(PalettePipeline::median_cut().algorithm_name(), "Median Cut");
        assert_eq!(PalettePipeline::octree().algorithm_name(), "Octree Quantization");
        assert_eq!(PalettePipeline::octree().options(), &ProcessingOptions::octree_preset());
    }

    #[test]
    fn solid_frame_gives_a_padded_palette() {
        let mut pipeline = unsmoothed(AlgorithmKind::MedianCut, 4);
        let report = pipeline.process_frame(&Frame::solid(RgbColor::BLUE, 32, 32));
        assert_eq!(report.palette(), Some(&[RgbColor::BLUE; 4][..]));
        assert_eq!(pipeline.last_palette(), Some(&[RgbColor::BLUE; 4][..]));
    }

    #[test]
    fn empty_frames_keep_the_previous_palette() {
        let mut pipeline = unsmoothed(AlgorithmKind::Average, 2);
        pipeline.process_frame(&Frame::solid(RgbColor::RED, 8, 8));

        let empty = Frame::solid(RgbColor::GREEN, 0, 0);
        assert_eq!(pipeline.process_frame(&empty), Report::NoPaletteUpdate);

        let truncated = Frame {
            width: 8,
            height: 8,
            bytes_per_row: 32,
            data: vec![0; 10],
        };
        assert_eq!(pipeline.extract_palette(&truncated), None);
        assert_eq!(pipeline.last_palette(), Some(&[RgbColor::RED; 2][..]));
    }

    #[test]
    fn reset_drops_smoothing_memory() {
        let options = ProcessingOptions {
            smoothing_factor: 0.9,
            ..ProcessingOptions::default()
        };
        let mut pipeline =
            PalettePipeline::with_algorithm(AlgorithmKind::Average, 1, options).unwrap();
        pipeline.process_frame(&Frame::solid(RgbColor::RED, 8, 8));
        pipeline.reset();
        let palette = pipeline.extract_palette(&Frame::solid(RgbColor::BLUE, 8, 8));
        assert_eq!(palette, Some(vec![RgbColor::BLUE]));
    }

    #[test]
    fn reports_the_sample_count() {
        let mut pipeline = unsmoothed(AlgorithmKind::Average, 1);
        match pipeline.process_frame(&Frame::solid(RgbColor::WHITE, 10, 10)) {
            Report::PaletteUpdated(data) => assert_eq!(data.sample_count, 100),
            Report::NoPaletteUpdate => panic!("expected a palette"),
        }
    }
}
