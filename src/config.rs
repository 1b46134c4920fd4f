//! Configuration for the palette engine.
//!
//! Two layers:
//!
//! - [`ProcessingOptions`]: the tunables the sampler, quantizers and stabilizer
//!   read. Fixed for the lifetime of a pipeline. Serializable to/from JSON so that
//!   experiments are reproducible, with per-algorithm presets.
//! - [`ServiceConfig`]: how the binary wires a pipeline together (which
//!   algorithm, how many colors, throttle interval, logging), read from
//!   `PALETTE_VISION_*` environment variables.
//!
//! ```no_run
//! use palette_vision::config::ProcessingOptions;
//! use std::path::Path;
//!
//! let options = ProcessingOptions::from_json_file(Path::new("options.json"))?;
//! # Ok::<(), palette_vision::PaletteError>(())
//! ```

use crate::core_modules::algorithms::AlgorithmKind;
use crate::error::{PaletteError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_NUMBER_OF_COLORS: usize = 4;
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(150);

/// Tunable parameters for one palette pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Clusters or blocks holding less than this fraction of all samples are dropped.
    pub min_cluster_percentage: f64,

    /// Upper bound on the number of samples taken from a frame.
    pub max_pixels_to_sample: usize,

    /// Iteration cap for iterative algorithms (K-means).
    pub max_iterations: usize,

    /// Drop near-gray and out-of-range-brightness samples before quantizing.
    pub filter_gray_colors: bool,

    /// Minimum HSB saturation a sample needs to survive the gray filter (0..1).
    pub saturation_threshold: f64,

    /// HSB brightness bounds a sample needs to survive the gray filter.
    pub brightness_range: BrightnessRange,

    /// Weight of the previous palette when blending frames.
    /// 0 disables smoothing, values near 1 freeze the palette.
    pub smoothing_factor: f64,
}

/// Inclusive brightness bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessRange {
    pub min: f64,
    pub max: f64,
}

impl BrightnessRange {
    pub fn contains(&self, brightness: f64) -> bool {
        (self.min..=self.max).contains(&brightness)
    }
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            min_cluster_percentage: 0.01,
            max_pixels_to_sample: 2_000,
            max_iterations: 10,
            filter_gray_colors: false,
            saturation_threshold: 0.15,
            brightness_range: BrightnessRange { min: 0.15, max: 0.9 },
            smoothing_factor: 0.7,
        }
    }
}

impl ProcessingOptions {
    /// Tuned for K-means: larger minimum clusters, fewer iterations, heavier smoothing.
    pub fn kmeans_preset() -> Self {
        Self {
            min_cluster_percentage: 0.02,
            max_pixels_to_sample: 2_000,
            max_iterations: 8,
            saturation_threshold: 0.2,
            smoothing_factor: 0.85,
            ..Self::default()
        }
    }

    /// Tuned for Median-Cut: more samples, a single pass.
    pub fn median_cut_preset() -> Self {
        Self {
            min_cluster_percentage: 0.01,
            max_pixels_to_sample: 3_000,
            max_iterations: 1,
            smoothing_factor: 0.9,
            ..Self::default()
        }
    }

    /// Tuned for the octree: many samples, tiny clusters allowed.
    pub fn octree_preset() -> Self {
        Self {
            min_cluster_percentage: 0.005,
            max_pixels_to_sample: 5_000,
            smoothing_factor: 0.9,
            ..Self::default()
        }
    }

    pub fn preset_for(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::KMeansLab => Self::kmeans_preset(),
            AlgorithmKind::MedianCut => Self::median_cut_preset(),
            AlgorithmKind::Octree => Self::octree_preset(),
            AlgorithmKind::Average => Self::default(),
        }
    }

    /// Rejects values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_cluster_percentage) {
            return Err(PaletteError::invalid_parameter(
                "min_cluster_percentage",
                self.min_cluster_percentage,
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_factor) {
            return Err(PaletteError::invalid_parameter(
                "smoothing_factor",
                self.smoothing_factor,
            ));
        }
        if !(0.0..=1.0).contains(&self.saturation_threshold) {
            return Err(PaletteError::invalid_parameter(
                "saturation_threshold",
                self.saturation_threshold,
            ));
        }
        if self.brightness_range.min > self.brightness_range.max {
            return Err(PaletteError::invalid_parameter(
                "brightness_range",
                format!("{}..={}", self.brightness_range.min, self.brightness_range.max),
            ));
        }
        Ok(())
    }

    /// Load options from a JSON file. Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PaletteError::config(format!("could not read {}", path.display()), e))?;
        let options: Self = serde_json::from_str(&content)
            .map_err(|e| PaletteError::config(format!("could not parse {}", path.display()), e))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to a JSON file.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PaletteError::config("could not serialize options", e))?;
        std::fs::write(path, json)
            .map_err(|e| PaletteError::config(format!("could not write {}", path.display()), e))
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoggerFormat {
    Pretty,
    Json,
    Compact,
}

impl FromStr for LoggerFormat {
    type Err = &'static str;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(LoggerFormat::Json),
            "pretty" => Ok(LoggerFormat::Pretty),
            "compact" => Ok(LoggerFormat::Compact),
            _ => Err("invalid logger format"),
        }
    }
}

/// Everything needed to stand up a palette service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub algorithm: AlgorithmKind,
    pub number_of_colors: usize,
    pub throttle_interval: Duration,
    pub options: ProcessingOptions,
    pub options_file: Option<PathBuf>,
    pub logger: LoggerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::KMeansLab,
            number_of_colors: DEFAULT_NUMBER_OF_COLORS,
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            options: ProcessingOptions::kmeans_preset(),
            options_file: None,
            logger: LoggerConfig {
                format: LoggerFormat::Compact,
                level: "info".to_string(),
            },
        }
    }
}

/// Reads the service configuration from the process environment.
pub fn read_config() -> Result<ServiceConfig> {
    read_config_from(|key| std::env::var(key).ok())
}

/// Reads the service configuration through an arbitrary variable lookup.
///
/// Malformed values fall back to defaults with a warning. Only an unreadable
/// options file is an error, since silently ignoring it would hide a typo'd path.
pub fn read_config_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ServiceConfig::default();

    let algorithm = match lookup("PALETTE_VISION_ALGORITHM") {
        Some(name) => AlgorithmKind::from_str(&name).unwrap_or_else(|_| {
            warn!(
                value = %name,
                "Invalid PALETTE_VISION_ALGORITHM. Falling back to {}.",
                defaults.algorithm
            );
            defaults.algorithm
        }),
        None => defaults.algorithm,
    };

    let number_of_colors = match lookup("PALETTE_VISION_NUMBER_OF_COLORS") {
        Some(value) => match value.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!(
                    %value,
                    "Invalid PALETTE_VISION_NUMBER_OF_COLORS. Falling back to {}.",
                    DEFAULT_NUMBER_OF_COLORS
                );
                DEFAULT_NUMBER_OF_COLORS
            }
        },
        None => DEFAULT_NUMBER_OF_COLORS,
    };

    let throttle_interval = match lookup("PALETTE_VISION_THROTTLE_MS") {
        Some(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            _ => {
                warn!(%value, "Invalid PALETTE_VISION_THROTTLE_MS. Falling back to 150ms.");
                DEFAULT_THROTTLE_INTERVAL
            }
        },
        None => DEFAULT_THROTTLE_INTERVAL,
    };

    let options_file = lookup("PALETTE_VISION_OPTIONS_FILE").map(PathBuf::from);
    let options = match &options_file {
        Some(path) => ProcessingOptions::from_json_file(path)?,
        None => ProcessingOptions::preset_for(algorithm),
    };

    let level = lookup("PALETTE_VISION_LOGGER_LEVEL").unwrap_or(defaults.logger.level);
    let format = match lookup("PALETTE_VISION_LOGGER_FORMAT") {
        Some(format) => LoggerFormat::from_str(&format).unwrap_or(defaults.logger.format),
        None => defaults.logger.format,
    };

    Ok(ServiceConfig {
        algorithm,
        number_of_colors,
        throttle_interval,
        options,
        options_file,
        logger: LoggerConfig { format, level },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = read_config_from(lookup_from(&[])).unwrap();
        assert_eq!(config.algorithm, AlgorithmKind::KMeansLab);
        assert_eq!(config.number_of_colors, 4);
        assert_eq!(config.throttle_interval, Duration::from_millis(150));
        assert_eq!(config.options, ProcessingOptions::kmeans_preset());
        assert_eq!(config.logger.format, LoggerFormat::Compact);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = read_config_from(lookup_from(&[
            ("PALETTE_VISION_ALGORITHM", "octree"),
            ("PALETTE_VISION_NUMBER_OF_COLORS", "6"),
            ("PALETTE_VISION_THROTTLE_MS", "40"),
            ("PALETTE_VISION_LOGGER_FORMAT", "json"),
            ("PALETTE_VISION_LOGGER_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.algorithm, AlgorithmKind::Octree);
        assert_eq!(config.number_of_colors, 6);
        assert_eq!(config.throttle_interval, Duration::from_millis(40));
        assert_eq!(config.options, ProcessingOptions::octree_preset());
        assert_eq!(config.logger.format, LoggerFormat::Json);
        assert_eq!(config.logger.level, "debug");
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = read_config_from(lookup_from(&[
            ("PALETTE_VISION_ALGORITHM", "watershed"),
            ("PALETTE_VISION_NUMBER_OF_COLORS", "0"),
            ("PALETTE_VISION_THROTTLE_MS", "soon"),
            ("PALETTE_VISION_LOGGER_FORMAT", "xml"),
        ]))
        .unwrap();
        assert_eq!(config.algorithm, AlgorithmKind::KMeansLab);
        assert_eq!(config.number_of_colors, 4);
        assert_eq!(config.throttle_interval, DEFAULT_THROTTLE_INTERVAL);
        assert_eq!(config.logger.format, LoggerFormat::Compact);
    }

    #[test]
    fn missing_options_file_is_an_error() {
        let result = read_config_from(lookup_from(&[(
            "PALETTE_VISION_OPTIONS_FILE",
            "/definitely/not/here.json",
        )]));
        assert!(matches!(result, Err(PaletteError::Config { .. })));
    }

    #[test]
    fn options_survive_a_json_file() {
        let file_name = format!("palette_vision_options_{}.json", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        let options = ProcessingOptions::median_cut_preset();
        options.to_json_file(&path).unwrap();
        let loaded = ProcessingOptions::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, options);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let options: ProcessingOptions =
            serde_json::from_str(r#"{ "max_iterations": 3 }"#).unwrap();
        assert_eq!(options.max_iterations, 3);
        assert_eq!(options.max_pixels_to_sample, 2_000);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let options = ProcessingOptions {
            smoothing_factor: 1.5,
            ..ProcessingOptions::default()
        };
        assert!(options.validate().is_err());
        assert!(ProcessingOptions::default().validate().is_ok());
    }
}
