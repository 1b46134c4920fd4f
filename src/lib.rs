// THEORY:
// This file is the main entry point for the `palette_vision` library crate.
// It defines the public API exposed to consumers: a UI layer that wants a few
// dominant colors for whatever the camera is looking at.
//
// The primary exports are `PalettePipeline` (synchronous, one frame in, one
// report out) and `PaletteService` (an async, throttled worker around a
// pipeline), together with their configuration and report types. The
// algorithmic internals live in `core_modules` and are public for callers that
// want a single stage, e.g. only the color conversions or only one quantizer.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod logger;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{ProcessingOptions, ServiceConfig};
pub use core_modules::algorithms::{AlgorithmKind, PaletteAlgorithm};
pub use core_modules::color::color::{HsbColor, LabColor, RgbColor};
pub use core_modules::frame::frame::Frame;
pub use error::{PaletteError, Result};
pub use parallel_pipeline::PaletteService;
pub use pipeline::{PaletteData, PalettePipeline, PipelineConfig, Report};
