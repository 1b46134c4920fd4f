use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LoggerConfig, LoggerFormat};
use crate::error::{PaletteError, Result};

/// Installs the global `tracing` subscriber.
///
/// `opts.level` is an `EnvFilter` directive, e.g. `info` or
/// `palette_vision=debug,warn`. Fails if a subscriber is already installed.
pub fn init_logger(opts: LoggerConfig) -> Result<()> {
    let env_filter = EnvFilter::new(opts.level.clone());

    let stdout_layer = match opts.format {
        LoggerFormat::Pretty => fmt::Layer::default().pretty().boxed(),
        LoggerFormat::Json => fmt::Layer::default().json().boxed(),
        LoggerFormat::Compact => fmt::Layer::default().compact().boxed(),
    };

    Registry::default()
        .with(stdout_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| PaletteError::config("could not install the logger", e))
}
