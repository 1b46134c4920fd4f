//! Error types for the palette_vision library.
//!
//! The per-frame core (sampling, quantization, stabilization) never fails: bad or
//! empty input degrades to "no palette this frame". Errors only exist at the edges,
//! where frames are constructed, images decoded, configuration parsed and the
//! background worker joined.

use thiserror::Error;

/// Result type alias for palette_vision operations
pub type Result<T> = std::result::Result<T, PaletteError>;

#[derive(Error, Debug)]
pub enum PaletteError {
    /// Frame geometry does not match its backing buffer
    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoad {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// The background palette worker stopped unexpectedly
    #[error("Palette worker failed: {message}")]
    Worker { message: String },
}

impl PaletteError {
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }

    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoad {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error only affects a single frame or request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PaletteError::InvalidFrame { .. }
                | PaletteError::ImageLoad { .. }
                | PaletteError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = PaletteError::invalid_parameter("number_of_colors", 0);
        assert_eq!(err.to_string(), "Invalid parameter: number_of_colors = 0");
        assert!(err.is_recoverable());

        let err = PaletteError::Worker {
            message: "panicked".to_string(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn config_error_exposes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = PaletteError::config("could not read options.json", io);
        let source = std::error::Error::source(&err).expect("source should be set");
        assert_eq!(source.to_string(), "missing");
    }
}
