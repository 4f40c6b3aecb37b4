//! Error handling for maptune-rs
//!
//! This module defines the crate error type and a Result alias used
//! throughout the decoder, resampling primitives and recompute graph.
//!
//! Decode-time errors are local by design: a malformed formula or an
//! out-of-bounds axis fails that axis only, never the whole image decode.

use thiserror::Error;

/// Main error type for maptune-rs operations
#[derive(Error, Debug)]
pub enum MapTuneError {
    /// Malformed or unsupported axis conversion formula
    #[error("Formula error: {0}")]
    Formula(String),

    /// An axis decode would read past the end of the binary image
    #[error(
        "Out of bounds read at address 0x{address:08X}: need {required} bytes, image is {image_len}"
    )]
    OutOfBounds {
        address: usize,
        required: usize,
        image_len: usize,
    },

    /// Axis rescale target is unusable (last element is zero)
    #[error("Degenerate axis: {0}")]
    DegenerateAxis(String),

    /// A recompute binding is missing a required input
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MapTuneError>,
    },
}

impl MapTuneError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MapTuneError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for maptune-rs operations
pub type Result<T> = std::result::Result<T, MapTuneError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
