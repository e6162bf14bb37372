//! Error types for the fingerprinting pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fingerprinting operations
pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Errors that abort the fingerprint computation of one input.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// Input audio file does not exist
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// External or in-process conversion to the canonical container failed
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Container bytes are truncated, mistagged or use an unsupported layout
    #[error("format error: {0}")]
    Format(String),

    /// Every spectrogram magnitude is the same, so there is no log range to normalize into
    #[error("degenerate spectrum: max magnitude {max} vs min {min} leaves no dynamic range")]
    DegenerateSpectrum { max: f64, min: f64 },

    /// FFT precondition violated (buffer length, power of two, sign)
    #[error("fft error: {0}")]
    Fft(String),

    /// Invalid fingerprint configuration
    #[error("config error: {0}")]
    Config(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FingerprintError {
    /// True for errors caused by the input itself rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            FingerprintError::NotFound(_)
                | FingerprintError::Format(_)
                | FingerprintError::DegenerateSpectrum { .. }
        )
    }
}
