use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FingerprintError, Result};

/// Tunable constants of the fingerprinting pipeline.
///
/// The defaults reproduce the reference fingerprints; changing any of them
/// produces hashes that will not match ones computed with other values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Samples per FFT frame. Must be a power of two.
    pub frame_size: usize,
    /// Frames per `frame_size` samples (2 = 50% overlap).
    pub overlap_factor: usize,
    /// Half-width of the local-maximum search window, in cells.
    pub peak_neighborhood: usize,
    /// How many peaks (the anchor included) each anchor is paired with.
    pub fan_value: usize,
    /// Largest frame distance between two paired peaks.
    pub max_delta: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            frame_size: 4096,
            overlap_factor: 2,
            peak_neighborhood: 20,
            fan_value: 15,
            max_delta: 200,
        }
    }
}

impl FingerprintConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.frame_size.is_power_of_two() || self.frame_size < 8 {
            return Err(FingerprintError::Config(format!(
                "frame_size must be a power of two >= 8, got {}",
                self.frame_size
            )));
        }
        if self.overlap_factor == 0 || self.overlap_factor > self.frame_size {
            return Err(FingerprintError::Config(format!(
                "overlap_factor must be in 1..={}, got {}",
                self.frame_size, self.overlap_factor
            )));
        }
        if self.fan_value == 0 {
            return Err(FingerprintError::Config("fan_value must be at least 1".into()));
        }
        Ok(())
    }

    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded fingerprint config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Input samples between the starts of consecutive frames.
    pub fn hop_size(&self) -> usize {
        (self.frame_size / self.overlap_factor.max(1)).max(1)
    }

    /// Frequency bins per spectrogram row.
    pub fn bins(&self) -> usize {
        self.frame_size / 4
    }
}
