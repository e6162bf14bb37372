//! File-level entry point: content-address, convert, parse, fingerprint.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::audio::container::PcmContainer;
use crate::audio::convert::{ensure_converted, Converter};
use crate::audio::header::WaveHeader;
use crate::config::FingerprintConfig;
use crate::digest::file_digest;
use crate::error::{FingerprintError, Result};
use crate::types::Fingerprint;

/// Result of fingerprinting one input file.
#[derive(Clone, Debug, Serialize)]
pub struct FileFingerprint {
    pub input: PathBuf,
    /// SHA-1 of the raw input bytes, hex.
    pub content_digest: String,
    /// Converted container inside the cache directory.
    pub container: PathBuf,
    pub header: WaveHeader,
    pub duration_secs: f64,
    pub frames: usize,
    #[serde(flatten)]
    pub fingerprint: Fingerprint,
}

pub struct Fingerprinter {
    converter: Box<dyn Converter>,
    cache_dir: PathBuf,
    config: FingerprintConfig,
}

impl Fingerprinter {
    pub fn new(converter: Box<dyn Converter>, cache_dir: impl Into<PathBuf>, config: FingerprintConfig) -> Self {
        Self {
            converter,
            cache_dir: cache_dir.into(),
            config,
        }
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the converted container for content `digest` lives.
    pub fn container_path(&self, digest: &str) -> PathBuf {
        self.cache_dir.join(format!("{digest}.wav"))
    }

    pub fn fingerprint_file(&self, path: &Path) -> Result<FileFingerprint> {
        if !path.is_file() {
            return Err(FingerprintError::NotFound(path.to_path_buf()));
        }

        let content_digest = file_digest(path)?;
        let container_path = self.container_path(&content_digest);
        ensure_converted(self.converter.as_ref(), path, &container_path)?;

        let container = PcmContainer::open(&container_path, self.config.clone())?;
        let fingerprint = container.fingerprint()?.clone();
        let frames = container.spectrogram()?.rows();

        log::info!(
            "{}: {} landmarks ({})",
            path.display(),
            fingerprint.landmarks.len(),
            &content_digest[..8]
        );

        Ok(FileFingerprint {
            input: path.to_path_buf(),
            content_digest,
            container: container_path,
            header: container.header().clone(),
            duration_secs: container.duration_secs(),
            frames,
            fingerprint,
        })
    }

    /// Fingerprint a canonical container already in memory.
    pub fn fingerprint_bytes(&self, bytes: &[u8]) -> Result<Fingerprint> {
        let container = PcmContainer::parse_with_config(bytes, self.config.clone())?;
        Ok(container.fingerprint()?.clone())
    }
}
