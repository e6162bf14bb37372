//! Parsed PCM container with once-computed analysis results.

use std::path::Path;
use std::sync::OnceLock;

use crate::audio::header::{WaveHeader, HEADER_LEN};
use crate::audio::samples::decode_amplitudes;
use crate::config::FingerprintConfig;
use crate::dsp::landmarks::generate_landmarks;
use crate::dsp::peaks::find_peaks;
use crate::dsp::spectrogram::Spectrogram;
use crate::error::{FingerprintError, Result};
use crate::types::Fingerprint;

/// A canonical PCM container: header, sample bytes and decoded amplitudes.
///
/// The spectrogram and fingerprint are computed on first request and kept
/// for the lifetime of the container. Both caches are `OnceLock`s, so a
/// container can be shared across threads and read concurrently.
#[derive(Debug)]
pub struct PcmContainer {
    header: WaveHeader,
    data: Vec<u8>,
    amplitudes: Vec<i32>,
    config: FingerprintConfig,
    spectrogram: OnceLock<Spectrogram>,
    fingerprint: OnceLock<Fingerprint>,
}

/// Byte length of a 16-bit data chunk holding `samples` samples.
fn data_chunk_len(samples: usize) -> Result<u32> {
    samples
        .checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            FingerprintError::Format(format!("{samples} samples do not fit in a 32-bit data chunk"))
        })
}

impl PcmContainer {
    /// Parse a container held in memory, with the default configuration.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_config(bytes, FingerprintConfig::default())
    }

    pub fn parse_with_config(bytes: &[u8], config: FingerprintConfig) -> Result<Self> {
        config.validate()?;
        let header = WaveHeader::parse(bytes)?;

        // Everything after the header, minus any trailing chunks past the declared data size
        let mut data = &bytes[HEADER_LEN..];
        let declared = header.sub_chunk2_size as usize;
        if declared < data.len() {
            data = &data[..declared];
        }

        let amplitudes = decode_amplitudes(data, header.bits_per_sample)?;
        if header.channels > 1 {
            log::warn!(
                "Container has {} channels; samples are analysed as a single interleaved stream",
                header.channels
            );
        }

        Ok(Self {
            header,
            data: data.to_vec(),
            amplitudes,
            config,
            spectrogram: OnceLock::new(),
            fingerprint: OnceLock::new(),
        })
    }

    /// Read and parse a container file.
    pub fn open(path: &Path, config: FingerprintConfig) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FingerprintError::NotFound(path.to_path_buf()),
            _ => FingerprintError::Io(e),
        })?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::parse_with_config(&bytes, config)
    }

    /// Build a 16-bit mono container from samples.
    pub fn from_amplitudes(samples: &[i16], sample_rate: u32, config: FingerprintConfig) -> Result<Self> {
        let data_len = data_chunk_len(samples.len())?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + data_len as usize);
        let header = WaveHeader::pcm(1, sample_rate, 16, data_len);
        bytes.extend_from_slice(&header.to_bytes());
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        Self::parse_with_config(&bytes, config)
    }

    pub fn header(&self) -> &WaveHeader {
        &self.header
    }

    /// Raw bytes of the data region.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn amplitudes(&self) -> &[i32] {
        &self.amplitudes
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    pub fn duration_secs(&self) -> f64 {
        self.header.duration_secs(self.data.len())
    }

    /// The normalized spectrogram, computed on first call.
    pub fn spectrogram(&self) -> Result<&Spectrogram> {
        if let Some(spectrogram) = self.spectrogram.get() {
            return Ok(spectrogram);
        }
        let computed = Spectrogram::compute(&self.amplitudes, self.header.sample_rate, &self.config)?;
        Ok(self.spectrogram.get_or_init(|| computed))
    }

    /// Peaks and landmarks, computed on first call.
    pub fn fingerprint(&self) -> Result<&Fingerprint> {
        if let Some(fingerprint) = self.fingerprint.get() {
            return Ok(fingerprint);
        }

        let spectrogram = self.spectrogram()?;
        let peaks = find_peaks(spectrogram.data(), self.config.peak_neighborhood);
        let landmarks = generate_landmarks(&peaks, self.config.fan_value, self.config.max_delta);
        log::info!(
            "Fingerprinted {:.2}s of audio: {} frames, {} peaks, {} landmarks",
            self.duration_secs(),
            spectrogram.rows(),
            peaks.len(),
            landmarks.len()
        );

        Ok(self.fingerprint.get_or_init(|| Fingerprint { peaks, landmarks }))
    }
}
