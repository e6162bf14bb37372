//! Landmark-based audio fingerprinting.
//!
//! A canonical 16-bit PCM container is parsed into amplitudes, turned into a
//! log-normalized spectrogram, scanned for local maxima, and nearby maxima
//! are paired into SHA-1 landmark hashes.
//!
//! ```no_run
//! use landprint::{FingerprintConfig, Fingerprinter, WavConverter};
//!
//! let fingerprinter = Fingerprinter::new(Box::new(WavConverter), "temp/wavs", FingerprintConfig::default());
//! let result = fingerprinter.fingerprint_file("song.wav".as_ref())?;
//! for landmark in &result.fingerprint.landmarks {
//!     println!("{} @ {}", landmark.hash_hex(), landmark.anchor.time);
//! }
//! # Ok::<(), landprint::FingerprintError>(())
//! ```

pub mod audio;
pub mod config;
pub mod digest;
pub mod dsp;
pub mod error;
pub mod fingerprinter;
pub mod types;

pub use audio::container::PcmContainer;
pub use audio::convert::{ensure_converted, Converter, FfmpegConverter, WavConverter};
pub use audio::header::WaveHeader;
pub use config::FingerprintConfig;
pub use dsp::spectrogram::Spectrogram;
pub use error::{FingerprintError, Result};
pub use fingerprinter::{FileFingerprint, Fingerprinter};
pub use types::{Fingerprint, Landmark, Peak};
