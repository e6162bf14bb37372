//! Log-normalized magnitude spectrogram.
//!
//! Amplitudes are expanded into an overlapped stream, cut into frames of
//! `frame_size` samples, Hamming-windowed, transformed, and reduced to the
//! magnitudes of the first `frame_size / 4` bins. The whole matrix is then
//! mapped onto `[0, 1]` on a log scale between its smallest and largest
//! magnitude.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::config::FingerprintConfig;
use crate::dsp::fft;
use crate::error::{FingerprintError, Result};

/// Magnitudes below this are treated as silence.
pub const MIN_VALID_AMPLITUDE: f64 = 1e-11;

thread_local! {
    static HAMMING_CACHE: RefCell<HashMap<usize, Vec<f64>>> = RefCell::new(HashMap::new());
}

/// Bell-shaped analysis window: `w[m+n] = 0.5 + 0.5 cos(n pi / (m+1))`
/// for `n` in `[-m, m)`, `m = size / 2`.
pub fn hamming_window(size: usize) -> Vec<f64> {
    HAMMING_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .entry(size)
            .or_insert_with(|| {
                let m = (size / 2) as i64;
                let r = std::f64::consts::PI / (m + 1) as f64;
                let mut w = vec![0.0; size];
                for n in -m..m {
                    w[(m + n) as usize] = 0.5 + 0.5 * (n as f64 * r).cos();
                }
                w
            })
            .clone()
    })
}

/// Amplitude stream rewritten so consecutive frames overlap.
pub struct Overlapped {
    /// `samples.len() * overlap_factor` values; the tail past `filled` is zero.
    pub samples: Vec<i32>,
    /// Number of leading values actually copied from the input.
    pub filled: usize,
}

/// Expand `samples` so that every frame of `frame_size` starts
/// `frame_size / overlap_factor` input samples after the previous one.
///
/// A single forward scan copies samples and, each time the write position
/// reaches the last slot of a frame, rewinds the read cursor by
/// `frame_size * (overlap_factor - 1) / overlap_factor`. The rewind fires one
/// slot early, so the final sample of every frame repeats an earlier input
/// sample; fingerprints depend on this exact layout.
pub fn overlap_samples(samples: &[i32], frame_size: usize, overlap_factor: usize) -> Overlapped {
    if overlap_factor <= 1 || frame_size == 0 {
        return Overlapped {
            samples: samples.to_vec(),
            filled: samples.len(),
        };
    }

    let back = frame_size * (overlap_factor - 1) / overlap_factor;
    let mut overlapped = vec![0i32; samples.len() * overlap_factor];
    let mut position = 0usize;
    let mut i = 0usize;

    while i < samples.len() && position < overlapped.len() {
        overlapped[position] = samples[i];
        position += 1;
        if position % frame_size == frame_size - 1 {
            i = (i + 1).saturating_sub(back);
        } else {
            i += 1;
        }
    }

    Overlapped {
        samples: overlapped,
        filled: position,
    }
}

/// Window one frame, transform it as packed complex pairs, and return the
/// magnitudes of the first `frame.len() / 4` complex outputs.
fn frame_magnitudes(frame: &[i32], window: &[f64]) -> Result<Vec<f64>> {
    let mut signal: Vec<f64> = frame
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| s as f64 * w)
        .collect();

    fft::transform(&mut signal, fft::FORWARD)?;

    // The upper half of the complex outputs mirrors the lower half
    let bins = frame.len() / 4;
    Ok(signal[..bins * 2]
        .chunks_exact(2)
        .map(|c| (c[0] * c[0] + c[1] * c[1]).sqrt())
        .collect())
}

/// Map raw magnitudes onto `[0, 1]` using `log(x / min) / log(max / min)`.
fn normalize(magnitudes: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
    let (mut min_amp, max_amp) = magnitudes
        .iter()
        .flat_map(|row| row.iter())
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if min_amp == 0.0 {
        min_amp = MIN_VALID_AMPLITUDE;
    }

    let difference = (max_amp / min_amp).log10();
    if max_amp < MIN_VALID_AMPLITUDE || difference.is_nan() || difference <= 0.0 {
        return Err(FingerprintError::DegenerateSpectrum {
            max: max_amp,
            min: min_amp,
        });
    }

    Ok(magnitudes
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|v| {
                    if v < MIN_VALID_AMPLITUDE {
                        0.0
                    } else {
                        (v / min_amp).log10() / difference
                    }
                })
                .collect()
        })
        .collect())
}

/// Time x frequency matrix of normalized magnitudes, `data[frame][bin]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrogram {
    data: Vec<Vec<f64>>,
    frame_size: usize,
    overlap_factor: usize,
    sample_rate: u32,
}

impl Spectrogram {
    /// Compute the spectrogram of mono `amplitudes`.
    ///
    /// Fewer than `frame_size` samples give an empty spectrogram, which is a
    /// valid result and not an error.
    pub fn compute(amplitudes: &[i32], sample_rate: u32, config: &FingerprintConfig) -> Result<Self> {
        config.validate()?;
        let frame_size = config.frame_size;

        let mut spectrogram = Self {
            data: Vec::new(),
            frame_size,
            overlap_factor: config.overlap_factor,
            sample_rate,
        };

        if amplitudes.len() < frame_size {
            log::debug!(
                "{} samples is shorter than one {}-sample frame, spectrogram is empty",
                amplitudes.len(),
                frame_size
            );
            return Ok(spectrogram);
        }

        let overlapped = overlap_samples(amplitudes, frame_size, config.overlap_factor);

        // Framed over the whole `samples * overlap_factor` buffer, zero tail included
        let frames = overlapped.samples.len() / frame_size;
        let window = hamming_window(frame_size);

        let magnitudes = overlapped.samples[..frames * frame_size]
            .chunks_exact(frame_size)
            .map(|frame| frame_magnitudes(frame, &window))
            .collect::<Result<Vec<_>>>()?;

        spectrogram.data = normalize(magnitudes)?;

        log::debug!(
            "Spectrogram: {} frames x {} bins from {} samples at {} Hz",
            spectrogram.rows(),
            spectrogram.bins(),
            amplitudes.len(),
            sample_rate
        );
        Ok(spectrogram)
    }

    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    /// Number of time frames.
    pub fn rows(&self) -> usize {
        self.data.len()
    }

    /// Number of frequency bins per frame (zero when empty).
    pub fn bins(&self) -> usize {
        self.data.first().map_or(0, |row| row.len())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, frame: usize, bin: usize) -> Option<f64> {
        self.data.get(frame).and_then(|row| row.get(bin)).copied()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Centre frequency of `bin` in Hz.
    pub fn bin_frequency_hz(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate as f64 / self.frame_size as f64
    }

    /// Start time of `frame` in seconds.
    pub fn frame_time_secs(&self, frame: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let hop = self.frame_size / self.overlap_factor.max(1);
        (frame * hop) as f64 / self.sample_rate as f64
    }
}
