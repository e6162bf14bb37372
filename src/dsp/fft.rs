use rustfft::num_complex::Complex;
use rustfft::{FftDirection, FftPlanner};
use std::cell::RefCell;

use crate::error::{FingerprintError, Result};

thread_local! {
    static FFT_PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

/// `sign` for the forward transform, `X[k] = sum x[n] e^(-2 pi i k n / N)`.
pub const FORWARD: i32 = -1;
/// `sign` for the unnormalized inverse transform.
pub const INVERSE: i32 = 1;

/// Discrete Fourier transform over packed complex samples.
///
/// `buffer` holds `n` complex values as `[re0, im0, re1, im1, ...]`, so its
/// length is `2n`. `n` must be a power of two. The result overwrites the
/// input in the same packed layout. Nothing is scaled, so a forward/inverse
/// round trip multiplies every value by `n`.
pub fn transform(buffer: &mut [f64], sign: i32) -> Result<()> {
    if buffer.len() % 2 != 0 {
        return Err(FingerprintError::Fft(format!(
            "packed buffer length must be even, got {}",
            buffer.len()
        )));
    }
    let n = buffer.len() / 2;
    if !n.is_power_of_two() {
        return Err(FingerprintError::Fft(format!(
            "transform size must be a power of two, got {n}"
        )));
    }
    let direction = match sign {
        FORWARD => FftDirection::Forward,
        INVERSE => FftDirection::Inverse,
        other => {
            return Err(FingerprintError::Fft(format!(
                "sign must be -1 or +1, got {other}"
            )))
        }
    };

    let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft(n, direction));

    let mut spectrum: Vec<Complex<f64>> = buffer
        .chunks_exact(2)
        .map(|pair| Complex::new(pair[0], pair[1]))
        .collect();
    fft.process(&mut spectrum);

    for (pair, c) in buffer.chunks_exact_mut(2).zip(spectrum.iter()) {
        pair[0] = c.re;
        pair[1] = c.im;
    }
    Ok(())
}
