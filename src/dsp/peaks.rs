//! Local-maximum search over a normalized spectrogram.

use crate::types::Peak;

/// Upper bound (exclusive) of the search window along one axis.
///
/// The window is `[x - k, x + k)` clipped to `[0, len)`, except that a window
/// reaching the far edge stops at `len - 1`, so the last row or column of the
/// matrix is never compared against.
fn window_end(x: usize, k: usize, len: usize) -> usize {
    if x + k >= len {
        len.saturating_sub(1)
    } else {
        x + k
    }
}

/// `true` when no cell in the neighborhood of `(x, y)` is strictly greater.
/// Equal values do not disqualify a cell. Coordinates outside the matrix are
/// never peaks.
pub fn is_peak_at(data: &[Vec<f64>], x: usize, y: usize, neighborhood: usize) -> bool {
    let Some(&amplitude) = data.get(x).and_then(|row| row.get(y)) else {
        return false;
    };
    let cols = data[0].len();

    let x_start = x.saturating_sub(neighborhood);
    let x_end = window_end(x, neighborhood, data.len());
    let y_start = y.saturating_sub(neighborhood);
    let y_end = window_end(y, neighborhood, cols);

    data[x_start..x_end]
        .iter()
        .all(|row| row.iter().take(y_end).skip(y_start).all(|&v| v <= amplitude))
}

/// Scan every cell and collect the local maxima in row-major order
/// (ascending frame, then ascending bin).
pub fn find_peaks(data: &[Vec<f64>], neighborhood: usize) -> Vec<Peak> {
    if data.is_empty() || data[0].is_empty() {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    for (i, row) in data.iter().enumerate() {
        for j in 0..row.len() {
            if is_peak_at(data, i, j, neighborhood) {
                peaks.push(Peak::new(i, j));
            }
        }
    }

    log::debug!(
        "Found {} peaks in {}x{} spectrogram (neighborhood {})",
        peaks.len(),
        data.len(),
        data[0].len(),
        neighborhood
    );
    peaks
}
