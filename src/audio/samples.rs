use crate::error::{FingerprintError, Result};

/// Decode little-endian PCM bytes into signed amplitudes.
///
/// Reads `bits_per_sample / 8` bytes per sample from offset 0; a trailing
/// partial sample is dropped. Widths of 16 bits and above are two's
/// complement. 8-bit PCM is unsigned and gets re-centred around zero.
pub fn decode_amplitudes(data: &[u8], bits_per_sample: u16) -> Result<Vec<i32>> {
    if bits_per_sample == 0 || bits_per_sample % 8 != 0 || bits_per_sample > 32 {
        return Err(FingerprintError::Format(format!(
            "unsupported bits per sample: {bits_per_sample} (expected 8, 16, 24 or 32)"
        )));
    }

    let width = bits_per_sample as usize / 8;
    let amplitudes = data
        .chunks_exact(width)
        .map(|group| {
            let mut value: u32 = 0;
            for (byte_number, &byte) in group.iter().enumerate() {
                value |= (byte as u32) << (byte_number * 8);
            }
            if width == 1 {
                value as i32 - 128
            } else {
                // Shift the top bit of the group into the sign bit and back
                let shift = 32 - bits_per_sample as u32;
                ((value << shift) as i32) >> shift
            }
        })
        .collect();

    Ok(amplitudes)
}
