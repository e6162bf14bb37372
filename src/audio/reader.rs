use crate::error::{FingerprintError, Result};

/// Sequential little-endian reader over a byte slice.
///
/// Every read advances the cursor; nothing can be re-read or skipped.
/// Reading past the end fails with a format error instead of panicking.
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.position + N;
        let slice = self.bytes.get(self.position..end).ok_or_else(|| {
            FingerprintError::Format(format!(
                "unexpected end of data: need {N} bytes at offset {}, {} left",
                self.position,
                self.remaining()
            ))
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.position = end;
        Ok(out)
    }

    /// Read a 4-byte ASCII tag such as `RIFF` or `fmt `.
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        self.take::<4>()
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    /// The unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }
}
