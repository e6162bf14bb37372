//! Canonical 44-byte PCM WAV header.
//!
//! Layout (all integers little-endian):
//!
//! | offset | field            | type  |
//! |--------|------------------|-------|
//! | 0      | chunk id         | tag   |
//! | 4      | chunk size       | u32   |
//! | 8      | format           | tag   |
//! | 12     | fmt subchunk id  | tag   |
//! | 16     | fmt subchunk size| u32   |
//! | 20     | audio format     | u16   |
//! | 22     | channels         | u16   |
//! | 24     | sample rate      | u32   |
//! | 28     | byte rate        | u32   |
//! | 32     | block align      | u16   |
//! | 34     | bits per sample  | u16   |
//! | 36     | data subchunk id | tag   |
//! | 40     | data size        | u32   |

use std::fmt;

use serde::{Serialize, Serializer};

use crate::audio::reader::ByteReader;
use crate::error::{FingerprintError, Result};

/// Size of the fixed header region; sample data starts here.
pub const HEADER_LEN: usize = 44;

/// A 4-character ASCII chunk tag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FourCc(pub [u8; 4]);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl Serialize for FourCc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WaveHeader {
    pub chunk_id: FourCc,
    pub chunk_size: u32,
    pub format: FourCc,
    pub sub_chunk1_id: FourCc,
    pub sub_chunk1_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub sub_chunk2_id: FourCc,
    pub sub_chunk2_size: u32,
}

impl WaveHeader {
    /// Parse and validate the header at the start of `bytes`.
    ///
    /// Requires `RIFF`/`WAVE`/`fmt `/`data` tags in their canonical slots.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_unchecked(bytes)?;
        header.validate_tags()?;
        Ok(header)
    }

    /// Parse the 13 header fields without checking tag values.
    ///
    /// A non-WAV buffer of at least 44 bytes yields a header full of garbage.
    pub fn parse_unchecked(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(FingerprintError::Format(format!(
                "buffer holds {} bytes, header needs {HEADER_LEN}",
                bytes.len()
            )));
        }

        let mut reader = ByteReader::new(bytes);
        Ok(Self {
            chunk_id: FourCc(reader.read_tag()?),
            chunk_size: reader.read_u32_le()?,
            format: FourCc(reader.read_tag()?),
            sub_chunk1_id: FourCc(reader.read_tag()?),
            sub_chunk1_size: reader.read_u32_le()?,
            audio_format: reader.read_u16_le()?,
            channels: reader.read_u16_le()?,
            sample_rate: reader.read_u32_le()?,
            byte_rate: reader.read_u32_le()?,
            block_align: reader.read_u16_le()?,
            bits_per_sample: reader.read_u16_le()?,
            sub_chunk2_id: FourCc(reader.read_tag()?),
            sub_chunk2_size: reader.read_u32_le()?,
        })
    }

    fn validate_tags(&self) -> Result<()> {
        let expected: [(&str, FourCc, &[u8; 4]); 4] = [
            ("chunk id", self.chunk_id, b"RIFF"),
            ("format", self.format, b"WAVE"),
            ("fmt subchunk id", self.sub_chunk1_id, b"fmt "),
            ("data subchunk id", self.sub_chunk2_id, b"data"),
        ];
        for (field, found, want) in expected {
            if &found.0 != want {
                return Err(FingerprintError::Format(format!(
                    "{field}: expected \"{}\", found \"{found}\"",
                    FourCc(*want)
                )));
            }
        }
        Ok(())
    }

    /// Canonical header for `data_len` bytes of integer PCM.
    pub fn pcm(channels: u16, sample_rate: u32, bits_per_sample: u16, data_len: u32) -> Self {
        let block_align = channels.saturating_mul(bits_per_sample / 8);
        Self {
            chunk_id: FourCc(*b"RIFF"),
            chunk_size: data_len.saturating_add(36),
            format: FourCc(*b"WAVE"),
            sub_chunk1_id: FourCc(*b"fmt "),
            sub_chunk1_size: 16,
            audio_format: 1,
            channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bits_per_sample,
            sub_chunk2_id: FourCc(*b"data"),
            sub_chunk2_size: data_len,
        }
    }

    /// Serialize back into the 44-byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.chunk_id.0);
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.format.0);
        out[12..16].copy_from_slice(&self.sub_chunk1_id.0);
        out[16..20].copy_from_slice(&self.sub_chunk1_size.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(&self.sub_chunk2_id.0);
        out[40..44].copy_from_slice(&self.sub_chunk2_size.to_le_bytes());
        out
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Playback length of `data_len` bytes of sample data.
    pub fn duration_secs(&self, data_len: usize) -> f64 {
        let frame_bytes = self.bytes_per_sample() * self.channels.max(1) as usize;
        if frame_bytes == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        (data_len / frame_bytes) as f64 / self.sample_rate as f64
    }
}
