//! SHA-1 digests for landmark hashing and content addressing.
//!
//! Each call builds its own hasher, so digests can be computed from any
//! number of threads without coordination.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::error::{FingerprintError, Result};

pub const DIGEST_LEN: usize = 20;

pub fn digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Sha1::digest(bytes));
    out
}

/// Lowercase hex, two characters per byte, high nibble first.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Digest everything `reader` yields, in 64 KiB chunks.
pub fn digest_reader<R: Read>(mut reader: R) -> Result<[u8; DIGEST_LEN]> {
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hasher.finalize());
    Ok(out)
}

/// Hex digest of a file's raw bytes, used to name its converted container.
pub fn file_digest(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FingerprintError::NotFound(path.to_path_buf()),
        _ => FingerprintError::Io(e),
    })?;
    Ok(to_hex(&digest_reader(file)?))
}
