use serde::Serialize;

use crate::digest;

/// A local maximum of the spectrogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Peak {
    pub time: usize, // frame index
    pub freq: usize, // frequency bin index
}

impl Peak {
    pub fn new(time: usize, freq: usize) -> Self {
        Self { time, freq }
    }
}

/// Two peaks hashed together with their time separation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Landmark {
    pub anchor: Peak,
    pub target: Peak,
    /// `target.time - anchor.time`, in frames.
    pub delta: usize,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub digest: [u8; digest::DIGEST_LEN],
}

impl Landmark {
    /// Pair two peaks. The caller guarantees `target.time >= anchor.time`.
    pub fn new(anchor: Peak, target: Peak) -> Self {
        let delta = target.time - anchor.time;
        let digest = digest::digest(Self::digest_input(anchor.freq, target.freq, delta).as_bytes());
        Self {
            anchor,
            target,
            delta,
            digest,
        }
    }

    /// Exact string fed to the digest: `"<freq1>|<freq2>|<delta>"`.
    pub fn digest_input(anchor_freq: usize, target_freq: usize, delta: usize) -> String {
        format!("{anchor_freq}|{target_freq}|{delta}")
    }

    pub fn hash_hex(&self) -> String {
        digest::to_hex(&self.digest)
    }
}

/// Peaks and landmarks of one container.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Fingerprint {
    pub peaks: Vec<Peak>,
    pub landmarks: Vec<Landmark>,
}

impl Fingerprint {
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}
