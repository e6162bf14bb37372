use std::f64::consts::PI;
use std::path::Path;

use landprint::digest;
use landprint::{FingerprintConfig, Fingerprinter, PcmContainer, WavConverter};

const SAMPLE_RATE: u32 = 44_100;
const TONE_BIN: usize = 93;

fn tone_frequency() -> f64 {
    TONE_BIN as f64 * SAMPLE_RATE as f64 / 4096.0
}

fn write_tone(path: &Path, samples: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let freq = tone_frequency();
    for n in 0..samples {
        let v = 20_000.0 * (2.0 * PI * freq * n as f64 / SAMPLE_RATE as f64).sin();
        writer.write_sample(v as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_two_second_tone() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input, 2 * SAMPLE_RATE as usize);

    let fingerprinter = Fingerprinter::new(
        Box::new(WavConverter),
        dir.path().join("wavs"),
        FingerprintConfig::default(),
    );
    let result = fingerprinter.fingerprint_file(&input).unwrap();

    assert_eq!(result.header.sample_rate, 44_100);
    assert_eq!(result.header.bits_per_sample, 16);
    assert_eq!(result.header.channels, 1);
    assert!((result.duration_secs - 2.0).abs() < 1e-9);
    assert!(result.frames > 0);

    let fingerprint = &result.fingerprint;
    assert!(
        fingerprint
            .peaks
            .iter()
            .any(|p| p.freq.abs_diff(TONE_BIN) <= 1),
        "no peak near bin {TONE_BIN}"
    );

    assert!(!fingerprint.landmarks.is_empty());
    for landmark in &fingerprint.landmarks {
        let input = format!(
            "{}|{}|{}",
            landmark.anchor.freq, landmark.target.freq, landmark.delta
        );
        assert_eq!(
            landmark.hash_hex(),
            digest::to_hex(&digest::digest(input.as_bytes()))
        );
        assert_eq!(landmark.delta, landmark.target.time - landmark.anchor.time);
        assert!(landmark.delta <= 200);
    }
}

#[test]
fn test_spectrogram_of_tone() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input, 2 * SAMPLE_RATE as usize);

    let container = PcmContainer::open(&input, FingerprintConfig::default()).unwrap();
    let spectrogram = container.spectrogram().unwrap();
    assert!(!spectrogram.is_empty());
    assert_eq!(spectrogram.bins(), 1024);

    let mut max = 0.0f64;
    for row in spectrogram.data() {
        assert_eq!(row.len(), 1024);
        for &v in row {
            assert!((0.0..=1.0).contains(&v));
            max = max.max(v);
        }
    }
    assert_eq!(max, 1.0);
    assert!((spectrogram.bin_frequency_hz(TONE_BIN) - tone_frequency()).abs() < 1e-9);
}

#[test]
fn test_short_input_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blip.wav");
    write_tone(&input, 4095);

    let fingerprinter = Fingerprinter::new(
        Box::new(WavConverter),
        dir.path().join("wavs"),
        FingerprintConfig::default(),
    );
    let result = fingerprinter.fingerprint_file(&input).unwrap();
    assert_eq!(result.frames, 0);
    assert!(result.fingerprint.peaks.is_empty());
    assert!(result.fingerprint.landmarks.is_empty());
}

#[test]
fn test_fingerprints_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input, SAMPLE_RATE as usize);
    let bytes = std::fs::read(&input).unwrap();

    let first = PcmContainer::parse(&bytes).unwrap();
    let second = PcmContainer::parse(&bytes).unwrap();
    assert_eq!(first.spectrogram().unwrap(), second.spectrogram().unwrap());
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());

    let json_a = serde_json::to_string(first.fingerprint().unwrap()).unwrap();
    let json_b = serde_json::to_string(second.fingerprint().unwrap()).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn test_parallel_files_match_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = (0..3)
        .map(|i| {
            let path = dir.path().join(format!("tone{i}.wav"));
            write_tone(&path, SAMPLE_RATE as usize / 2 + i * 5000);
            path
        })
        .collect();

    let fingerprinter = Fingerprinter::new(
        Box::new(WavConverter),
        dir.path().join("wavs"),
        FingerprintConfig::default(),
    );
    let sequential: Vec<_> = paths
        .iter()
        .map(|p| fingerprinter.fingerprint_file(p).unwrap().fingerprint)
        .collect();

    let fingerprinter = &fingerprinter;
    let parallel: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = paths
            .iter()
            .map(|p| s.spawn(move || fingerprinter.fingerprint_file(p).unwrap().fingerprint))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sequential, parallel);
}
