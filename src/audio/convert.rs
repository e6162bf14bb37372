//! Conversion of arbitrary input audio into the canonical container.
//!
//! The pipeline only depends on the [`Converter`] trait. `FfmpegConverter`
//! shells out to an external decoder; `WavConverter` handles WAV inputs
//! in-process and needs nothing installed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{FingerprintError, Result};

/// Sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Turns an input audio file into a 16-bit mono PCM container at `output`.
pub trait Converter: Send + Sync {
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;

    fn name(&self) -> &str;
}

/// Runs `ffmpeg` (or a compatible binary) as a child process.
#[derive(Clone, Debug)]
pub struct FfmpegConverter {
    program: PathBuf,
    sample_rate: u32,
}

impl FfmpegConverter {
    pub fn new(program: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            program: program.into(),
            sample_rate,
        }
    }

    /// Program from `FFMPEG_PATH`, falling back to `ffmpeg` on the `PATH`.
    pub fn from_env(sample_rate: u32) -> Self {
        let program = std::env::var_os("FFMPEG_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        Self::new(program, sample_rate)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-nostdin", "-y", "-i"].into_iter().map(OsString::from).collect();
        args.push(input.as_os_str().to_owned());
        for arg in ["-vn", "-ac", "1", "-ar"] {
            args.push(arg.into());
        }
        args.push(self.sample_rate.to_string().into());
        for arg in ["-acodec", "pcm_s16le", "-map_metadata", "-1", "-fflags", "+bitexact"] {
            args.push(arg.into());
        }
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Converter for FfmpegConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        log::debug!("Running {} on {}", self.program.display(), input.display());

        let result = Command::new(&self.program)
            .args(self.args(input, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                FingerprintError::Conversion(format!(
                    "failed to launch {}: {e}",
                    self.program.display()
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(FingerprintError::Conversion(format!(
                "{} exited with {} on {}: {}",
                self.program.display(),
                result.status,
                input.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// In-process WAV to canonical-container conversion.
///
/// Channels are averaged and samples rescaled to 16 bits. The source sample
/// rate is kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavConverter;

fn hound_err(path: &Path, e: hound::Error) -> FingerprintError {
    FingerprintError::Conversion(format!("{}: {e}", path.display()))
}

/// Read any integer or float WAV as interleaved f64 samples in `[-1, 1]`.
fn read_normalized(path: &Path) -> Result<(WavSpec, Vec<f64>)> {
    let reader = WavReader::open(path).map_err(|e| hound_err(path, e))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<_>, _>>(),
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
    }
    .map_err(|e| hound_err(path, e))?;

    Ok((spec, samples))
}

impl Converter for WavConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let (spec, samples) = read_normalized(input)?;
        let channels = spec.channels.max(1) as usize;

        let out_spec = WavSpec {
            channels: 1,
            sample_rate: spec.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(output, out_spec).map_err(|e| hound_err(output, e))?;

        for frame in samples.chunks_exact(channels) {
            let mono = frame.iter().sum::<f64>() / channels as f64;
            let value = (mono * 32768.0).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
            writer.write_sample(value).map_err(|e| hound_err(output, e))?;
        }
        writer.finalize().map_err(|e| hound_err(output, e))?;

        log::debug!(
            "Converted {} ({} ch, {} bit, {} Hz) to 16-bit mono",
            input.display(),
            spec.channels,
            spec.bits_per_sample,
            spec.sample_rate
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "wav"
    }
}

/// Run `converter` unless `output` already exists.
///
/// Each call converts into its own temporary file beside `output` and moves
/// it into place, so an interrupted conversion never leaves a container that
/// later runs would reuse, and concurrent calls for the same output do not
/// collide. Returns whether a conversion actually ran.
pub fn ensure_converted(converter: &dyn Converter, input: &Path, output: &Path) -> Result<bool> {
    if output.exists() {
        log::debug!("Reusing converted container {}", output.display());
        return Ok(false);
    }
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    // Removed on drop unless persisted
    let partial = tempfile::Builder::new()
        .prefix(".convert-")
        .suffix(".wav")
        .tempfile_in(parent)?
        .into_temp_path();
    converter.convert(input, &partial)?;

    if let Err(e) = partial.persist(output) {
        if !output.exists() {
            return Err(FingerprintError::Io(e.error));
        }
        log::debug!(
            "{} was written by a concurrent conversion",
            output.display()
        );
    }

    log::info!(
        "Converted {} -> {} ({})",
        input.display(),
        output.display(),
        converter.name()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::container::PcmContainer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConverter {
        calls: AtomicUsize,
    }

    impl Converter for CountingConverter {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::fs::copy(input, output)?;
            Ok(())
        }

        fn name(&self) -> &str {
            "copy"
        }
    }

    struct SlowCopyConverter;

    impl Converter for SlowCopyConverter {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            std::thread::sleep(std::time::Duration::from_millis(50));
            std::fs::copy(input, output)?;
            Ok(())
        }

        fn name(&self) -> &str {
            "slow-copy"
        }
    }

    struct FailingConverter;

    impl Converter for FailingConverter {
        fn convert(&self, _input: &Path, output: &Path) -> Result<()> {
            std::fs::write(output, b"half")?;
            Err(FingerprintError::Conversion("decoder crashed".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn write_wav(path: &Path, spec: WavSpec, samples: &[i32]) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_ffmpeg_args() {
        let converter = FfmpegConverter::new("/opt/ffmpeg", 22_050);
        let args: Vec<String> = converter
            .args(Path::new("in.mp3"), Path::new("out.wav"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-nostdin", "-y", "-i", "in.mp3", "-vn", "-ac", "1", "-ar", "22050", "-acodec",
                "pcm_s16le", "-map_metadata", "-1", "-fflags", "+bitexact", "out.wav"
            ]
        );
        assert_eq!(converter.program(), Path::new("/opt/ffmpeg"));
    }

    #[test]
    fn test_ffmpeg_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let converter = FfmpegConverter::new(dir.path().join("no-such-ffmpeg"), DEFAULT_SAMPLE_RATE);
        let err = converter
            .convert(&dir.path().join("in.mp3"), &dir.path().join("out.wav"))
            .unwrap_err();
        assert!(matches!(err, FingerprintError::Conversion(_)));
    }

    #[test]
    fn test_wav_converter_downmixes_stereo_24_bit() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("stereo.wav");
        let output = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        // Left/right pairs; 24-bit full scale is 1 << 23
        write_wav(&input, spec, &[1 << 22, 1 << 22, 1 << 22, -(1 << 22), -(1 << 23), -(1 << 23)]);

        WavConverter.convert(&input, &output).unwrap();

        let container = PcmContainer::open(&output, Default::default()).unwrap();
        assert_eq!(container.header().channels, 1);
        assert_eq!(container.header().bits_per_sample, 16);
        assert_eq!(container.header().sample_rate, 48_000);
        assert_eq!(container.amplitudes(), &[16_384, 0, -32_768]);
    }

    #[test]
    fn test_wav_converter_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.mp3");
        std::fs::write(&input, b"ID3 not a wave file at all").unwrap();
        assert!(matches!(
            WavConverter.convert(&input, &dir.path().join("out.wav")),
            Err(FingerprintError::Conversion(_))
        ));
    }

    #[test]
    fn test_ensure_converted_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"payload").unwrap();
        let output = dir.path().join("cache").join("abc.wav");

        let converter = CountingConverter {
            calls: AtomicUsize::new(0),
        };
        assert!(ensure_converted(&converter, &input, &output).unwrap());
        assert!(!ensure_converted(&converter, &input, &output).unwrap());
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&output).unwrap(), b"payload");
    }

    #[test]
    fn test_failed_conversion_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"payload").unwrap();
        let output = dir.path().join("abc.wav");

        let err = ensure_converted(&FailingConverter, &input, &output).unwrap_err();
        assert!(matches!(err, FingerprintError::Conversion(_)));
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_conversions_of_same_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"payload").unwrap();
        let cache = dir.path().join("cache");
        let output = cache.join("abc.wav");

        let results: Vec<Result<bool>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| s.spawn(|| ensure_converted(&SlowCopyConverter, &input, &output)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in &results {
            assert!(result.is_ok(), "{result:?}");
        }
        assert_eq!(std::fs::read(&output).unwrap(), b"payload");
        // No temporary files left beside the container
        assert_eq!(std::fs::read_dir(&cache).unwrap().count(), 1);
    }
}
