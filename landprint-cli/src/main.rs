use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use landprint::audio::convert::DEFAULT_SAMPLE_RATE;
use landprint::{
    Converter, FfmpegConverter, FileFingerprint, FingerprintConfig, Fingerprinter, WavConverter,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConverterKind {
    /// Decode anything ffmpeg understands
    Ffmpeg,
    /// WAV inputs only, no external tools
    Wav,
}

#[derive(Parser)]
#[command(name = "landprint", about = "Compute landmark fingerprints of audio files")]
struct Cli {
    /// Audio files to fingerprint
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for converted containers, named by content digest
    #[arg(long, default_value = "temp/wavs")]
    cache_dir: PathBuf,

    #[arg(long, value_enum, default_value = "ffmpeg")]
    converter: ConverterKind,

    /// ffmpeg binary (overrides FFMPEG_PATH)
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Sample rate ffmpeg converts to
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// JSON file with fingerprint parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Peaks paired with each anchor (overrides config)
    #[arg(long)]
    fan_value: Option<usize>,

    /// Peak search half-width in cells (overrides config)
    #[arg(long)]
    neighborhood: Option<usize>,

    /// Largest frame distance between paired peaks (overrides config)
    #[arg(long)]
    max_delta: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Also list peaks in text output
    #[arg(long)]
    peaks: bool,
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn load_config(cli: &Cli) -> landprint::Result<FingerprintConfig> {
    let mut config = match &cli.config {
        Some(path) => FingerprintConfig::from_json_file(path)?,
        None => FingerprintConfig::default(),
    };
    if let Some(fan_value) = cli.fan_value {
        config.fan_value = fan_value;
    }
    if let Some(neighborhood) = cli.neighborhood {
        config.peak_neighborhood = neighborhood;
    }
    if let Some(max_delta) = cli.max_delta {
        config.max_delta = max_delta;
    }
    config.validate()?;
    Ok(config)
}

fn build_converter(cli: &Cli) -> Box<dyn Converter> {
    match cli.converter {
        ConverterKind::Wav => Box::new(WavConverter),
        ConverterKind::Ffmpeg => match &cli.ffmpeg {
            Some(program) => Box::new(FfmpegConverter::new(program, cli.sample_rate)),
            None => Box::new(FfmpegConverter::from_env(cli.sample_rate)),
        },
    }
}

fn print_text(result: &FileFingerprint, with_peaks: bool) {
    println!(
        "{} [{}] {:.2}s, {} frames, {} peaks, {} landmarks",
        result.input.display(),
        result.content_digest,
        result.duration_secs,
        result.frames,
        result.fingerprint.peaks.len(),
        result.fingerprint.landmarks.len()
    );
    if with_peaks {
        for peak in &result.fingerprint.peaks {
            println!("  peak t={} f={}", peak.time, peak.freq);
        }
    }
    for landmark in &result.fingerprint.landmarks {
        println!(
            "  {} t={} f1={} f2={} dt={}",
            landmark.hash_hex(),
            landmark.anchor.time,
            landmark.anchor.freq,
            landmark.target.freq,
            landmark.delta
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let fingerprinter = Arc::new(Fingerprinter::new(build_converter(&cli), &cli.cache_dir, config));

    // Inputs are independent; each runs on the blocking pool
    let handles: Vec<_> = cli
        .files
        .iter()
        .cloned()
        .map(|path| {
            let fingerprinter = Arc::clone(&fingerprinter);
            tokio::task::spawn_blocking(move || fingerprinter.fingerprint_file(&path))
        })
        .collect();

    let mut results = Vec::new();
    let mut failed = 0usize;
    for (path, handle) in cli.files.iter().zip(handles) {
        match handle.await {
            Ok(Ok(result)) => results.push(result),
            Ok(Err(e)) => {
                log::error!("{}: {e}", path.display());
                failed += 1;
            }
            Err(e) => {
                log::error!("{}: task failed: {e}", path.display());
                failed += 1;
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log::error!("Failed to serialize results: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for result in &results {
            print_text(result, cli.peaks);
        }
    }

    if failed > 0 {
        log::warn!("{failed} of {} files failed", cli.files.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
