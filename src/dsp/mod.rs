pub mod fft;
pub mod landmarks;
pub mod peaks;
pub mod spectrogram;
