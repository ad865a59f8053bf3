pub mod waveform;

pub use waveform::{bucket_peaks, pack_5bit, FfmpegWaveformExtractor};
