//! Audio waveform extraction.
//!
//! The messaging waveform is `WAVEFORM_BUCKETS` peak amplitudes, each scaled
//! to 0..=31 and bit-packed five bits at a time, least significant bit first.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use shareprep_core::constants::{WAVEFORM_BUCKETS, WAVEFORM_MAX_SAMPLE};

use crate::process::{run_tool, validate_binary};
use crate::traits::WaveformExtractor;

const SAMPLE_RATE: &str = "8000";

/// Decodes with ffmpeg to mono 16-bit PCM and reduces it to packed peaks.
pub struct FfmpegWaveformExtractor {
    ffmpeg_path: String,
}

impl FfmpegWaveformExtractor {
    pub fn new(ffmpeg_path: String) -> Result<Self> {
        validate_binary(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        Ok(Self { ffmpeg_path })
    }

    async fn decode_pcm(&self, path: &Path) -> Result<Vec<i16>> {
        let input = path.to_string_lossy().to_string();
        let output = run_tool(
            &self.ffmpeg_path,
            [
                "-v",
                "error",
                "-i",
                input.as_str(),
                "-ac",
                "1",
                "-ar",
                SAMPLE_RATE,
                "-f",
                "s16le",
                "-",
            ],
        )
        .await?;

        Ok(output
            .stdout
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }
}

#[async_trait]
impl WaveformExtractor for FfmpegWaveformExtractor {
    async fn extract_waveform(&self, path: &Path) -> Option<Bytes> {
        let samples = match self.decode_pcm(path).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Waveform extraction failed");
                return None;
            }
        };

        if samples.is_empty() {
            return None;
        }

        Some(pack_5bit(&bucket_peaks(&samples, WAVEFORM_BUCKETS)))
    }
}

/// Peak absolute amplitude per bucket, normalised so the loudest bucket is
/// `WAVEFORM_MAX_SAMPLE`.
pub fn bucket_peaks(samples: &[i16], buckets: usize) -> Vec<u8> {
    if samples.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let peaks: Vec<u16> = (0..buckets)
        .map(|bucket| {
            let start = bucket * samples.len() / buckets;
            let end = (bucket + 1) * samples.len() / buckets;
            samples[start..end]
                .iter()
                .map(|s| s.unsigned_abs())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let loudest = peaks.iter().copied().max().unwrap_or(0) as u32;
    if loudest == 0 {
        return vec![0; buckets];
    }

    peaks
        .into_iter()
        .map(|peak| (peak as u32 * WAVEFORM_MAX_SAMPLE as u32 / loudest) as u8)
        .collect()
}

pub fn pack_5bit(samples: &[u8]) -> Bytes {
    let mut packed = vec![0u8; (samples.len() * 5 + 7) / 8];
    for (i, &sample) in samples.iter().enumerate() {
        let bit = i * 5;
        let byte = bit / 8;
        let value = (sample.min(WAVEFORM_MAX_SAMPLE) as u16) << (bit % 8);
        packed[byte] |= (value & 0xFF) as u8;
        if byte + 1 < packed.len() {
            packed[byte + 1] |= (value >> 8) as u8;
        }
    }
    Bytes::from(packed)
}
