//! GIF detection and GIF to muted MP4 conversion.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use shareprep_core::constants::GIF_SIGNATURE;

use crate::process::{run_tool, validate_binary};
use crate::traits::{ConvertedGif, GifConverter};
use crate::video::probe_duration;

/// True when `data` opens with the GIF signature and has content past it.
pub fn is_gif(data: &[u8]) -> bool {
    data.len() > GIF_SIGNATURE.len() && data.starts_with(GIF_SIGNATURE)
}

/// Converts with ffmpeg to a silent H.264 MP4 with even dimensions and the
/// moov atom up front so it can stream.
pub struct FfmpegGifConverter {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegGifConverter {
    pub fn new(ffmpeg_path: String, ffprobe_path: String) -> Result<Self> {
        validate_binary(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        validate_binary(&ffprobe_path).context("Invalid ffprobe_path")?;
        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
        })
    }
}

#[async_trait]
impl GifConverter for FfmpegGifConverter {
    #[tracing::instrument(skip(self, data), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "gif_to_mp4",
        input_bytes = data.len()
    ))]
    async fn convert(&self, data: Bytes) -> Result<ConvertedGif> {
        // Temp files are removed on drop, including when the future is cancelled.
        let input = tempfile::Builder::new()
            .prefix("shareprep-")
            .suffix(".gif")
            .tempfile()?;
        tokio::fs::write(input.path(), &data).await?;

        let output = tempfile::Builder::new()
            .prefix("shareprep-")
            .suffix(".mp4")
            .tempfile()?;

        let input_path = input.path().to_string_lossy().to_string();
        let output_path = output.path().to_string_lossy().to_string();

        run_tool(
            &self.ffmpeg_path,
            [
                "-y",
                "-v",
                "error",
                "-i",
                input_path.as_str(),
                "-an",
                "-movflags",
                "+faststart",
                "-pix_fmt",
                "yuv420p",
                "-vf",
                "scale=trunc(iw/2)*2:trunc(ih/2)*2",
                "-c:v",
                "libx264",
                "-f",
                "mp4",
                output_path.as_str(),
            ],
        )
        .await
        .context("GIF conversion failed")?;

        let duration = probe_duration(&self.ffprobe_path, output.path()).await?;
        let converted = tokio::fs::read(output.path()).await?;

        tracing::debug!(
            output_bytes = converted.len(),
            duration = duration,
            "GIF converted to MP4"
        );

        Ok(ConvertedGif {
            data: Bytes::from(converted),
            duration,
        })
    }
}
