use std::ffi::OsStr;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use shareprep_core::{PixelDimensions, VideoSource};

use crate::process::run_tool;

/// Read geometry and duration of the first video stream with ffprobe.
#[tracing::instrument(skip(ffprobe_path), fields(
    process.executable.name = "ffprobe",
    ffmpeg.operation = "probe"
))]
pub async fn probe_video(ffprobe_path: &str, path: &Path) -> Result<VideoSource> {
    let start = std::time::Instant::now();

    let output = run_tool(
        ffprobe_path,
        ffprobe_args(
            &["-show_format", "-show_streams", "-select_streams", "v:0"],
            path,
        ),
    )
    .await?;

    let (dimensions, duration) = parse_probe_output(&output.stdout)?;

    tracing::info!(
        duration_ms = start.elapsed().as_millis(),
        video_duration = duration,
        width = dimensions.width,
        height = dimensions.height,
        "Video probe completed"
    );

    Ok(VideoSource {
        path: path.to_path_buf(),
        dimensions,
        duration,
    })
}

/// Duration in seconds of any media file ffprobe understands.
pub async fn probe_duration(ffprobe_path: &str, path: &Path) -> Result<f64> {
    let output = run_tool(ffprobe_path, ffprobe_args(&["-show_format"], path)).await?;

    let probe: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;
    parse_duration(&probe["format"])
}

fn ffprobe_args<'a>(extra: &[&'a str], path: &'a Path) -> Vec<&'a OsStr> {
    let mut args: Vec<&OsStr> = ["-v", "quiet", "-print_format", "json"]
        .into_iter()
        .chain(extra.iter().copied())
        .map(OsStr::new)
        .collect();
    args.push(path.as_os_str());
    args
}

fn parse_duration(format: &serde_json::Value) -> Result<f64> {
    format["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("Could not parse duration"))
}

pub(crate) fn parse_probe_output(stdout: &[u8]) -> Result<(PixelDimensions, f64)> {
    let probe: serde_json::Value =
        serde_json::from_slice(stdout).context("Failed to parse ffprobe output")?;

    let stream = probe["streams"]
        .get(0)
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse width"))? as u32;
    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse height"))? as u32;

    let duration = parse_duration(&probe["format"])?;

    Ok((PixelDimensions::new(width, height), duration))
}
