//! Shareprep CLI support: tracing setup, local file classification and the
//! local collaborators the `shareprep` binary runs the pipeline against.

pub mod local;

use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use shareprep_core::{AudioPayload, DataPayload, PipelineConfig, RawPayload, VideoPayload};
use shareprep_processing::video::{probe_duration, probe_video};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Audio,
    Contact,
    /// Anything else, sniffed by the pipeline.
    Data,
}

/// Classify a local file by extension.
pub fn classify(path: &Path) -> FileKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "mov" | "m4v" | "webm" | "mkv" => FileKind::Video,
        "ogg" | "oga" | "opus" | "mp3" | "m4a" | "wav" | "flac" => FileKind::Audio,
        "vcf" | "vcard" => FileKind::Contact,
        _ => FileKind::Data,
    }
}

/// MIME type for a data file, when the extension is a known one.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "zip" => "application/zip",
        "json" => "application/json",
        _ => return None,
    };
    Some(mime)
}

/// Build the payload for one local file.
///
/// Videos and audio are probed with ffprobe. A round video uses its own
/// frame size for the square crop.
pub async fn payload_for_file(
    path: &Path,
    round: bool,
    config: &PipelineConfig,
) -> anyhow::Result<RawPayload> {
    let payload = match classify(path) {
        FileKind::Video => {
            let source = probe_video(&config.ffprobe_path, path)
                .await
                .with_context(|| format!("Failed to probe video {}", path.display()))?;
            let frame = round.then(|| {
                (
                    source.dimensions.width as f64,
                    source.dimensions.height as f64,
                )
            });
            RawPayload::Video(VideoPayload {
                source,
                round_message: round,
                frame,
                trim: None,
            })
        }
        FileKind::Audio => {
            let duration = match probe_duration(&config.ffprobe_path, path).await {
                Ok(duration) => Some(duration),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Audio duration unavailable");
                    None
                }
            };
            RawPayload::Audio(AudioPayload {
                path: path.to_path_buf(),
                duration,
                is_voice: None,
                title: None,
                artist: None,
            })
        }
        FileKind::Contact => RawPayload::Contact(read(path).await?),
        FileKind::Data => RawPayload::Data(DataPayload {
            data: read(path).await?,
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            mime_type: mime_for(path).map(str::to_string),
        }),
    };

    tracing::debug!(path = %path.display(), payload.kind = payload.kind(), "Built payload");
    Ok(payload)
}

async fn read(path: &Path) -> anyhow::Result<Bytes> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Bytes::from(data))
}
