//! Collaborator traits
//!
//! The preparation pipeline never uploads, transcodes or geocodes anything
//! itself. Each of those steps is reached through one of the traits below so
//! the transforms stay pure orchestration and tests can swap in stubs.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use image::DynamicImage;
use shareprep_core::{
    FileUpload, LocationResolution, PeerId, PixelDimensions, UploadError, UploadEvent,
};

use crate::video::{VideoAdjustments, VideoPreset};

/// Upload progress followed by exactly one `Result` on success.
pub type UploadStream = BoxStream<'static, Result<UploadEvent, UploadError>>;

pub type LocationStream = BoxStream<'static, anyhow::Result<LocationResolution>>;

/// Upload subsystem
///
/// Dropping the returned stream must abort the upload.
pub trait Uploader: Send + Sync {
    /// Upload an already encoded photo.
    fn upload_image(&self, peer_id: PeerId, data: Bytes, dimensions: PixelDimensions)
        -> UploadStream;

    /// Upload a file or a local video resource with its attributes.
    fn upload_file(&self, peer_id: PeerId, file: FileUpload) -> UploadStream;
}

/// Result of a GIF to muted MP4 conversion.
#[derive(Debug, Clone)]
pub struct ConvertedGif {
    pub data: Bytes,
    /// Seconds.
    pub duration: f64,
}

#[async_trait]
pub trait GifConverter: Send + Sync {
    async fn convert(&self, data: Bytes) -> anyhow::Result<ConvertedGif>;
}

/// Video transcode subsystem, consulted for output geometry only. The actual
/// transcode happens inside the upload subsystem from the resource
/// adjustments.
pub trait VideoConverter: Send + Sync {
    fn dimensions(
        &self,
        original: PixelDimensions,
        adjustments: Option<&VideoAdjustments>,
        preset: VideoPreset,
    ) -> PixelDimensions;
}

#[async_trait]
pub trait WaveformExtractor: Send + Sync {
    /// Packed waveform for the audio file, or `None` when it cannot be read.
    async fn extract_waveform(&self, path: &Path) -> Option<Bytes>;
}

pub trait LocationResolver: Send + Sync {
    fn is_location_url(&self, url: &str) -> bool;

    /// Resolve a location link. The first item is the answer.
    fn resolve(&self, url: &str) -> LocationStream;
}

#[async_trait]
pub trait PdfThumbnailer: Send + Sync {
    /// Render the first page fitted into `bounds`.
    async fn render(&self, data: Bytes, bounds: PixelDimensions) -> Option<DynamicImage>;
}
