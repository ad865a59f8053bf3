//! Requests handed to the upload subsystem and the events it reports back.

use std::path::PathBuf;

use bytes::Bytes;
use uuid::Uuid;

use super::content::UploadedMediaHandle;
use super::payload::PixelDimensions;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Fraction in [0, 1].
    Progress(f32),
    Result(UploadedMediaHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoFlags {
    pub supports_streaming: bool,
    pub instant_round: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileAttribute {
    Video {
        /// Whole seconds.
        duration: u32,
        size: PixelDimensions,
        flags: VideoFlags,
    },
    Animated,
    FileName(String),
    ImageSize(PixelDimensions),
    Audio {
        is_voice: bool,
        duration: u32,
        title: Option<String>,
        performer: Option<String>,
        /// 5-bit packed amplitude samples.
        waveform: Option<Bytes>,
    },
}

/// Serialized transcoding instructions plus a digest of them, so identical
/// adjustments resolve to the same cached resource.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoResourceAdjustments {
    pub data: Bytes,
    pub digest: Bytes,
}

/// A local video the upload subsystem transcodes itself.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVideoResource {
    pub random_id: Uuid,
    pub path: PathBuf,
    pub adjustments: Option<VideoResourceAdjustments>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Data(Bytes),
    Resource(LocalVideoResource),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub source: FileSource,
    pub thumbnail: Option<Bytes>,
    pub mime_type: String,
    pub attributes: Vec<FileAttribute>,
    pub hint_file_is_large: bool,
}

impl FileUpload {
    pub fn file_name(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            FileAttribute::FileName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn is_animated(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, FileAttribute::Animated))
    }
}
