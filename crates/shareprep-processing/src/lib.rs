//! Shareprep Processing Library
//!
//! Per-item preparation: collaborator traits, codec helpers and the
//! transform for every kind of share payload.
//!
//! # Modules
//!
//! - `traits`: boundaries to the upload, transcode, waveform and location
//!   subsystems
//! - `image`, `video`, `gif`, `audio`, `document`: codec helpers and the
//!   default ffmpeg/pdftoppm-backed collaborators
//! - `contact`, `location`: vCard parsing and map-link resolution
//! - `registry`: payload shape to transform selection
//! - `transform`: the per-kind lifecycle streams

pub mod audio;
pub mod contact;
pub mod document;
pub mod gif;
pub mod image;
pub mod location;
pub mod process;
pub mod registry;
pub mod traits;
pub mod transform;
pub mod video;

pub use audio::FfmpegWaveformExtractor;
pub use contact::parse_vcard;
pub use document::{NoPdfPreview, PdftoppmThumbnailer};
pub use gif::{is_gif, FfmpegGifConverter};
pub use location::MapLinkResolver;
pub use registry::TransformRegistry;
pub use traits::{
    ConvertedGif, GifConverter, LocationResolver, LocationStream, PdfThumbnailer, UploadStream,
    Uploader, VideoConverter, WaveformExtractor,
};
pub use transform::{Collaborators, ItemStream, ItemTransform, TransformContext};
pub use video::{PresetVideoConverter, VideoAdjustments, VideoPreset};
