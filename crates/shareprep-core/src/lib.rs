//! Shareprep Core Library
//!
//! Domain models, error types and configuration shared by the share-item
//! preparation pipeline crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{LogLevel, PrepareError, StoreError, UploadError};
pub use models::{
    BatchState, ContactData, ContactPhone, DataPayload, AudioPayload, FileAttribute, FileSource,
    FileUpload, ItemEvent, LocalVideoResource, LocationResolution, MapMedia, MapVenue,
    MediaReference, MessageId, MessageState, OutgoingMessage, PayloadFields, PeerId,
    PixelDimensions, Place, PreparedContent, RawPayload, StandaloneMedia, TrimRange,
    UnpreparedContent, UploadEvent, UploadedMediaHandle, VideoFlags, VideoPayload,
    VideoResourceAdjustments, VideoSource,
};
