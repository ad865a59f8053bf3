pub mod content;
pub mod message;
pub mod payload;
pub mod upload;

pub use content::{
    BatchState, ContactData, ContactPhone, ItemEvent, LocationResolution, MapMedia, MapVenue,
    MediaReference, Place, PreparedContent, StandaloneMedia, UnpreparedContent,
    UploadedMediaHandle,
};
pub use message::{MessageId, MessageState, OutgoingMessage, PeerId};
pub use payload::{
    AudioPayload, DataPayload, PayloadFields, PixelDimensions, RawPayload, TrimRange,
    VideoPayload, VideoSource,
};
pub use upload::{
    FileAttribute, FileSource, FileUpload, LocalVideoResource, UploadEvent, VideoFlags,
    VideoResourceAdjustments,
};
