//! Error types module
//!
//! `PrepareError` is the single error surfaced to callers of the preparation
//! pipeline. Collaborator boundaries (upload subsystem, messaging store) have
//! their own error enums that convert into it.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like a cancelled batch
    Debug,
    /// Warning level - for recoverable issues like a failed upload
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Errors reported by the upload subsystem.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors reported by the messaging store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Peer not found: {0}")]
    PeerNotFound(i64),

    #[error("Enqueue failed: {0}")]
    EnqueueFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("Unrecognized payload: {0}")]
    UnrecognizedPayload(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Image encoding failed: {0}")]
    ImageEncoding(String),

    #[error("Item {index} failed: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: Box<PrepareError>,
    },

    #[error("Item {index} ended without a result")]
    ItemStalled { index: usize },

    #[error("Payload source {index} failed: {message}")]
    SourceFailed { index: usize, message: String },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Preparation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<UploadError> for PrepareError {
    fn from(err: UploadError) -> Self {
        PrepareError::UploadFailed(err.to_string())
    }
}

impl From<StoreError> for PrepareError {
    fn from(err: StoreError) -> Self {
        PrepareError::Delivery(err.to_string())
    }
}

impl PrepareError {
    /// Wrap an item-level error with the index of the item that produced it.
    pub fn item(index: usize, source: PrepareError) -> Self {
        PrepareError::ItemFailed {
            index,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `ItemFailed` wrappers.
    pub fn root_cause(&self) -> &PrepareError {
        match self {
            PrepareError::ItemFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    pub fn error_code(&self) -> &'static str {
        match self {
            PrepareError::UnrecognizedPayload(_) => "UNRECOGNIZED_PAYLOAD",
            PrepareError::TranscodeFailed(_) => "TRANSCODE_FAILED",
            PrepareError::UploadFailed(_) => "UPLOAD_FAILED",
            PrepareError::ImageEncoding(_) => "IMAGE_ENCODING_FAILED",
            PrepareError::ItemFailed { source, .. } => source.error_code(),
            PrepareError::ItemStalled { .. } => "ITEM_STALLED",
            PrepareError::SourceFailed { .. } => "SOURCE_FAILED",
            PrepareError::Delivery(_) => "DELIVERY_FAILED",
            PrepareError::Cancelled => "CANCELLED",
            PrepareError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether retrying the whole batch may succeed. Drives the
    /// retry-or-cancel prompt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PrepareError::UnrecognizedPayload(_) | PrepareError::ImageEncoding(_) => false,
            PrepareError::ItemFailed { source, .. } => source.is_recoverable(),
            PrepareError::TranscodeFailed(_)
            | PrepareError::UploadFailed(_)
            | PrepareError::ItemStalled { .. }
            | PrepareError::SourceFailed { .. }
            | PrepareError::Delivery(_)
            | PrepareError::Cancelled
            | PrepareError::Io(_) => true,
        }
    }

    /// Log level for this error
    pub fn log_level(&self) -> LogLevel {
        match self {
            PrepareError::Cancelled => LogLevel::Debug,
            PrepareError::ItemFailed { source, .. } => source.log_level(),
            PrepareError::UploadFailed(_) | PrepareError::Delivery(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
