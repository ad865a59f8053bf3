//! Fixed values of the share preparation wire contract.

/// Leading bytes of every GIF87a/GIF89a stream.
pub const GIF_SIGNATURE: &[u8; 4] = b"GIF8";

pub const MIME_VIDEO_MP4: &str = "video/mp4";
pub const MIME_ANIMATED_GIF: &str = "animation/gif";
pub const MIME_AUDIO_OGG: &str = "audio/ogg";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

pub const DEFAULT_FILE_NAME: &str = "file";
pub const CONVERTED_GIF_FILE_NAME: &str = "animation.mp4";
pub const FALLBACK_GIF_FILE_NAME: &str = "animation.gif";

/// Number of amplitude buckets in an audio waveform.
pub const WAVEFORM_BUCKETS: usize = 100;

/// Peak value of a single 5-bit waveform sample.
pub const WAVEFORM_MAX_SAMPLE: u8 = 31;
