//! Raw share payloads.
//!
//! `PayloadFields` is the loosely-typed bag handed over by the share host;
//! `RawPayload` is the closed set of shapes the pipeline knows how to prepare.
//! Converting one into the other applies the fixed shape priority, so a bag
//! that carries both `text` and `url` is always prepared as text.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::PrepareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelDimensions {
    pub width: u32,
    pub height: u32,
}

impl PixelDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Scale down, preserving aspect ratio, until both edges fit inside
    /// `bounds`. Never scales up.
    pub fn fitted(self, bounds: PixelDimensions) -> PixelDimensions {
        let mut width = self.width as f64;
        let mut height = self.height as f64;

        if width > bounds.width as f64 {
            height = (height * bounds.width as f64 / width.max(1.0)).floor();
            width = bounds.width as f64;
        }
        if height > bounds.height as f64 {
            width = (width * bounds.height as f64 / height.max(1.0)).floor();
            height = bounds.height as f64;
        }

        PixelDimensions::new((width as u32).max(1), (height as u32).max(1))
    }
}

impl std::fmt::Display for PixelDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A video file on disk together with its probed geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub path: PathBuf,
    pub dimensions: PixelDimensions,
    /// Source duration in seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoPayload {
    pub source: VideoSource,
    /// Send as a round instant video.
    pub round_message: bool,
    /// Caller-supplied frame size used to derive the round crop.
    pub frame: Option<(f64, f64)>,
    pub trim: Option<TrimRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPayload {
    pub data: Bytes,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub path: PathBuf,
    pub duration: Option<f64>,
    pub is_voice: Option<bool>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Image bytes already resized by the host, with their pixel size.
    ScaledImage {
        data: Bytes,
        dimensions: PixelDimensions,
    },
    /// A decoded image object.
    Image(Arc<DynamicImage>),
    Video(VideoPayload),
    /// Opaque bytes: GIF, still image or generic file depending on content.
    Data(DataPayload),
    Audio(AudioPayload),
    Text(String),
    Url(String),
    /// vCard bytes.
    Contact(Bytes),
}

impl RawPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            RawPayload::ScaledImage { .. } => "scaled_image",
            RawPayload::Image(_) => "image",
            RawPayload::Video(_) => "video",
            RawPayload::Data(_) => "data",
            RawPayload::Audio(_) => "audio",
            RawPayload::Text(_) => "text",
            RawPayload::Url(_) => "url",
            RawPayload::Contact(_) => "contact",
        }
    }
}

/// Field bag as delivered by the share host. Binary fields travel as base64
/// in serialized form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadFields {
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub scaled_image_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaled_image_dimensions: Option<PixelDimensions>,
    #[serde(skip)]
    pub image: Option<Arc<DynamicImage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_round_message: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_voice: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub contact: Option<Bytes>,
}

impl TryFrom<PayloadFields> for RawPayload {
    type Error = PrepareError;

    fn try_from(fields: PayloadFields) -> Result<Self, Self::Error> {
        let PayloadFields {
            scaled_image_data,
            scaled_image_dimensions,
            image,
            video,
            is_round_message,
            width,
            height,
            trim_start,
            trim_end,
            data,
            file_name,
            mime_type,
            audio,
            duration,
            is_voice,
            title,
            artist,
            text,
            url,
            contact,
        } = fields;

        if let (Some(data), Some(dimensions)) = (scaled_image_data, scaled_image_dimensions) {
            return Ok(RawPayload::ScaledImage { data, dimensions });
        }

        if let Some(image) = image {
            return Ok(RawPayload::Image(image));
        }

        if let Some(source) = video {
            let frame = match (width, height) {
                (Some(w), Some(h)) => Some((w, h)),
                _ => None,
            };
            let trim = match (trim_start, trim_end) {
                (Some(start), Some(end)) => Some(TrimRange { start, end }),
                _ => None,
            };
            return Ok(RawPayload::Video(VideoPayload {
                source,
                round_message: is_round_message.unwrap_or(false),
                frame,
                trim,
            }));
        }

        if let Some(data) = data {
            return Ok(RawPayload::Data(DataPayload {
                data,
                file_name,
                mime_type,
            }));
        }

        if let Some(path) = audio {
            return Ok(RawPayload::Audio(AudioPayload {
                path,
                duration,
                is_voice,
                title,
                artist,
            }));
        }

        if let Some(text) = text {
            return Ok(RawPayload::Text(text));
        }

        if let Some(url) = url {
            return Ok(RawPayload::Url(url));
        }

        if let Some(vcard) = contact {
            return Ok(RawPayload::Contact(vcard));
        }

        Err(PrepareError::UnrecognizedPayload(
            "payload carries no supported field".to_string(),
        ))
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Bytes>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| {
                STANDARD
                    .decode(s.as_bytes())
                    .map(Bytes::from)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitted_scales_landscape_into_box() {
        let fitted = PixelDimensions::new(4000, 3000).fitted(PixelDimensions::new(1280, 1280));
        assert_eq!(fitted, PixelDimensions::new(1280, 960));
    }

    #[test]
    fn test_fitted_scales_portrait_into_box() {
        let fitted = PixelDimensions::new(3000, 4000).fitted(PixelDimensions::new(1280, 1280));
        assert_eq!(fitted, PixelDimensions::new(960, 1280));
    }

    #[test]
    fn test_fitted_never_upscales() {
        let small = PixelDimensions::new(800, 600);
        assert_eq!(small.fitted(PixelDimensions::new(1280, 1280)), small);
    }

    #[test]
    fn test_scaled_image_wins_over_text() {
        let fields = PayloadFields {
            scaled_image_data: Some(Bytes::from_static(b"jpeg")),
            scaled_image_dimensions: Some(PixelDimensions::new(10, 20)),
            text: Some("caption".to_string()),
            ..Default::default()
        };
        let payload = RawPayload::try_from(fields).unwrap();
        assert!(matches!(
            payload,
            RawPayload::ScaledImage { dimensions, .. } if dimensions == PixelDimensions::new(10, 20)
        ));
    }

    #[test]
    fn test_scaled_data_without_dimensions_falls_through() {
        let fields = PayloadFields {
            scaled_image_data: Some(Bytes::from_static(b"jpeg")),
            text: Some("caption".to_string()),
            ..Default::default()
        };
        let payload = RawPayload::try_from(fields).unwrap();
        assert!(matches!(payload, RawPayload::Text(ref t) if t == "caption"));
    }

    #[test]
    fn test_text_wins_over_url() {
        let fields = PayloadFields {
            text: Some("hello".to_string()),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(RawPayload::try_from(fields).unwrap().kind(), "text");
    }

    #[test]
    fn test_video_collects_round_frame_and_trim() {
        let fields = PayloadFields {
            video: Some(VideoSource {
                path: PathBuf::from("/tmp/clip.mp4"),
                dimensions: PixelDimensions::new(1920, 1080),
                duration: 12.0,
            }),
            is_round_message: Some(true),
            width: Some(1920.0),
            height: Some(1080.0),
            trim_start: Some(1.0),
            trim_end: Some(4.0),
            ..Default::default()
        };
        match RawPayload::try_from(fields).unwrap() {
            RawPayload::Video(video) => {
                assert!(video.round_message);
                assert_eq!(video.frame, Some((1920.0, 1080.0)));
                assert_eq!(video.trim, Some(TrimRange { start: 1.0, end: 4.0 }));
            }
            other => panic!("Expected Video variant, got {}", other.kind()),
        }
    }

    #[test]
    fn test_empty_fields_are_unrecognized() {
        let err = RawPayload::try_from(PayloadFields::default()).unwrap_err();
        assert!(matches!(err, PrepareError::UnrecognizedPayload(_)));
    }

    #[test]
    fn test_fields_deserialize_from_host_json() {
        let json = r#"{"data":"R0lGODlh","fileName":"cat.gif","mimeType":"image/gif"}"#;
        let fields: PayloadFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.data.as_deref(), Some(&b"GIF89a"[..]));
        assert_eq!(fields.file_name.as_deref(), Some("cat.gif"));

        let payload = RawPayload::try_from(fields).unwrap();
        assert_eq!(payload.kind(), "data");
    }
}
