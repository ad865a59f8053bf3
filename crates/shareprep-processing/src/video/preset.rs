use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shareprep_core::{PixelDimensions, TrimRange, VideoPayload, VideoResourceAdjustments};

use crate::traits::VideoConverter;

/// Inset applied on every side when a square frame is cropped for a round
/// message.
const ROUND_SQUARE_INSET: f64 = 13.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoPreset {
    CompressedLow,
    CompressedMedium,
    CompressedHigh,
    VideoMessage,
}

impl VideoPreset {
    /// Longest output edge for this preset.
    pub fn max_dimension(self) -> u32 {
        match self {
            VideoPreset::CompressedLow => 640,
            VideoPreset::CompressedMedium => 848,
            VideoPreset::CompressedHigh => 1280,
            VideoPreset::VideoMessage => 240,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn inset(self, by: f64) -> Self {
        Self {
            x: self.x + by,
            y: self.y + by,
            width: (self.width - by * 2.0).max(0.0),
            height: (self.height - by * 2.0).max(0.0),
        }
    }

    /// Square of the shorter side, centred in a `width` x `height` frame.
    pub fn centered_square(width: f64, height: f64) -> Self {
        let side = width.min(height);
        Self {
            x: (width - side) / 2.0,
            y: (height - side) / 2.0,
            width: side,
            height: side,
        }
    }
}

/// Edit instructions the upload subsystem applies when it transcodes a local
/// video resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAdjustments {
    pub original_width: f64,
    pub original_height: f64,
    pub crop_rect: CropRect,
    /// 0.0 when the aspect ratio is free.
    pub crop_locked_aspect_ratio: f64,
    pub crop_mirrored: bool,
    pub trim_start: f64,
    pub trim_end: f64,
    pub send_as_gif: bool,
    pub preset: VideoPreset,
}

impl VideoAdjustments {
    /// Square crop for a round instant video shot in a `width` x `height` frame.
    pub fn round_message(width: f64, height: f64) -> Self {
        let crop_rect = if (width - height).abs() < f64::EPSILON {
            CropRect::full(width, height).inset(ROUND_SQUARE_INSET)
        } else {
            CropRect::centered_square(width, height)
        };

        Self {
            original_width: width,
            original_height: height,
            crop_rect,
            crop_locked_aspect_ratio: 1.0,
            crop_mirrored: false,
            trim_start: 0.0,
            trim_end: 0.0,
            send_as_gif: false,
            preset: VideoPreset::VideoMessage,
        }
    }

    /// Adjustments for a shared video, or `None` when it is sent as recorded.
    ///
    /// Round framing needs the caller's frame size; without it the video is
    /// sent without a crop even if a round message was requested.
    pub fn for_payload(video: &VideoPayload) -> Option<Self> {
        let round_frame = if video.round_message { video.frame } else { None };

        let mut adjustments = match (round_frame, video.trim) {
            (None, None) => return None,
            (Some((width, height)), _) => Self::round_message(width, height),
            (None, Some(_)) => {
                let width = video.source.dimensions.width as f64;
                let height = video.source.dimensions.height as f64;
                Self {
                    original_width: width,
                    original_height: height,
                    crop_rect: CropRect::full(width, height),
                    crop_locked_aspect_ratio: 0.0,
                    crop_mirrored: false,
                    trim_start: 0.0,
                    trim_end: 0.0,
                    send_as_gif: false,
                    preset: VideoPreset::CompressedMedium,
                }
            }
        };

        if let Some(TrimRange { start, end }) = video.trim {
            adjustments.trim_start = start.max(0.0);
            adjustments.trim_end = end.max(0.0);
        }

        Some(adjustments)
    }

    pub fn trim_applied(&self) -> bool {
        self.trim_end > self.trim_start && (self.trim_start > 0.0 || self.trim_end > 0.0)
    }

    pub fn trimmed_duration(&self) -> Option<f64> {
        self.trim_applied()
            .then(|| self.trim_end - self.trim_start)
    }

    /// Serialized form plus its SHA-256 digest.
    pub fn to_resource(&self) -> anyhow::Result<VideoResourceAdjustments> {
        let data = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&data);
        tracing::debug!(digest = %hex::encode(&digest), "Built video resource adjustments");
        Ok(VideoResourceAdjustments {
            data: data.into(),
            digest: digest.to_vec().into(),
        })
    }
}

/// Output geometry derived from the preset edge limit, the crop and the
/// encoder's even-dimension requirement.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetVideoConverter;

impl VideoConverter for PresetVideoConverter {
    fn dimensions(
        &self,
        original: PixelDimensions,
        adjustments: Option<&VideoAdjustments>,
        preset: VideoPreset,
    ) -> PixelDimensions {
        let source = match adjustments {
            Some(adj) if adj.crop_rect.width >= 1.0 && adj.crop_rect.height >= 1.0 => {
                let mut width = adj.crop_rect.width.round() as u32;
                let mut height = adj.crop_rect.height.round() as u32;
                if adj.crop_locked_aspect_ratio > 0.0 {
                    let ratio = adj.crop_locked_aspect_ratio;
                    if (width as f64 / height as f64) > ratio {
                        width = (height as f64 * ratio).round() as u32;
                    } else {
                        height = (width as f64 / ratio).round() as u32;
                    }
                }
                PixelDimensions::new(width, height)
            }
            _ => original,
        };

        let limit = preset.max_dimension();
        let fitted = source.fitted(PixelDimensions::new(limit, limit));
        PixelDimensions::new(even(fitted.width), even(fitted.height))
    }
}

fn even(value: u32) -> u32 {
    (value & !1).max(2)
}
