//! Configuration module
//!
//! Tunables for the preparation pipeline: image fit boxes and JPEG qualities,
//! large-file hints, the voice heuristic and external tool paths.

use std::env;

use crate::models::PixelDimensions;

const MAX_IMAGE_DIMENSION: u32 = 1280;
const PHOTO_JPEG_QUALITY: u8 = 52;
const DATA_IMAGE_JPEG_QUALITY: u8 = 54;
const PDF_THUMBNAIL_SIZE: u32 = 256;
const PDF_THUMBNAIL_QUALITY: u8 = 50;
const LARGE_FILE_BYTES: usize = 5 * 1024 * 1024;
const LARGE_VIDEO_SECS: f64 = 3.0 * 60.0;
const VOICE_MAX_SECS: f64 = 30.0;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub max_image_dimension: u32,
    pub photo_jpeg_quality: u8,
    pub data_image_jpeg_quality: u8,
    pub pdf_thumbnail_size: u32,
    pub pdf_thumbnail_quality: u8,
    /// Uploads above this size are flagged as large to the upload subsystem.
    pub large_file_bytes: usize,
    /// Videos longer than this are flagged as large.
    pub large_video_secs: f64,
    /// Audio without an explicit voice flag is sent as voice below this duration.
    /// Zero-length audio is always voice, so `0` limits the heuristic to audio
    /// with no known duration.
    pub voice_max_secs: f64,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub pdftoppm_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: MAX_IMAGE_DIMENSION,
            photo_jpeg_quality: PHOTO_JPEG_QUALITY,
            data_image_jpeg_quality: DATA_IMAGE_JPEG_QUALITY,
            pdf_thumbnail_size: PDF_THUMBNAIL_SIZE,
            pdf_thumbnail_quality: PDF_THUMBNAIL_QUALITY,
            large_file_bytes: LARGE_FILE_BYTES,
            large_video_secs: LARGE_VIDEO_SECS,
            voice_max_secs: VOICE_MAX_SECS,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = PipelineConfig {
            max_image_dimension: env::var("SHAREPREP_MAX_IMAGE_DIMENSION")
                .unwrap_or_else(|_| MAX_IMAGE_DIMENSION.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_DIMENSION),
            photo_jpeg_quality: env::var("SHAREPREP_PHOTO_JPEG_QUALITY")
                .unwrap_or_else(|_| PHOTO_JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(PHOTO_JPEG_QUALITY),
            data_image_jpeg_quality: env::var("SHAREPREP_DATA_IMAGE_JPEG_QUALITY")
                .unwrap_or_else(|_| DATA_IMAGE_JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(DATA_IMAGE_JPEG_QUALITY),
            pdf_thumbnail_size: env::var("SHAREPREP_PDF_THUMBNAIL_SIZE")
                .unwrap_or_else(|_| PDF_THUMBNAIL_SIZE.to_string())
                .parse()
                .unwrap_or(PDF_THUMBNAIL_SIZE),
            pdf_thumbnail_quality: env::var("SHAREPREP_PDF_THUMBNAIL_QUALITY")
                .unwrap_or_else(|_| PDF_THUMBNAIL_QUALITY.to_string())
                .parse()
                .unwrap_or(PDF_THUMBNAIL_QUALITY),
            large_file_bytes: env::var("SHAREPREP_LARGE_FILE_BYTES")
                .unwrap_or_else(|_| LARGE_FILE_BYTES.to_string())
                .parse()
                .unwrap_or(LARGE_FILE_BYTES),
            large_video_secs: env::var("SHAREPREP_LARGE_VIDEO_SECS")
                .unwrap_or_else(|_| LARGE_VIDEO_SECS.to_string())
                .parse()
                .unwrap_or(LARGE_VIDEO_SECS),
            voice_max_secs: env::var("SHAREPREP_VOICE_MAX_SECS")
                .unwrap_or_else(|_| VOICE_MAX_SECS.to_string())
                .parse()
                .unwrap_or(VOICE_MAX_SECS),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            pdftoppm_path: env::var("PDFTOPPM_PATH").unwrap_or_else(|_| "pdftoppm".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_image_dimension == 0 {
            return Err(anyhow::anyhow!(
                "SHAREPREP_MAX_IMAGE_DIMENSION must be greater than zero"
            ));
        }
        if self.pdf_thumbnail_size == 0 {
            return Err(anyhow::anyhow!(
                "SHAREPREP_PDF_THUMBNAIL_SIZE must be greater than zero"
            ));
        }

        for (name, quality) in [
            ("SHAREPREP_PHOTO_JPEG_QUALITY", self.photo_jpeg_quality),
            ("SHAREPREP_DATA_IMAGE_JPEG_QUALITY", self.data_image_jpeg_quality),
            ("SHAREPREP_PDF_THUMBNAIL_QUALITY", self.pdf_thumbnail_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(anyhow::anyhow!("{} must be between 1 and 100", name));
            }
        }

        let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        for (name, path) in [
            ("FFMPEG_PATH", &self.ffmpeg_path),
            ("FFPROBE_PATH", &self.ffprobe_path),
            ("PDFTOPPM_PATH", &self.pdftoppm_path),
        ] {
            if path.chars().any(|c| dangerous_chars.contains(&c)) {
                return Err(anyhow::anyhow!("{} contains dangerous characters", name));
            }
        }

        Ok(())
    }

    /// Fit box for photos and still images.
    pub fn image_box(&self) -> PixelDimensions {
        PixelDimensions::new(self.max_image_dimension, self.max_image_dimension)
    }

    /// Fit box for PDF previews.
    pub fn pdf_thumbnail_box(&self) -> PixelDimensions {
        PixelDimensions::new(self.pdf_thumbnail_size, self.pdf_thumbnail_size)
    }

    pub fn is_large_file(&self, size_bytes: usize) -> bool {
        size_bytes > self.large_file_bytes
    }
}
