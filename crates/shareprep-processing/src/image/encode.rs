use std::io::Cursor;

use ::image::codecs::jpeg::JpegEncoder;
use ::image::{DynamicImage, ImageReader};
use bytes::Bytes;
use shareprep_core::{PixelDimensions, PrepareError};

/// Read the pixel size from the image header without decoding pixels.
pub fn probe_dimensions(data: &[u8]) -> Option<PixelDimensions> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    reader.format()?;
    let (width, height) = reader.into_dimensions().ok()?;
    let dimensions = PixelDimensions::new(width, height);
    (!dimensions.is_empty()).then_some(dimensions)
}

pub fn decode(data: &[u8]) -> Result<DynamicImage, PrepareError> {
    ::image::load_from_memory(data)
        .map_err(|e| PrepareError::ImageEncoding(format!("Failed to decode image: {}", e)))
}

/// Encode to baseline JPEG. Alpha is discarded.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, PrepareError> {
    let rgb = img.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| PrepareError::ImageEncoding(format!("Failed to encode JPEG: {}", e)))?;
    Ok(Bytes::from(buffer))
}
