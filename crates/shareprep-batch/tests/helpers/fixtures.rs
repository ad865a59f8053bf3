//! Test fixtures: encoded images and payload shortcuts.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use shareprep_core::{DataPayload, PixelDimensions, RawPayload};

/// Blank GIF of the given size.
pub fn create_test_gif(width: u32, height: u32) -> Bytes {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        .write_to(&mut out, ImageFormat::Gif)
        .unwrap();
    Bytes::from(out.into_inner())
}

pub fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
}

pub fn text(value: &str) -> RawPayload {
    RawPayload::Text(value.to_string())
}

pub fn scaled_image() -> RawPayload {
    RawPayload::ScaledImage {
        data: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]),
        dimensions: PixelDimensions::new(640, 480),
    }
}

pub fn data(bytes: Bytes, file_name: Option<&str>) -> RawPayload {
    RawPayload::Data(DataPayload {
        data: bytes,
        file_name: file_name.map(str::to_string),
        mime_type: None,
    })
}
