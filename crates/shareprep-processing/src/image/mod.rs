//! Still image helpers: fit-to-box resizing and JPEG encoding.

pub mod encode;
pub mod resize;

pub use encode::{decode, encode_jpeg, probe_dimensions};
pub use resize::{fit_image, image_dimensions, select_filter};
