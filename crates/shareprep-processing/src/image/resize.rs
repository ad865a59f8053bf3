use ::image::{imageops::FilterType, DynamicImage, GenericImageView};
use shareprep_core::PixelDimensions;

pub fn image_dimensions(img: &DynamicImage) -> PixelDimensions {
    let (width, height) = img.dimensions();
    PixelDimensions::new(width, height)
}

/// Pick a filter for the given reduction ratio. Heavy reductions favour speed.
pub fn select_filter(original: PixelDimensions, target: PixelDimensions) -> FilterType {
    let width_ratio = original.width as f32 / target.width.max(1) as f32;
    let height_ratio = original.height as f32 / target.height.max(1) as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

/// Scale `img` down to fit inside `bounds`. Returns the image unchanged when it
/// already fits.
pub fn fit_image(img: &DynamicImage, bounds: PixelDimensions) -> DynamicImage {
    let original = image_dimensions(img);
    let target = original.fitted(bounds);
    if target == original {
        return img.clone();
    }
    let filter = select_filter(original, target);
    img.resize_exact(target.width, target.height, filter)
}
