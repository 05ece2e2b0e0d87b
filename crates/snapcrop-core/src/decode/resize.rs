//! Bitmap resizing backed by `image::imageops`.
//!
//! Library fetches shrink full-size assets to the configured target box and
//! export scales the original by the editor's zoom factor. Both return new
//! bitmaps and leave the input untouched.

use super::{DecodeError, DecodedImage, FilterType};

/// Resample `image` to exactly `width` x `height`.
///
/// # Errors
///
/// `DecodeError::InvalidFormat` for a zero target dimension and
/// `DecodeError::CorruptedFile` when the pixel buffer length does not match
/// the source dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }
    if (image.width, image.height) == (width, height) {
        return Ok(image.clone());
    }

    let Some(source) = image.to_rgb_image() else {
        return Err(DecodeError::CorruptedFile(format!(
            "{} bytes for a {}x{} bitmap",
            image.pixels.len(),
            image.width,
            image.height
        )));
    };
    let resampled = image::imageops::resize(&source, width, height, filter.to_image_filter());
    Ok(DecodedImage::from_rgb_image(resampled))
}

/// Shrink an image so it fits inside a `max_width` x `max_height` box.
///
/// The aspect ratio is preserved and images that already fit are returned
/// unchanged; this never upscales.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the target box is empty.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if max_width == 0 || max_height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    if image.width <= max_width && image.height <= max_height {
        return Ok(image.clone());
    }

    let (new_width, new_height) =
        calculate_fit_dimensions(image.width, image.height, max_width, max_height);

    resize(image, new_width, new_height, filter)
}

/// Largest size with the source aspect that fits the box, at least 1x1.
fn calculate_fit_dimensions(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let factor = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64 * factor).round() as u32).clamp(1, max_width);
    let new_height = ((height as f64 * factor).round() as u32).clamp(1, max_height);
    (new_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> DecodedImage {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .flat_map(|(x, y)| [(x % 256) as u8, (y % 256) as u8, 128])
            .collect();
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let img = gradient_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions_is_clone() {
        let img = gradient_image(40, 30);
        let resized = resize(&img, 40, 30, FilterType::Lanczos3).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = gradient_image(100, 50);

        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_to_fit_tall_box() {
        // Phone-shaped target: width is the binding constraint
        let img = gradient_image(4000, 2000);
        let resized = resize_to_fit(&img, 1170, 2532, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 1170);
        assert_eq!(resized.height, 585);
    }

    #[test]
    fn test_resize_to_fit_height_bound() {
        let img = gradient_image(1000, 4000);
        let resized = resize_to_fit(&img, 800, 800, FilterType::Nearest).unwrap();

        assert_eq!(resized.width, 200);
        assert_eq!(resized.height, 800);
    }

    #[test]
    fn test_resize_to_fit_never_upscales() {
        let img = gradient_image(100, 50);
        let resized = resize_to_fit(&img, 1000, 1000, FilterType::Bilinear).unwrap();
        assert_eq!((resized.width, resized.height), (100, 50));
    }

    #[test]
    fn test_resize_to_fit_empty_box_error() {
        let img = gradient_image(100, 50);
        assert!(resize_to_fit(&img, 0, 100, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_calculate_fit_dimensions_zero_input() {
        assert_eq!(calculate_fit_dimensions(0, 0, 256, 256), (0, 0));
    }

    #[test]
    fn test_calculate_fit_dimensions_extreme_aspect() {
        // 1px tall strip never rounds down to zero
        assert_eq!(calculate_fit_dimensions(10_000, 1, 100, 100), (100, 1));
    }
}
