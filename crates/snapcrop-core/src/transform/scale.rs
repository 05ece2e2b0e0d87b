//! Uniform scaling of a bitmap by a factor.

use crate::decode::{resize, DecodedImage, FilterType};

/// Scale `image` by `factor` in both dimensions.
///
/// Output dimensions are rounded to the nearest pixel. Returns a copy of the
/// input when the factor is 1, not finite, or would produce an empty bitmap.
pub fn apply_scale(image: &DecodedImage, factor: f64, filter: FilterType) -> DecodedImage {
    if (factor - 1.0).abs() < 1e-9 {
        return image.clone();
    }

    let width = (image.width as f64 * factor).round();
    let height = (image.height as f64 * factor).round();
    if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
        log::warn!(
            "scale {} of {}x{} image gives no pixels; keeping input",
            factor,
            image.width,
            image.height
        );
        return image.clone();
    }

    match resize(image, width as u32, height as u32, filter) {
        Ok(scaled) => scaled,
        Err(err) => {
            log::warn!("scaling failed ({}); keeping input", err);
            image.clone()
        }
    }
}
