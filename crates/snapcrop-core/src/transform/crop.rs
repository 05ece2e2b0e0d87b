//! Image cropping by edge insets.
//!
//! The export pipeline describes the region to keep as distances from each
//! edge of the (already scaled and rotated) source, in pixels. Insets are
//! rounded to whole pixels; negative insets count as zero.

use crate::decode::DecodedImage;
use crate::geometry::EdgeInsets;

/// Crop `image` by removing `insets` pixels from each edge.
///
/// # Behavior
///
/// - Fractional insets are rounded to the nearest pixel
/// - Negative or non-finite insets are treated as zero
/// - If the insets leave no pixels, the input is returned unchanged
pub fn apply_crop_insets(image: &DecodedImage, insets: &EdgeInsets) -> DecodedImage {
    let to_px = |v: f64| -> u32 {
        if v.is_finite() && v > 0.0 {
            v.round().min(u32::MAX as f64) as u32
        } else {
            0
        }
    };

    let (left, top) = (to_px(insets.left), to_px(insets.top));
    let (right, bottom) = (to_px(insets.right), to_px(insets.bottom));

    if left == 0 && top == 0 && right == 0 && bottom == 0 {
        return image.clone();
    }

    let horizontal = left.saturating_add(right);
    let vertical = top.saturating_add(bottom);
    if horizontal >= image.width || vertical >= image.height {
        log::warn!(
            "crop insets {:?} leave nothing of {}x{} image; keeping input",
            insets,
            image.width,
            image.height
        );
        return image.clone();
    }

    let out_width = image.width - horizontal;
    let out_height = image.height - vertical;
    let src_stride = image.width as usize * 3;
    let row_len = out_width as usize * 3;

    let mut output = Vec::with_capacity(row_len * out_height as usize);
    for row in image
        .pixels
        .chunks_exact(src_stride)
        .skip(top as usize)
        .take(out_height as usize)
    {
        let start = left as usize * 3;
        output.extend_from_slice(&row[start..start + row_len]);
    }

    DecodedImage::new(out_width, out_height, output)
}
