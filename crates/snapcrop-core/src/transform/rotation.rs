//! Arbitrary-angle image rotation with bilinear interpolation.
//!
//! The output canvas is expanded to the bounding box of the rotated image,
//! and uncovered corners are filled with black.
//!
//! # Algorithm
//!
//! Quarter turns are exact pixel permutations and go through
//! `image::imageops`. Every other angle uses inverse mapping: for each
//! output pixel centre we find the source position and interpolate.
//!
//! For a counter-clockwise turn by θ on a y-down raster the inverse map is:
//! ```text
//! src_x = dx * cos(θ) - dy * sin(θ) + src_cx
//! src_y = dx * sin(θ) + dy * cos(θ) + src_cy
//! ```
//! where `(dx, dy)` is the output pixel centre relative to the output centre.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::decode::DecodedImage;

/// Angles closer than this to a quarter turn are treated as exact.
const QUARTER_TURN_EPSILON: f64 = 1e-6;

/// Which exact quarter turn an angle is, if any (0..=3, counter-clockwise).
fn quarter_turns(angle_radians: f64) -> Option<u8> {
    let normalized = angle_radians.rem_euclid(TAU);
    let turns = (normalized / FRAC_PI_2).round();
    if (normalized - turns * FRAC_PI_2).abs() < QUARTER_TURN_EPSILON {
        Some((turns as u8) % 4)
    } else {
        None
    }
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// Quarter turns swap or keep the dimensions exactly; other angles round
/// `w*|cos| + h*|sin|` by `w*|sin| + h*|cos|` to whole pixels.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_radians: f64) -> (u32, u32) {
    match quarter_turns(angle_radians) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let cos = angle_radians.cos().abs();
    let sin = angle_radians.sin().abs();
    let (w, h) = (width as f64, height as f64);

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate an image counter-clockwise by `angle_radians` around its centre.
///
/// Returns a copy of the input for empty images or non-finite angles.
pub fn apply_rotation(image: &DecodedImage, angle_radians: f64) -> DecodedImage {
    if image.is_empty() || !angle_radians.is_finite() {
        return image.clone();
    }

    if let Some(turns) = quarter_turns(angle_radians) {
        return rotate_quarter_turns(image, turns);
    }

    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle_radians);
    let (cos, sin) = (angle_radians.cos(), angle_radians.sin());

    let src_cx = image.width as f64 / 2.0;
    let src_cy = image.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = Vec::with_capacity((dst_w as usize) * (dst_h as usize) * 3);
    for dst_y in 0..dst_h {
        let dy = dst_y as f64 + 0.5 - dst_cy;
        for dst_x in 0..dst_w {
            let dx = dst_x as f64 + 0.5 - dst_cx;

            // Source position in pixel-centre coordinates
            let src_x = dx * cos - dy * sin + src_cx - 0.5;
            let src_y = dx * sin + dy * cos + src_cy - 0.5;

            output.extend_from_slice(&sample_bilinear(image, src_x, src_y));
        }
    }

    DecodedImage::new(dst_w, dst_h, output)
}

fn rotate_quarter_turns(image: &DecodedImage, turns: u8) -> DecodedImage {
    if turns == 0 {
        return image.clone();
    }

    let Some(rgb) = image.to_rgb_image() else {
        log::warn!(
            "rotation of malformed {}x{} buffer skipped",
            image.width,
            image.height
        );
        return image.clone();
    };

    // imageops turns clockwise
    let rotated = match turns {
        1 => image::imageops::rotate270(&rgb),
        2 => image::imageops::rotate180(&rgb),
        _ => image::imageops::rotate90(&rgb),
    };
    DecodedImage::from_rgb_image(rotated)
}

/// Sample a pixel using bilinear interpolation.
///
/// Positions within half a pixel of the border are clamped to the edge;
/// anything further out is black.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let max_x = image.width as f64 - 1.0;
    let max_y = image.height as f64 - 1.0;

    if x < -0.5 || x > max_x + 0.5 || y < -0.5 || y > max_y + 0.5 {
        return [0, 0, 0];
    }

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = texel(image, x0, y0);
    let p10 = texel(image, x1, y0);
    let p01 = texel(image, x0, y1);
    let p11 = texel(image, x1, y1);

    let mut result = [0u8; 3];
    for (i, channel) in result.iter_mut().enumerate() {
        let top = p00[i] * (1.0 - fx) + p10[i] * fx;
        let bottom = p01[i] * (1.0 - fx) + p11[i] * fx;
        *channel = (top * (1.0 - fy) + bottom * fy).clamp(0.0, 255.0).round() as u8;
    }
    result
}

#[inline]
fn texel(image: &DecodedImage, x: u32, y: u32) -> [f64; 3] {
    let idx = ((y as usize) * (image.width as usize) + x as usize) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the output buffer always matches the reported bounds.
        #[test]
        fn prop_output_matches_bounds(
            (width, height) in (1u32..=40, 1u32..=40),
            angle in -7.0f64..7.0,
        ) {
            let img = DecodedImage::filled(width, height, [90, 90, 90]);
            let rotated = apply_rotation(&img, angle);

            let (w, h) = compute_rotated_bounds(width, height, angle);
            prop_assert_eq!((rotated.width, rotated.height), (w, h));
            prop_assert_eq!(rotated.pixels.len(), (w * h * 3) as usize);
        }

        /// Property: the canvas never shrinks below the source's shorter side.
        #[test]
        fn prop_bounds_contain_source(
            (width, height) in (1u32..=500, 1u32..=500),
            angle in -7.0f64..7.0,
        ) {
            let (w, h) = compute_rotated_bounds(width, height, angle);
            let shorter = width.min(height);
            prop_assert!(w + 1 >= shorter);
            prop_assert!(h + 1 >= shorter);
        }

        /// Property: rotation is deterministic.
        #[test]
        fn prop_rotation_deterministic(
            (width, height) in (2u32..=20, 2u32..=20),
            angle in -3.2f64..3.2,
        ) {
            let img = DecodedImage::filled(width, height, [1, 2, 3]);
            prop_assert_eq!(apply_rotation(&img, angle), apply_rotation(&img, angle));
        }
    }
}
