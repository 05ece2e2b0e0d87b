//! PNG encoding for serialized images.
//!
//! Committed images travel as lossless PNG so that decoding a serialized
//! value gives back exactly the pixels that were cropped.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("pixel buffer holds {actual} bytes, bitmap needs {expected}")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("cannot encode a {width}x{height} bitmap")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("PNG encoder: {0}")]
    EncodingFailed(String),
}

/// Encode `image` as an 8-bit RGB PNG.
///
/// # Errors
///
/// Empty bitmaps and buffers whose length disagrees with the dimensions are
/// rejected before the encoder runs.
pub fn encode_png(image: &DecodedImage) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * 3;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let mut png = Vec::with_capacity(expected / 2);
    PngEncoder::new(&mut png)
        .write_image(&image.pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(png)
}
