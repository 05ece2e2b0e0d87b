//! Decoding of captured photos with orientation correction.
//!
//! Cameras write pixels in sensor order and record how the picture should be
//! displayed in the EXIF orientation tag. The editor works on upright
//! bitmaps, so captured bytes are decoded with the tag applied, then
//! optionally turned a quarter so they match the editor's preferred aspect.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{Aspect, DecodeError, DecodedImage, Orientation};

/// Decode JPEG or PNG bytes, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::CorruptedFile` if the bytes cannot be decoded and
/// `DecodeError::EmptyImage` if the result has no pixels.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = get_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let decoded = DecodedImage::from_rgb_image(apply_orientation(img, orientation).into_rgb8());
    if decoded.is_empty() {
        return Err(DecodeError::EmptyImage);
    }
    Ok(decoded)
}

/// Decode a freshly captured photo into an upright bitmap for editing.
///
/// When `desired` is set and the upright image has the other aspect, it is
/// turned a quarter clockwise. The camera gives no hint about which way the
/// device was held, so the direction is a fixed choice.
pub fn decode_capture(bytes: &[u8], desired: Option<Aspect>) -> Result<DecodedImage, DecodeError> {
    let upright = decode_image(bytes)?;
    Ok(match desired {
        Some(aspect) => correct_aspect(upright, aspect),
        None => upright,
    })
}

/// Turn `image` a quarter clockwise unless it already has the `desired` aspect.
///
/// Falls back to returning the input unchanged if the pixel buffer cannot be
/// wrapped.
pub fn correct_aspect(image: DecodedImage, desired: Aspect) -> DecodedImage {
    if desired.matches(image.width, image.height) {
        return image;
    }

    match image.to_rgb_image() {
        Some(rgb) => DecodedImage::from_rgb_image(image::imageops::rotate90(&rgb)),
        None => {
            log::warn!(
                "cannot rotate {}x{} capture to {:?}; keeping original",
                image.width,
                image.height,
                desired
            );
            image
        }
    }
}

/// Read the EXIF orientation of encoded bytes.
///
/// Bytes without EXIF data, or with an unreadable tag, count as upright.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::UPRIGHT;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from_exif)
        .unwrap_or(Orientation::UPRIGHT)
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    let turned = match orientation.quarter_turns_cw % 4 {
        1 => img.rotate90(),
        2 => img.rotate180(),
        3 => img.rotate270(),
        _ => img,
    };
    if orientation.mirror {
        turned.fliph()
    } else {
        turned
    }
}
