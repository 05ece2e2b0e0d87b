//! Image decoding for captured photos and library assets.
//!
//! This module provides functionality for:
//! - Decoding JPEG and PNG bytes with EXIF orientation applied
//! - Turning captures upright to the editor's preferred aspect
//! - Resizing for library downscaling and export scaling
//!
//! Everything here is synchronous and CPU-bound. Callers on the interactive
//! thread should hand large decodes to a blocking worker.

mod capture;
mod resize;
mod types;

pub use capture::{correct_aspect, decode_capture, decode_image, get_orientation};
pub use resize::{resize, resize_to_fit};
pub use types::{Aspect, DecodeError, DecodedImage, FilterType, Orientation};
