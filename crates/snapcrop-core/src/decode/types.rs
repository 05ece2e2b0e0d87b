//! Core bitmap types shared by the decode, transform and export modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    InvalidFormat,

    #[error("image data could not be decoded: {0}")]
    CorruptedFile(String),

    #[error("image has no pixels")]
    EmptyImage,
}

/// Resampling used when a bitmap changes size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Nearest,
    #[default]
    Bilinear,
    /// Sharpest, and the slowest by a wide margin on full-size originals.
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType as Image;
        match self {
            FilterType::Nearest => Image::Nearest,
            FilterType::Bilinear => Image::Triangle,
            FilterType::Lanczos3 => Image::Lanczos3,
        }
    }
}

/// How a stored bitmap must be turned to display upright.
///
/// Decoded from the EXIF orientation tag (values 1 to 8) as a clockwise
/// rotation followed by an optional horizontal mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    pub quarter_turns_cw: u8,
    pub mirror: bool,
}

impl Orientation {
    pub const UPRIGHT: Orientation = Orientation {
        quarter_turns_cw: 0,
        mirror: false,
    };

    /// Interpret an EXIF orientation value; unknown values are upright.
    pub fn from_exif(tag: u32) -> Self {
        let (quarter_turns_cw, mirror) = match tag {
            2 => (0, true),
            3 => (2, false),
            4 => (2, true),
            5 => (1, true),
            6 => (1, false),
            7 => (3, true),
            8 => (3, false),
            _ => (0, false),
        };
        Self {
            quarter_turns_cw,
            mirror,
        }
    }

    pub fn is_upright(self) -> bool {
        self == Self::UPRIGHT
    }
}

/// Preferred shape of a captured photo once orientation is corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Portrait,
    Landscape,
}

impl Aspect {
    /// Whether a `width` x `height` bitmap already has this aspect.
    ///
    /// Square images satisfy both.
    pub fn matches(self, width: u32, height: u32) -> bool {
        match self {
            Aspect::Portrait => width <= height,
            Aspect::Landscape => width >= height,
        }
    }
}

/// An 8-bit RGB bitmap, rows top to bottom, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "{width}x{height} bitmap needs {} bytes",
            width as usize * height as usize * 3
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A bitmap of one solid colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        Self::new(width, height, rgb.repeat(count))
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `image::RgbImage`; `None` if the buffer length is wrong.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Dimensions as a `kurbo::Size`, for layout maths.
    pub fn size(&self) -> kurbo::Size {
        kurbo::Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// RGB value at (x, y), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels
            .get(start..start + 3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
