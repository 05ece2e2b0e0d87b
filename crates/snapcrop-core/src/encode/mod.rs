//! Image encoding for serialization.
//!
//! Committed images are stored as PNG inside the serialized
//! [`ImageWithMetadata`](crate::metadata::ImageWithMetadata) value.

mod png;

pub use png::{encode_png, EncodeError};
