//! Images tagged with capture location and date.
//!
//! # Wire Format
//!
//! [`Metadata`] serializes as a flat JSON object:
//!
//! ```text
//! { "creationDate": "2024-05-01T12:30:00Z", "latitude": 51.5, "longitude": -0.1 }
//! ```
//!
//! Every field is optional and absent values are omitted. Latitude and
//! longitude are separate keys but only mean something together: decoding
//! yields a location only when both are present.
//!
//! [`ImageWithMetadata`] wraps that object next to the PNG-encoded pixels,
//! stored as standard base64:
//!
//! ```text
//! { "imageData": "iVBORw0KGgo...", "metadata": { ... } }
//! ```
//!
//! # Equality
//!
//! Two [`ImageWithMetadata`] values are equal when their metadata is equal.
//! Pixels are not compared; callers deduplicate photos by where and when
//! they were taken.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::decode::{decode_image, DecodedImage};
use crate::encode::encode_png;

/// Errors from converting metadata or tagged images to and from bytes.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Where and when a photo was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetadataWire", into = "MetadataWire")]
pub struct Metadata {
    pub location: Option<Coordinate>,
    pub creation_date: Option<DateTime<Utc>>,
}

/// Flat on-the-wire shape of [`Metadata`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    creation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

impl From<MetadataWire> for Metadata {
    fn from(wire: MetadataWire) -> Self {
        let location = match (wire.latitude, wire.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        };
        Self {
            location,
            creation_date: wire.creation_date,
        }
    }
}

impl From<Metadata> for MetadataWire {
    fn from(metadata: Metadata) -> Self {
        Self {
            creation_date: metadata.creation_date,
            latitude: metadata.location.map(|c| c.latitude),
            longitude: metadata.location.map(|c| c.longitude),
        }
    }
}

impl Metadata {
    /// Metadata with neither location nor date.
    pub const EMPTY: Metadata = Metadata {
        location: None,
        creation_date: None,
    };

    pub fn new(location: Option<Coordinate>, creation_date: Option<DateTime<Utc>>) -> Self {
        Self {
            location,
            creation_date,
        }
    }

    /// Encode as JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MetadataError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// An immutable decoded image paired with its [`Metadata`].
#[derive(Debug, Clone)]
pub struct ImageWithMetadata {
    image: DecodedImage,
    metadata: Metadata,
}

impl ImageWithMetadata {
    pub fn new(image: DecodedImage, metadata: Metadata) -> Self {
        Self { image, metadata }
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (DecodedImage, Metadata) {
        (self.image, self.metadata)
    }

    /// Encode as JSON bytes with the pixels stored as PNG.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MetadataError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from bytes produced by [`ImageWithMetadata::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl PartialEq for ImageWithMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageWithMetadataWire {
    image_data: String,
    metadata: Metadata,
}

impl Serialize for ImageWithMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let png = encode_png(&self.image).map_err(S::Error::custom)?;
        ImageWithMetadataWire {
            image_data: BASE64.encode(png),
            metadata: self.metadata,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ImageWithMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = ImageWithMetadataWire::deserialize(deserializer)?;
        let png = BASE64
            .decode(&wire.image_data)
            .map_err(|e| D::Error::custom(format!("imageData is not valid base64: {e}")))?;
        let image = decode_image(&png).map_err(|e| {
            D::Error::custom(format!("imageData could not be decoded into an image: {e}"))
        })?;
        Ok(Self {
            image,
            metadata: wire.metadata,
        })
    }
}
