//! Pixel transforms used by the export pipeline: scale, rotation and crop.
//!
//! # Transform Order
//!
//! Export applies them in this order:
//! 1. Scale by the accumulated pinch factor
//! 2. Rotation by the accumulated angle (canvas grows to fit)
//! 3. Crop by insets measured from each edge
//!
//! # Failure Handling
//!
//! None of these operations fail. When a transform cannot produce a bitmap
//! (zero-sized target, crop that leaves no pixels, malformed buffer) it
//! returns its input unchanged and logs a warning.
//!
//! # Coordinate System
//!
//! - Rotation angles are in radians, positive = counter-clockwise
//! - Crop insets are in pixels from each edge
//! - Origin is top-left corner

mod crop;
mod rotation;
mod scale;

pub use crop::apply_crop_insets;
pub use rotation::{apply_rotation, compute_rotated_bounds};
pub use scale::apply_scale;
