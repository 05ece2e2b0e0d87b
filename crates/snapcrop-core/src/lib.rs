//! Snapcrop Core - Capture, crop and photo-library picking
//!
//! This crate holds everything behind the Snapcrop picker that is not UI:
//! the interactive crop editor model, the export pipeline that replays an
//! edit on the full-resolution original, the selection state machine, and
//! batch fetches from a photo library.
//!
//! # Module Structure
//!
//! - [`editor`] - Crop box, image transform, gestures and correction pass
//! - [`export`] - Scale, rotate and crop the original off-thread
//! - [`picker`] - Selection lifecycle and observer events
//! - [`library`] - Batch pick and date-range search over a photo library
//! - [`metadata`] - Images tagged with location and creation date
//! - [`config`] - Tunables, loadable from TOML
//! - [`decode`], [`transform`], [`encode`] - Bitmap primitives
//! - [`geometry`] - Edge insets and screen-space helpers

pub mod config;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod library;
pub mod metadata;
pub mod picker;
pub mod transform;

pub use config::{ConfigError, EditorConfig, LibraryConfig, PickerConfig};
pub use decode::{DecodeError, DecodedImage, FilterType};
pub use editor::{Editor, EditorEvent, GestureEvent, GesturePhase, Move, OriginalImage};
pub use export::{ExportJob, ExportRequest};
pub use geometry::EdgeInsets;
pub use library::{
    AuthorizationStatus, Asset, ImageDelivery, LibraryError, PhotoLibrary, PickerResult,
};
pub use metadata::{Coordinate, ImageWithMetadata, Metadata, MetadataError};
pub use picker::{
    Capture, Picker, PickerError, PickerEvent, PickerObserver, PickerPhase, PickerState, Source,
};
