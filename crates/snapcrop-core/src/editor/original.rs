//! Lazily produced full-resolution original for an edit session.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::decode::{decode_capture, Aspect, DecodeError, DecodedImage};

type Producer = dyn Fn() -> Result<DecodedImage, DecodeError> + Send + Sync;

/// Handle to the full-resolution image behind an edit session.
///
/// The editor works on a screen-sized copy; the original is only needed at
/// export, so producing it (typically a full decode) is deferred until the
/// first call to [`OriginalImage::get`] and then cached. Clones share the
/// cache, which lets an export job on a worker thread produce it without
/// touching the editor.
#[derive(Clone)]
pub struct OriginalImage {
    inner: Arc<Inner>,
}

struct Inner {
    producer: Box<Producer>,
    cell: OnceLock<Option<Arc<DecodedImage>>>,
}

impl OriginalImage {
    /// An original that is already decoded.
    pub fn ready(image: DecodedImage) -> Self {
        let image = Arc::new(image);
        let cell = OnceLock::new();
        let _ = cell.set(Some(image));
        Self {
            inner: Arc::new(Inner {
                producer: Box::new(|| Err(DecodeError::EmptyImage)),
                cell,
            }),
        }
    }

    /// An original produced on first use by `producer`.
    pub fn lazy<F>(producer: F) -> Self
    where
        F: Fn() -> Result<DecodedImage, DecodeError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                producer: Box::new(producer),
                cell: OnceLock::new(),
            }),
        }
    }

    /// An original decoded on first use from captured bytes.
    pub fn from_capture_bytes(bytes: Vec<u8>, desired: Option<Aspect>) -> Self {
        Self::lazy(move || decode_capture(&bytes, desired))
    }

    /// The decoded original, producing it on first call.
    ///
    /// Returns `None` when the producer fails; the failure is logged once and
    /// cached.
    pub fn get(&self) -> Option<Arc<DecodedImage>> {
        self.inner
            .cell
            .get_or_init(|| match (self.inner.producer)() {
                Ok(image) if !image.is_empty() => Some(Arc::new(image)),
                Ok(_) => {
                    log::warn!("original image producer returned an empty bitmap");
                    None
                }
                Err(err) => {
                    log::warn!("original image unavailable: {}", err);
                    None
                }
            })
            .clone()
    }

    /// Whether the original has been produced (successfully or not).
    pub fn is_resolved(&self) -> bool {
        self.inner.cell.get().is_some()
    }
}

impl fmt::Debug for OriginalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.cell.get() {
            None => "pending".to_string(),
            Some(None) => "unavailable".to_string(),
            Some(Some(image)) => format!("{}x{}", image.width, image.height),
        };
        f.debug_struct("OriginalImage").field("state", &state).finish()
    }
}
