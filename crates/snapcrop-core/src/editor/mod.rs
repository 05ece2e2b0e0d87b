//! Interactive crop editor.
//!
//! An [`Editor`] is one edit session: a screen-sized image shown aspect-fit
//! inside the editor bounds, a [`CropBox`] on top of it, and a
//! [`TransformState`] that rotates, zooms and pans the image underneath the
//! box. The host feeds it [`GestureEvent`]s and polls [`Editor::tick`] so the
//! debounced correction pass can run; every visible change is reported as an
//! [`EditorEvent`] for the host to drain and render.
//!
//! Time is passed in explicitly rather than read from a clock, which keeps
//! the editor synchronous and deterministic.
//!
//! # Module Structure
//!
//! - [`crop_box`] - Draggable crop rectangle and its mask paths
//! - [`transform_state`] - Committed and live image transform
//! - [`gesture`] - Pan, rotate and pinch dispatch
//! - [`correction`] - Post-gesture correction pass
//! - [`original`] - Lazily produced full-resolution original

pub mod correction;
pub mod crop_box;
pub mod gesture;
pub mod original;
pub mod transform_state;

use std::sync::Arc;
use std::time::{Duration, Instant};

use kurbo::{Affine, Rect, Size};

use crate::config::EditorConfig;
use crate::decode::DecodedImage;
use crate::geometry::aspect_fit;

pub use correction::{plan_correction, Correction};
pub use crop_box::{CropBox, Handle};
pub use gesture::{GestureEvent, GesturePhase, Move};
pub use original::OriginalImage;
pub use transform_state::{Transform, TransformState};

use gesture::GestureTracker;

/// A visible change the host should render.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The crop box moved. `animation` is how long the host should take to
    /// get there; `None` means immediately.
    CropBoxChanged {
        rect: Rect,
        animation: Option<Duration>,
    },
    /// The image transform changed.
    TransformChanged {
        transform: Transform,
        affine: Affine,
        animation: Option<Duration>,
    },
    /// A correction pass will run at `deadline` unless a gesture starts first.
    CorrectionScheduled { deadline: Instant },
}

/// One crop-editing session.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    bounds: Size,
    screen_image: Arc<DecodedImage>,
    original: OriginalImage,
    image_frame: Rect,
    crop_box: CropBox,
    transform: TransformState,
    gestures: GestureTracker,
    pending_correction: Option<Instant>,
    correcting_until: Option<Instant>,
    events: Vec<EditorEvent>,
}

impl Editor {
    /// Start a session showing `screen_image` inside `bounds`.
    pub fn new(
        config: EditorConfig,
        bounds: Size,
        screen_image: Arc<DecodedImage>,
        original: OriginalImage,
    ) -> Self {
        let image_frame = aspect_fit(screen_image.size(), bounds);
        let crop_box = CropBox::new(bounds, config.initial_insets, &config);
        let transform = TransformState::new(image_frame.center());
        log::debug!(
            "edit session: {}x{} image in {}x{} bounds, frame {:?}",
            screen_image.width,
            screen_image.height,
            bounds.width,
            bounds.height,
            image_frame
        );

        Self {
            config,
            bounds,
            screen_image,
            original,
            image_frame,
            crop_box,
            transform,
            gestures: GestureTracker::default(),
            pending_correction: None,
            correcting_until: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn screen_image(&self) -> &Arc<DecodedImage> {
        &self.screen_image
    }

    pub fn original(&self) -> &OriginalImage {
        &self.original
    }

    /// Where the untransformed screen image sits inside the bounds.
    pub fn image_frame(&self) -> Rect {
        self.image_frame
    }

    pub fn crop_box(&self) -> &CropBox {
        &self.crop_box
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// Screen bounding box of the image under the current transform.
    pub fn image_bounding_rect(&self) -> Rect {
        self.transform.bounding_rect(self.image_frame)
    }

    /// True while any gesture stream is in progress.
    pub fn is_adjusting(&self) -> bool {
        self.gestures.is_active()
    }

    /// True while a correction animation is still running.
    pub fn is_correcting(&self) -> bool {
        self.correcting_until.is_some()
    }

    /// When the scheduled correction pass will run, if one is pending.
    pub fn pending_correction(&self) -> Option<Instant> {
        self.pending_correction
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance timers to `now`, running a due correction pass.
    ///
    /// Returns `true` when a correction changed the transform.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.correcting_until.is_some_and(|until| now >= until) {
            self.correcting_until = None;
        }

        match self.pending_correction {
            Some(deadline) if now >= deadline => {
                if let Some(until) = self.correcting_until {
                    // Previous correction still animating; retry when it lands
                    self.pending_correction = Some(until);
                    return false;
                }
                self.pending_correction = None;
                self.do_corrections(now)
            }
            _ => false,
        }
    }

    /// Snap the crop box to the image's current screen bounding box, clamped
    /// to the bounds and vertical padding.
    pub fn fit_box_to_image(&mut self) {
        let bbox = self.image_bounding_rect();
        let pad = self.config.min_vertical_padding;
        let rect = Rect::new(
            bbox.x0.max(0.0),
            bbox.y0.max(pad),
            bbox.x1.min(self.bounds.width),
            bbox.y1.min(self.bounds.height - pad),
        );
        self.crop_box.set_rect(rect);
        self.push_crop_box_changed(Some(self.config.animation()));
    }

    /// Restore the initial crop box and an identity transform.
    pub fn reset(&mut self) {
        self.crop_box = CropBox::new(self.bounds, self.config.initial_insets, &self.config);
        self.transform.reset();
        self.gestures.clear();
        self.pending_correction = None;
        self.correcting_until = None;

        let animation = Some(self.config.animation());
        self.push_crop_box_changed(animation);
        self.push_transform_changed(animation);
    }

    fn schedule_correction(&mut self, deadline: Instant) {
        self.pending_correction = Some(deadline);
        self.events.push(EditorEvent::CorrectionScheduled { deadline });
    }

    fn push_crop_box_changed(&mut self, animation: Option<Duration>) {
        self.events.push(EditorEvent::CropBoxChanged {
            rect: self.crop_box.rect(),
            animation,
        });
    }

    fn push_transform_changed(&mut self, animation: Option<Duration>) {
        self.events.push(EditorEvent::TransformChanged {
            transform: self.transform.current(),
            affine: self.transform.affine(),
            animation,
        });
    }
}
