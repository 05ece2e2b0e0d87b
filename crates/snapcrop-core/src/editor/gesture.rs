//! Gesture dispatch for the crop editor.
//!
//! Pan, rotate and pinch arrive as separate streams that may overlap. A pan
//! that starts on a corner handle drags that corner; any other pan drags the
//! image. Rotate and pinch always act on the image. When the last image
//! gesture ends, a correction pass is scheduled after a quiet period.

use std::time::Instant;

use kurbo::{Point, Vec2};

use super::crop_box::Handle;
use super::Editor;

/// Lifecycle phase of one gesture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One update from a gesture recognizer.
///
/// Values are cumulative since the stream began: `translation` is the total
/// pan offset, `rotation` the total angle in radians (clockwise positive) and
/// `scale` the total zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Pan {
        phase: GesturePhase,
        location: Point,
        translation: Vec2,
    },
    Rotate {
        phase: GesturePhase,
        rotation: f64,
    },
    Pinch {
        phase: GesturePhase,
        scale: f64,
    },
}

/// What the current pan gesture is moving.
///
/// Handle variants carry the offset from the corner to the pointer so the
/// corner does not jump to the finger on the first update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Move {
    DanglingTopLeft(Vec2),
    DanglingBottomRight(Vec2),
    DraggingImage,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GestureTracker {
    current_move: Option<Move>,
    panning: bool,
    rotating: bool,
    pinching: bool,
    correction_wanted: bool,
}

impl GestureTracker {
    pub(crate) fn is_active(&self) -> bool {
        self.panning || self.rotating || self.pinching
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Editor {
    /// Apply one gesture update at time `now`.
    pub fn handle(&mut self, event: GestureEvent, now: Instant) {
        match event {
            GestureEvent::Pan {
                phase,
                location,
                translation,
            } => self.handle_pan(phase, location, translation, now),
            GestureEvent::Rotate { phase, rotation } => self.handle_rotate(phase, rotation, now),
            GestureEvent::Pinch { phase, scale } => self.handle_pinch(phase, scale, now),
        }
    }

    /// What the in-progress pan is moving, if any.
    pub fn current_move(&self) -> Option<Move> {
        self.gestures.current_move
    }

    fn handle_pan(&mut self, phase: GesturePhase, location: Point, translation: Vec2, now: Instant) {
        match phase {
            GesturePhase::Began => {
                self.gestures.panning = true;
                self.cancel_pending_correction();

                let current_move = match self.crop_box.handle_at(location) {
                    Some(Handle::TopLeft) => {
                        Move::DanglingTopLeft(location - self.crop_box.top_left())
                    }
                    Some(Handle::BottomRight) => {
                        Move::DanglingBottomRight(location - self.crop_box.bottom_right())
                    }
                    None => Move::DraggingImage,
                };
                log::trace!("pan began at {:?}: {:?}", location, current_move);
                self.gestures.current_move = Some(current_move);

                if current_move == Move::DraggingImage {
                    self.transform.set_live_translation(translation);
                    self.push_transform_changed(None);
                }
            }
            GesturePhase::Changed => match self.gestures.current_move {
                Some(Move::DanglingTopLeft(offset)) => {
                    self.crop_box.set_top_left(location - offset);
                    self.push_crop_box_changed(Some(self.config.drag_animation()));
                }
                Some(Move::DanglingBottomRight(offset)) => {
                    self.crop_box.set_bottom_right(location - offset);
                    self.push_crop_box_changed(Some(self.config.drag_animation()));
                }
                Some(Move::DraggingImage) => {
                    self.transform.set_live_translation(translation);
                    self.push_transform_changed(None);
                }
                None => log::debug!("pan update without a pan in progress"),
            },
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.gestures.panning = false;
                if self.gestures.current_move.take() == Some(Move::DraggingImage) {
                    if phase == GesturePhase::Ended {
                        self.transform.commit_translation();
                    } else {
                        self.transform.discard_live_translation();
                    }
                    self.push_transform_changed(None);
                    self.gestures.correction_wanted = true;
                }
                self.settle(now);
            }
        }
    }

    fn handle_rotate(&mut self, phase: GesturePhase, rotation: f64, now: Instant) {
        let rotation = if rotation.is_finite() {
            rotation
        } else {
            log::debug!("ignoring non-finite rotation {}", rotation);
            return;
        };

        match phase {
            GesturePhase::Began | GesturePhase::Changed => {
                if phase == GesturePhase::Began {
                    self.gestures.rotating = true;
                    self.cancel_pending_correction();
                } else if !self.gestures.rotating {
                    log::debug!("rotation update without a rotation in progress");
                    return;
                }
                self.transform.set_live_rotation(rotation);
                self.push_transform_changed(None);
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.gestures.rotating = false;
                if phase == GesturePhase::Ended {
                    self.transform.commit_rotation();
                } else {
                    self.transform.discard_live_rotation();
                }
                self.push_transform_changed(None);
                self.gestures.correction_wanted = true;
                self.settle(now);
            }
        }
    }

    fn handle_pinch(&mut self, phase: GesturePhase, scale: f64, now: Instant) {
        match phase {
            GesturePhase::Began | GesturePhase::Changed => {
                if phase == GesturePhase::Began {
                    self.gestures.pinching = true;
                    self.cancel_pending_correction();
                } else if !self.gestures.pinching {
                    log::debug!("pinch update without a pinch in progress");
                    return;
                }
                // A zero scale would collapse the affine; the correction pass
                // restores a usable size once the pinch ends.
                if !(scale.is_finite() && scale > 0.0) {
                    log::debug!("ignoring pinch scale {}", scale);
                    return;
                }
                self.transform.set_live_scale(scale);
                self.push_transform_changed(None);
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.gestures.pinching = false;
                if phase == GesturePhase::Ended {
                    self.transform.commit_scale();
                } else {
                    self.transform.discard_live_scale();
                }
                self.push_transform_changed(None);
                self.gestures.correction_wanted = true;
                self.settle(now);
            }
        }
    }

    /// Drop a scheduled pass but remember it is owed, so whichever stream
    /// ends last reschedules it.
    fn cancel_pending_correction(&mut self) {
        if self.pending_correction.take().is_some() {
            self.gestures.correction_wanted = true;
        }
    }

    /// Schedule the correction once no stream is active any more.
    fn settle(&mut self, now: Instant) {
        if self.gestures.is_active() || !self.gestures.correction_wanted {
            return;
        }
        self.gestures.correction_wanted = false;
        self.schedule_correction(now + self.config.correction_delay());
    }
}
