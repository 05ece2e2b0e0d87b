//! Post-gesture correction of the image transform.
//!
//! After the user lets go, the transformed image must still be large enough
//! and close enough to the crop area that a minimum-size box can sit on it.
//! The pass checks the image's screen bounding box against five limits:
//!
//! - width and height at least `min`
//! - right edge at or past `min`
//! - left edge at or before `width - min`
//! - bottom edge at or past `pad + min`
//! - top edge at or before `height - pad - min`
//!
//! A violation first raises the scale (about the bounding box centre) until
//! both dimensions reach `min`, then translates each violating edge back to
//! its limit.

use std::time::Instant;

use kurbo::{Rect, Size, Vec2};

use super::transform_state::Transform;
use super::Editor;

/// Scale factor and offset to apply on top of the current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub scale_factor: f64,
    pub offset: Vec2,
}

/// Whether `bbox` satisfies every limit.
pub fn covers(bbox: Rect, bounds: Size, min: f64, pad: f64) -> bool {
    bbox.width() >= min
        && bbox.height() >= min
        && bbox.x1 >= min
        && bbox.x0 <= bounds.width - min
        && bbox.y1 >= pad + min
        && bbox.y0 <= bounds.height - pad - min
}

/// Compute the correction for `bbox`, or `None` when it already covers.
pub fn plan_correction(bbox: Rect, bounds: Size, min: f64, pad: f64) -> Option<Correction> {
    if covers(bbox, bounds, min, pad) {
        return None;
    }

    let mut scale_factor = 1.0;
    if bbox.width() < min || bbox.height() < min {
        scale_factor = (min / bbox.width()).max(min / bbox.height()).max(1.0);
    }
    if !scale_factor.is_finite() {
        log::warn!("image bounding box {:?} is degenerate; skipping rescale", bbox);
        scale_factor = 1.0;
    }

    let scaled = Rect::from_center_size(bbox.center(), bbox.size() * scale_factor);

    let mut offset = Vec2::ZERO;
    if scaled.x1 < min {
        offset.x += min - scaled.x1;
    }
    if scaled.x0 > bounds.width - min {
        offset.x += bounds.width - min - scaled.x0;
    }
    if scaled.y1 < pad + min {
        offset.y += pad + min - scaled.y1;
    }
    if scaled.y0 > bounds.height - pad - min {
        offset.y += bounds.height - pad - min - scaled.y0;
    }

    Some(Correction {
        scale_factor,
        offset,
    })
}

impl Editor {
    /// Run the correction pass now.
    ///
    /// Returns `true` when the transform was changed. Skipped while a gesture
    /// is in progress or a previous correction is still animating.
    pub fn do_corrections(&mut self, now: Instant) -> bool {
        if self.is_adjusting() || self.is_correcting() {
            return false;
        }

        let bbox = self.image_bounding_rect();
        let Some(correction) = plan_correction(
            bbox,
            self.bounds,
            self.config.min_box_size,
            self.config.min_vertical_padding,
        ) else {
            return false;
        };

        let current = self.transform.current();
        let corrected = Transform::new(
            current.rotation,
            current.scale * correction.scale_factor,
            current.translation + correction.offset,
        );
        log::debug!(
            "correcting transform: scale x{:.3}, offset ({:.1}, {:.1})",
            correction.scale_factor,
            correction.offset.x,
            correction.offset.y
        );

        self.transform.set_committed(corrected);
        self.correcting_until = Some(now + self.config.animation());
        self.push_transform_changed(Some(self.config.animation()));
        true
    }
}
