//! Render the edited crop from the full-resolution original.
//!
//! The editor works in screen space on a downsized image. On commit, an
//! [`ExportJob`] snapshots what is needed to reproduce the same crop on the
//! original and runs the pixel work off the interactive thread.
//!
//! # Pipeline
//!
//! 1. Scale the original by the editor's zoom factor
//! 2. Rotate it by the editor's rotation (screen rotation is clockwise
//!    positive, pixel rotation counter-clockwise, so the angle is negated)
//! 3. Convert the crop box insets from screen points to pixels and crop
//!
//! The insets are measured from the displayed image frame with the pan
//! translation folded in. Scaling and rotating grow the canvas around its
//! centre, so each inset is shifted by half the growth on its axis:
//!
//! ```text
//! ratio  = original.width / frame.width
//! adjust = (transformed_size - original_size) / 2
//! inset' = max(0, inset * ratio + adjust)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::decode::{DecodedImage, FilterType};
use crate::editor::{Editor, OriginalImage};
use crate::geometry::EdgeInsets;
use crate::metadata::{Coordinate, ImageWithMetadata, Metadata};
use crate::transform::{apply_crop_insets, apply_rotation, apply_scale};

/// Caller-supplied context for a commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRequest {
    /// Device location at commit time, if known.
    pub location: Option<Coordinate>,
    /// Whether the result is headed for the photo library. Location is only
    /// attached in that case.
    pub save_to_library: bool,
    pub committed_at: DateTime<Utc>,
}

impl ExportRequest {
    /// A request stamped with the current time.
    pub fn now(location: Option<Coordinate>, save_to_library: bool) -> Self {
        Self {
            location,
            save_to_library,
            committed_at: Utc::now(),
        }
    }

    fn metadata(&self) -> Metadata {
        let location = if self.save_to_library {
            self.location
        } else {
            None
        };
        Metadata::new(location, Some(self.committed_at))
    }
}

/// Immutable snapshot of an edit session, ready to render.
#[derive(Debug, Clone)]
pub struct ExportJob {
    original: OriginalImage,
    screen_image: Arc<DecodedImage>,
    scale: f64,
    rotation: f64,
    insets: EdgeInsets,
    frame_width: f64,
    filter: FilterType,
    metadata: Metadata,
}

impl Editor {
    /// Snapshot the session for export.
    ///
    /// Uses the transform as currently displayed, including any gesture
    /// still in progress.
    pub fn export_job(&self, request: ExportRequest) -> ExportJob {
        let transform = self.transform().current();
        let frame = self.image_frame();
        let crop = self.crop_box().rect();
        let t = transform.translation;

        let insets = EdgeInsets::new(
            crop.y0 - (frame.y0 + t.y),
            crop.x0 - (frame.x0 + t.x),
            (frame.y1 + t.y) - crop.y1,
            (frame.x1 + t.x) - crop.x1,
        );
        log::debug!(
            "export snapshot: scale {:.3}, rotation {:.3}, insets {:?}",
            transform.scale,
            transform.rotation,
            insets
        );

        ExportJob {
            original: self.original().clone(),
            screen_image: self.screen_image().clone(),
            scale: transform.scale,
            rotation: transform.rotation,
            insets,
            frame_width: frame.width(),
            filter: self.config().export_filter,
            metadata: request.metadata(),
        }
    }
}

impl ExportJob {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Crop insets in display points, relative to the translated frame.
    pub fn display_insets(&self) -> EdgeInsets {
        self.insets
    }

    /// Render the crop synchronously.
    ///
    /// Falls back to the screen image when the original cannot be produced.
    /// Never fails: primitives that cannot produce a bitmap pass their input
    /// through.
    pub fn run(&self) -> ImageWithMetadata {
        let source = match self.original.get() {
            Some(original) => original,
            None => {
                log::warn!("exporting from screen image; original unavailable");
                self.screen_image.clone()
            }
        };

        let scaled = apply_scale(&source, self.scale, self.filter);
        let transformed = apply_rotation(&scaled, -self.rotation);
        let insets = self.pixel_insets(&source, &transformed);
        let cropped = apply_crop_insets(&transformed, &insets);

        log::debug!(
            "exported {}x{} from {}x{} original",
            cropped.width,
            cropped.height,
            source.width,
            source.height
        );
        ImageWithMetadata::new(cropped, self.metadata)
    }

    /// Run on tokio's blocking pool.
    pub fn spawn(self) -> JoinHandle<ImageWithMetadata> {
        tokio::task::spawn_blocking(move || self.run())
    }

    fn pixel_insets(&self, original: &DecodedImage, transformed: &DecodedImage) -> EdgeInsets {
        let ratio = if self.frame_width > 0.0 {
            original.width as f64 / self.frame_width
        } else {
            1.0
        };
        let adjust_w = (transformed.width as f64 - original.width as f64) / 2.0;
        let adjust_h = (transformed.height as f64 - original.height as f64) / 2.0;

        EdgeInsets::new(
            self.insets.top * ratio + adjust_h,
            self.insets.left * ratio + adjust_w,
            self.insets.bottom * ratio + adjust_h,
            self.insets.right * ratio + adjust_w,
        )
        .clamped_non_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::decode::DecodeError;
    use crate::editor::{GestureEvent, GesturePhase};
    use chrono::TimeZone;
    use kurbo::{Point, Rect, Size, Vec2};
    use std::f64::consts::FRAC_PI_2;
    use std::time::Instant;

    const RED: [u8; 3] = [255, 0, 0];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [0, 0, 255];
    const WHITE: [u8; 3] = [255, 255, 255];

    /// Square image split into red, green, blue and white quadrants
    /// (clockwise from top-left).
    fn quadrants(size: u32) -> DecodedImage {
        let half = size / 2;
        let mut pixels = Vec::with_capacity((size * size * 3) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = match (x < half, y < half) {
                    (true, true) => RED,
                    (false, true) => GREEN,
                    (true, false) => WHITE,
                    (false, false) => BLUE,
                };
                pixels.extend_from_slice(&color);
            }
        }
        DecodedImage::new(size, size, pixels)
    }

    fn editor_with(insets: EdgeInsets, original: OriginalImage) -> Editor {
        let config = EditorConfig {
            initial_insets: insets,
            export_filter: FilterType::Nearest,
            ..EditorConfig::default()
        };
        Editor::new(
            config,
            Size::new(300.0, 300.0),
            Arc::new(quadrants(300)),
            original,
        )
    }

    fn request() -> ExportRequest {
        ExportRequest {
            location: Some(Coordinate::new(48.85, 2.35)),
            save_to_library: true,
            committed_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
        }
    }

    fn drag_image(editor: &mut Editor, by: Vec2) {
        let now = Instant::now();
        for phase in [GesturePhase::Began, GesturePhase::Changed, GesturePhase::Ended] {
            let translation = if phase == GesturePhase::Began {
                Vec2::ZERO
            } else {
                by
            };
            editor.handle(
                GestureEvent::Pan {
                    phase,
                    location: Point::new(150.0, 150.0),
                    translation,
                },
                now,
            );
        }
    }

    #[test]
    fn test_identity_export_maps_box_to_original() {
        let editor = editor_with(EdgeInsets::uniform(40.0), OriginalImage::ready(quadrants(600)));
        let result = editor.export_job(request()).run();
        let image = result.image();

        // 40pt insets on a 300pt frame over a 600px original: 80px per edge
        assert_eq!((image.width, image.height), (440, 440));
        assert_eq!(image.pixel(0, 0), Some(RED));
        assert_eq!(image.pixel(439, 0), Some(GREEN));
        assert_eq!(image.pixel(439, 439), Some(BLUE));
        assert_eq!(image.pixel(0, 439), Some(WHITE));
    }

    #[test]
    fn test_translation_shifts_crop() {
        let mut editor =
            editor_with(EdgeInsets::uniform(40.0), OriginalImage::ready(quadrants(600)));
        drag_image(&mut editor, Vec2::new(10.0, 0.0));

        let job = editor.export_job(request());
        assert_eq!(job.display_insets(), EdgeInsets::new(40.0, 30.0, 40.0, 50.0));

        let image = job.run().into_parts().0;
        assert_eq!((image.width, image.height), (440, 440));
        // Left edge now starts at x=60 of the original; the red/green split
        // lands at 300 - 60
        assert_eq!(image.pixel(239, 0), Some(RED));
        assert_eq!(image.pixel(240, 0), Some(GREEN));
    }

    #[test]
    fn test_clockwise_rotation_moves_top_left_to_top_right() {
        let mut editor = editor_with(
            EdgeInsets::new(0.0, 150.0, 150.0, 0.0),
            OriginalImage::ready(quadrants(600)),
        );
        assert_eq!(editor.crop_box().rect(), Rect::new(150.0, 0.0, 300.0, 150.0));

        let now = Instant::now();
        for phase in [GesturePhase::Began, GesturePhase::Changed, GesturePhase::Ended] {
            editor.handle(
                GestureEvent::Rotate {
                    phase,
                    rotation: FRAC_PI_2,
                },
                now,
            );
        }

        let image = editor.export_job(request()).run().into_parts().0;
        assert_eq!((image.width, image.height), (300, 300));
        for (x, y) in [(0, 0), (299, 0), (150, 150), (0, 299), (299, 299)] {
            assert_eq!(image.pixel(x, y), Some(RED), "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_zoom_crops_centre() {
        let mut editor =
            editor_with(EdgeInsets::uniform(40.0), OriginalImage::ready(quadrants(600)));
        let now = Instant::now();
        for (phase, scale) in [
            (GesturePhase::Began, 1.0),
            (GesturePhase::Changed, 2.0),
            (GesturePhase::Ended, 2.0),
        ] {
            editor.handle(GestureEvent::Pinch { phase, scale }, now);
        }

        let image = editor.export_job(request()).run().into_parts().0;
        // 1200px scaled canvas, 80 * 2 + 300 = 380 per edge
        assert_eq!((image.width, image.height), (440, 440));
        assert_eq!(image.pixel(10, 10), Some(RED));
        assert_eq!(image.pixel(430, 430), Some(BLUE));
    }

    #[test]
    fn test_falls_back_to_screen_image() {
        let editor = editor_with(
            EdgeInsets::uniform(40.0),
            OriginalImage::lazy(|| Err(DecodeError::InvalidFormat)),
        );
        let image = editor.export_job(request()).run().into_parts().0;
        assert_eq!((image.width, image.height), (220, 220));
    }

    #[test]
    fn test_export_is_idempotent() {
        let mut editor =
            editor_with(EdgeInsets::uniform(40.0), OriginalImage::ready(quadrants(600)));
        let now = Instant::now();
        for phase in [GesturePhase::Began, GesturePhase::Changed, GesturePhase::Ended] {
            editor.handle(GestureEvent::Rotate { phase, rotation: 0.3 }, now);
        }

        let first = editor.export_job(request()).run();
        let second = editor.export_job(request()).run();
        assert_eq!(first.image(), second.image());
        assert_eq!(first, second);
    }

    #[test]
    fn test_location_only_when_saving() {
        let editor = editor_with(EdgeInsets::uniform(40.0), OriginalImage::ready(quadrants(600)));

        let saved = editor.export_job(request());
        assert_eq!(saved.metadata().location, Some(Coordinate::new(48.85, 2.35)));
        assert_eq!(saved.metadata().creation_date, Some(request().committed_at));

        let unsaved = editor.export_job(ExportRequest {
            save_to_library: false,
            ..request()
        });
        assert_eq!(unsaved.metadata().location, None);
        assert_eq!(unsaved.metadata().creation_date, Some(request().committed_at));
    }

    #[tokio::test]
    async fn test_spawned_export_matches_inline_run() {
        let editor = editor_with(EdgeInsets::uniform(40.0), OriginalImage::ready(quadrants(600)));
        let job = editor.export_job(request());
        let inline = job.run();

        let spawned = job.spawn().await.unwrap();
        assert_eq!(spawned.image(), inline.image());
    }
}
