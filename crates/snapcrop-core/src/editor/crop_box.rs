//! The draggable crop rectangle and its mask.
//!
//! The box is stored as two corners in editor coordinates. Every mutation
//! goes through clamping so that, whatever the input:
//!
//! - width and height stay at least `min_box_size`
//! - both corners stay inside the editor bounds, minus the vertical padding
//!
//! When the bounds are themselves smaller than the minimum size the two
//! rules conflict and the minimum size wins.

use kurbo::{BezPath, Point, Rect, Size};

use crate::config::EditorConfig;
use crate::geometry::{clamp_lower_wins, hit_zone, EdgeInsets};

/// Which corner handle a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    BottomRight,
}

#[derive(Debug, Clone)]
pub struct CropBox {
    top_left: Point,
    bottom_right: Point,
    bounds: Size,
    min_box_size: f64,
    min_vertical_padding: f64,
    handle_reach: f64,
    mask_path: BezPath,
    outline_path: BezPath,
}

impl CropBox {
    /// Create a box inset from `bounds` by `insets`, clamped to the rules above.
    pub fn new(bounds: Size, insets: EdgeInsets, config: &EditorConfig) -> Self {
        let mut crop_box = Self {
            top_left: Point::ZERO,
            bottom_right: Point::ZERO,
            bounds,
            min_box_size: config.min_box_size,
            min_vertical_padding: config.min_vertical_padding,
            handle_reach: config.handle_diameter * 2.0,
            mask_path: BezPath::new(),
            outline_path: BezPath::new(),
        };
        crop_box.set_rect(insets.rect_in(bounds));
        crop_box
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn rect(&self) -> Rect {
        Rect::from_points(self.top_left, self.bottom_right)
    }

    /// Distances from each edge of the bounds to the box.
    pub fn insets(&self) -> EdgeInsets {
        EdgeInsets::from_corners(self.top_left, self.bottom_right, self.bounds)
    }

    /// Bounds rectangle followed by the box rectangle. Filled with the
    /// even-odd rule this shades everything outside the box.
    pub fn mask_path(&self) -> &BezPath {
        &self.mask_path
    }

    /// The box rectangle alone, for stroking.
    pub fn outline_path(&self) -> &BezPath {
        &self.outline_path
    }

    /// The handle whose hit zone contains `location`, top-left first.
    pub fn handle_at(&self, location: Point) -> Option<Handle> {
        if hit_zone(self.top_left, self.handle_reach).contains(location) {
            Some(Handle::TopLeft)
        } else if hit_zone(self.bottom_right, self.handle_reach).contains(location) {
            Some(Handle::BottomRight)
        } else {
            None
        }
    }

    /// Move the top-left corner towards `point` and return where it landed.
    pub fn set_top_left(&mut self, point: Point) -> Point {
        let x = clamp_lower_wins(point.x, 0.0, self.bottom_right.x - self.min_box_size);
        let y = clamp_lower_wins(
            point.y,
            self.min_vertical_padding,
            self.bottom_right.y - self.min_box_size,
        );
        self.top_left = Point::new(x, y);
        self.update_paths();
        self.top_left
    }

    /// Move the bottom-right corner towards `point` and return where it landed.
    pub fn set_bottom_right(&mut self, point: Point) -> Point {
        let x = clamp_lower_wins(
            point.x,
            self.top_left.x + self.min_box_size,
            self.bounds.width,
        );
        let y = clamp_lower_wins(
            point.y,
            self.top_left.y + self.min_box_size,
            self.bounds.height - self.min_vertical_padding,
        );
        self.bottom_right = Point::new(x, y);
        self.update_paths();
        self.bottom_right
    }

    /// Replace the whole box, growing or shifting it as needed to satisfy the
    /// size and bounds rules.
    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        let (x0, x1) = fit_span(rect.x0, rect.x1, self.min_box_size, 0.0, self.bounds.width);
        let (y0, y1) = fit_span(
            rect.y0,
            rect.y1,
            self.min_box_size,
            self.min_vertical_padding,
            self.bounds.height - self.min_vertical_padding,
        );
        self.top_left = Point::new(x0, y0);
        self.bottom_right = Point::new(x1, y1);
        self.update_paths();
    }

    fn update_paths(&mut self) {
        let rect = self.rect();

        let mut mask = BezPath::new();
        append_rect(&mut mask, Rect::from_origin_size(Point::ZERO, self.bounds));
        append_rect(&mut mask, rect);
        self.mask_path = mask;

        let mut outline = BezPath::new();
        append_rect(&mut outline, rect);
        self.outline_path = outline;
    }
}

/// Clamp `[lo, hi]` into `[range_lo, range_hi]` and widen it to `min`.
///
/// Widening extends towards the far edge first, then back towards the near
/// one. If the range cannot hold `min`, the span starts at `range_lo` and
/// overhangs.
fn fit_span(lo: f64, hi: f64, min: f64, range_lo: f64, range_hi: f64) -> (f64, f64) {
    let lo = clamp_lower_wins(lo, range_lo, range_hi);
    let hi = clamp_lower_wins(hi, range_lo, range_hi);
    if hi - lo >= min {
        return (lo, hi);
    }

    let hi = (lo + min).min(range_hi);
    let lo = (hi - min).max(range_lo);
    (lo, lo + min)
}

fn append_rect(path: &mut BezPath, rect: Rect) {
    path.move_to((rect.x0, rect.y0));
    path.line_to((rect.x1, rect.y0));
    path.line_to((rect.x1, rect.y1));
    path.line_to((rect.x0, rect.y1));
    path.close_path();
}
