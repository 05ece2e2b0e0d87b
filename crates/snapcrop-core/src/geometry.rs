//! Screen-space geometry helpers shared by the editor and export pipeline.
//!
//! Points, vectors, sizes, rects and affine transforms come from `kurbo`.
//! This module adds [`EdgeInsets`], the representation the crop box uses
//! when it talks to the export pipeline, and a handful of helpers for
//! converting between insets, corners and rects.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of the editor bounds
//! - x grows to the right, y grows downwards
//! - Positive rotation angles turn clockwise on screen

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Distances from each edge of a container to a contained rectangle.
///
/// Positive values shrink inwards from the container edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub const ZERO: EdgeInsets = EdgeInsets::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Same inset on all four edges.
    pub const fn uniform(inset: f64) -> Self {
        Self::new(inset, inset, inset, inset)
    }

    /// The top-left corner of the inset rectangle.
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// The bottom-right corner of the inset rectangle inside `bounds`.
    pub fn bottom_right_in(&self, bounds: Size) -> Point {
        Point::new(bounds.width - self.right, bounds.height - self.bottom)
    }

    /// The inset rectangle inside a container of size `bounds`.
    pub fn rect_in(&self, bounds: Size) -> Rect {
        Rect::from_points(self.top_left(), self.bottom_right_in(bounds))
    }

    /// Insets of `rect` relative to a container of size `bounds`.
    pub fn from_rect_in(rect: Rect, bounds: Size) -> Self {
        Self::from_corners(Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y1), bounds)
    }

    /// Insets described by two corners inside a container of size `bounds`.
    pub fn from_corners(top_left: Point, bottom_right: Point, bounds: Size) -> Self {
        Self::new(
            top_left.y,
            top_left.x,
            bounds.height - bottom_right.y,
            bounds.width - bottom_right.x,
        )
    }

    /// Multiply every edge by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.top * factor,
            self.left * factor,
            self.bottom * factor,
            self.right * factor,
        )
    }

    /// Clamp every edge to be non-negative.
    pub fn clamped_non_negative(&self) -> Self {
        Self::new(
            self.top.max(0.0),
            self.left.max(0.0),
            self.bottom.max(0.0),
            self.right.max(0.0),
        )
    }

    /// Sum of left and right insets.
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom insets.
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Clamp `value` into `[lo, hi]`.
///
/// Unlike `f64::clamp` this never panics: when the interval is empty the
/// lower bound wins.
#[inline]
pub fn clamp_lower_wins(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}

/// Square hit zone centred on `center`, extending `reach` in every direction.
pub fn hit_zone(center: Point, reach: f64) -> Rect {
    Rect::from_center_size(center, Size::ZERO).inflate(reach, reach)
}

/// Rectangle occupied by `content` when aspect-fitted and centred in `bounds`.
///
/// Returns `bounds` itself (at the origin) when `content` is degenerate.
pub fn aspect_fit(content: Size, bounds: Size) -> Rect {
    if content.width <= 0.0 || content.height <= 0.0 {
        return Rect::from_origin_size(Point::ZERO, bounds);
    }

    let scale = (bounds.width / content.width).min(bounds.height / content.height);
    let fitted = Size::new(content.width * scale, content.height * scale);
    let origin = Point::new(
        (bounds.width - fitted.width) / 2.0,
        (bounds.height - fitted.height) / 2.0,
    );
    Rect::from_origin_size(origin, fitted)
}
