//! Rotation, zoom and pan applied to the displayed image.
//!
//! A transform is kept in two parts: the committed value, and a live delta
//! for the gestures currently in progress. Gestures report cumulative values
//! since they began, so the live delta is simply replaced on every update and
//! folded into the committed value when the gesture ends.
//!
//! The combined transform is applied about the centre of the image frame:
//!
//! ```text
//! T(center + translation) * R(rotation) * S(scale) * T(-center)
//! ```

use kurbo::{Affine, Point, Rect, Vec2};

/// A rotation (radians, clockwise on screen), uniform scale and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: f64,
    pub scale: f64,
    pub translation: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: 0.0,
        scale: 1.0,
        translation: Vec2::ZERO,
    };

    pub fn new(rotation: f64, scale: f64, translation: Vec2) -> Self {
        Self {
            rotation,
            scale,
            translation,
        }
    }

    /// Apply `delta` on top of this transform: angles and offsets add,
    /// scales multiply.
    pub fn then(&self, delta: &Transform) -> Transform {
        Transform {
            rotation: self.rotation + delta.rotation,
            scale: self.scale * delta.scale,
            translation: self.translation + delta.translation,
        }
    }

    /// The affine map that applies this transform about `center`.
    pub fn affine_about(&self, center: Point) -> Affine {
        let center = center.to_vec2();
        Affine::translate(center + self.translation)
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
            * Affine::translate(-center)
    }
}

/// Committed and in-flight transform of the image frame.
#[derive(Debug, Clone)]
pub struct TransformState {
    committed: Transform,
    live: Transform,
    center: Point,
    affine: Affine,
}

impl TransformState {
    pub fn new(center: Point) -> Self {
        Self {
            committed: Transform::IDENTITY,
            live: Transform::IDENTITY,
            center,
            affine: Affine::IDENTITY,
        }
    }

    /// Committed transform with any live gesture delta applied.
    pub fn current(&self) -> Transform {
        self.committed.then(&self.live)
    }

    pub fn committed(&self) -> Transform {
        self.committed
    }

    pub fn affine(&self) -> Affine {
        self.affine
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn is_identity(&self) -> bool {
        self.current() == Transform::IDENTITY
    }

    /// Axis-aligned bounding box of `frame` under the current transform.
    pub fn bounding_rect(&self, frame: Rect) -> Rect {
        self.affine.transform_rect_bbox(frame)
    }

    pub fn set_live_rotation(&mut self, rotation: f64) {
        self.live.rotation = rotation;
        self.recompute();
    }

    pub fn set_live_scale(&mut self, scale: f64) {
        self.live.scale = scale;
        self.recompute();
    }

    pub fn set_live_translation(&mut self, translation: Vec2) {
        self.live.translation = translation;
        self.recompute();
    }

    pub fn commit_rotation(&mut self) {
        self.committed.rotation += self.live.rotation;
        self.live.rotation = 0.0;
        self.recompute();
    }

    pub fn commit_scale(&mut self) {
        self.committed.scale *= self.live.scale;
        self.live.scale = 1.0;
        self.recompute();
    }

    pub fn commit_translation(&mut self) {
        self.committed.translation += self.live.translation;
        self.live.translation = Vec2::ZERO;
        self.recompute();
    }

    pub fn discard_live_rotation(&mut self) {
        self.set_live_rotation(0.0);
    }

    pub fn discard_live_scale(&mut self) {
        self.set_live_scale(1.0);
    }

    pub fn discard_live_translation(&mut self) {
        self.set_live_translation(Vec2::ZERO);
    }

    /// Replace the committed transform, dropping any live delta.
    pub fn set_committed(&mut self, transform: Transform) {
        self.committed = transform;
        self.live = Transform::IDENTITY;
        self.recompute();
    }

    pub fn reset(&mut self) {
        self.set_committed(Transform::IDENTITY);
    }

    fn recompute(&mut self) {
        self.affine = self.current().affine_about(self.center);
    }
}
