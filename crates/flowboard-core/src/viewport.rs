//! Viewport transform between screen and world coordinates.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Lower bound for the viewport scale.
pub const MIN_SCALE: f64 = 0.1;
/// Upper bound for the viewport scale.
pub const MAX_SCALE: f64 = 3.0;

/// Pan/zoom state mapping world coordinates to screen coordinates.
///
/// A world point `w` appears on screen at `w * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen-space translation.
    pub offset: Vec2,
    /// Zoom factor, kept within [`MIN_SCALE`]..=[`MAX_SCALE`].
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Convert a screen position to world coordinates.
    pub fn to_world(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    /// Convert a world position to screen coordinates.
    pub fn to_screen(&self, world: Point) -> Point {
        self.transform() * world
    }

    /// Translate the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Adjust the scale by `delta`, keeping the world point under the
    /// screen-space `pivot` stationary.
    ///
    /// Does nothing when the clamped scale equals the current one.
    pub fn zoom(&mut self, delta: f64, pivot: Point) {
        let new_scale = (self.scale + delta).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let world = self.to_world(pivot);
        self.scale = new_scale;
        let shifted = self.to_screen(world);
        self.offset += Vec2::new(pivot.x - shifted.x, pivot.y - shifted.y);
    }
}
