use serde::{Deserialize, Serialize};

/// World position of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation; `w == 0` returns `self` unchanged.
    #[must_use]
    pub fn lerp(self, other: Vec2, w: f32) -> Vec2 {
        if w == 0.0 {
            return self;
        }
        Vec2 {
            x: self.x + (other.x - self.x) * w,
            y: self.y + (other.y - self.y) * w,
        }
    }
}

/// Window dimensions a session was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Per-axis factor mapping positions from `self` onto `target`.
    #[must_use]
    pub fn scale_to(&self, target: Viewport) -> Vec2 {
        if self.is_empty() || target.is_empty() {
            return Vec2::new(1.0, 1.0);
        }
        Vec2::new(
            target.width as f32 / self.width as f32,
            target.height as f32 / self.height as f32,
        )
    }
}
