//! Math type re-exports and small scene geometry helpers.

pub use glam::{Mat3, Mat4, Quat, UVec2, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};

/// Integer pixel rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewportRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, 1.0 for degenerate rectangles.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Same origin, both extents multiplied by `factor`.
    pub fn scaled(&self, factor: u32) -> Self {
        Self::new(self.x, self.y, self.width * factor, self.height * factor)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && px < (self.x + self.width) as f32
            && py < (self.y + self.height) as f32
    }
}

/// Convert an 8-bit RGB triple to a 0..1 color vector.
pub fn color_from_rgb8(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Normal matrix (inverse transpose) of a model matrix.
pub fn normal_matrix(model: Mat4) -> Mat4 {
    model.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_contains() {
        let r = ViewportRect::new(10, 20, 100, 50);
        assert!(r.contains(10.0, 20.0));
        assert!(r.contains(109.5, 69.5));
        assert!(!r.contains(110.0, 30.0));
        assert!(!r.contains(9.0, 30.0));
    }

    #[test]
    fn test_viewport_scaled_and_aspect() {
        let r = ViewportRect::sized(800, 400);
        assert_eq!(r.scaled(3), ViewportRect::sized(2400, 1200));
        assert!((r.aspect() - 2.0).abs() < 1e-6);
        assert_eq!(ViewportRect::sized(0, 0).aspect(), 1.0);
    }

    #[test]
    fn test_normal_matrix_of_scale() {
        let m = Mat4::from_scale(Vec3::new(2.0, 4.0, 1.0));
        let n = normal_matrix(m);
        let v = n.transform_vector3(Vec3::ONE);
        assert!((v - Vec3::new(0.5, 0.25, 1.0)).length() < 1e-6);
    }
}
