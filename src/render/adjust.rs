//! Which model-matrix axes scale with an item's height.

use serde::{Deserialize, Serialize};

use crate::util::{normal_matrix, Mat4, Vec3};

/// Axis selector for height-driven scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdjustmentDirection {
    /// Classic bars: height grows, footprint fixed
    #[default]
    Height,
    Width,
    Depth,
    /// Width and depth grow, height fixed
    Radius,
    /// Uniformly scaled glyphs
    All,
}

/// Per-frame multiplier/scaler constants. Scale on each axis is
/// `multiplier * height + scaler`, so the item loop never branches on the
/// direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScaling {
    pub multiplier: Vec3,
    pub scaler: Vec3,
}

impl AxisScaling {
    /// Resolve constants for `direction`; `thickness` is divided by the scene
    /// scale factor to get scene units.
    pub fn new(direction: AdjustmentDirection, thickness: Vec3, scale_factor: f32) -> Self {
        let t = thickness / scale_factor;
        let (multiplier, scaler) = match direction {
            AdjustmentDirection::Height => (Vec3::new(0.0, 1.0, 0.0), Vec3::new(t.x, 0.0, t.z)),
            AdjustmentDirection::Width => (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, t.y, t.z)),
            AdjustmentDirection::Depth => (Vec3::new(0.0, 0.0, 1.0), Vec3::new(t.x, t.y, 0.0)),
            AdjustmentDirection::Radius => (Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.0, t.y, 0.0)),
            AdjustmentDirection::All => (Vec3::ONE, Vec3::ZERO),
        };
        Self { multiplier, scaler }
    }

    pub fn scale(&self, height: f32) -> Vec3 {
        self.multiplier * height + self.scaler
    }

    /// Model matrix of an item whose mesh spans [-1, 1] on every axis. The
    /// mesh bottom rests on the scene floor at `-y_adjustment`.
    pub fn model_matrix(&self, translation: Vec3, height: f32, y_adjustment: f32) -> Mat4 {
        let scale = self.scale(height);
        let offset = Vec3::new(translation.x, scale.y - y_adjustment, translation.z);
        Mat4::from_translation(offset) * Mat4::from_scale(scale)
    }

    /// Inverse transpose of the scale part.
    pub fn normal_matrix(&self, height: f32) -> Mat4 {
        normal_matrix(Mat4::from_scale(self.scale(height)))
    }

    /// Scene-space point at the top center of an item.
    pub fn top_of(&self, translation: Vec3, height: f32, y_adjustment: f32) -> Vec3 {
        let scale = self.scale(height);
        Vec3::new(translation.x, 2.0 * scale.y - y_adjustment, translation.z)
    }
}
