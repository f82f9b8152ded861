//! Derived per-item render records.

use super::picking::PickColor;
use crate::util::{Vec2, Vec3};

/// Drawable record derived from one data item. Rebuilt wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// Position in the flattened item array; also the picking index
    pub index: usize,
    /// (row, column) of the source data item
    pub source: (usize, usize),
    pub value: f32,
    /// Source position on the area
    pub position: Vec2,
    /// Scene-space translation of the item base
    pub translation: Vec3,
    /// Value divided by the height normalizer
    pub height: f32,
    pub label: String,
    /// False for negative values or positions outside the area
    pub valid: bool,
    pub selection_color: PickColor,
}

impl RenderItem {
    /// Valid and with a non-zero height.
    pub fn is_drawable(&self) -> bool {
        self.valid && self.height != 0.0
    }

    /// Text shown by the label pass.
    pub fn label_text(&self) -> String {
        if self.label.is_empty() {
            format!("{}", self.value)
        } else {
            self.label.clone()
        }
    }
}
