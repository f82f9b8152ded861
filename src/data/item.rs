//! Data items and row containers.

use crate::util::Vec2;

/// One data point: a value placed at a position on the map area.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataItem {
    /// Bar value; negative values are rejected at render time
    pub value: f32,
    /// Position on the area, in area units
    pub position: Vec2,
    /// Free-form label shown when the item is selected
    pub label: String,
}

impl DataItem {
    pub fn new(value: f32, position: Vec2) -> Self {
        Self {
            value,
            position,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Ordered items of one row; column index addresses an item.
pub type DataRow = Vec<DataItem>;

/// Row-major array. A `None` slot is an absent row.
pub type DataArray = Vec<Option<DataRow>>;
