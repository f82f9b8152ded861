//! Lazily rebuilt render item array.
//!
//! Limits, the height normalizer and the vertical adjustment follow every
//! structural change immediately. The per-item array is only rebuilt by
//! [`RenderItemCache::rebuild_if_dirty`], once per frame.

use serde::{Deserialize, Serialize};

use super::item::RenderItem;
use super::picking::{self, PickColor};
use super::Z_COMP;
use crate::data::{DataProxy, GridEvent, Limits};
use crate::util::{Result, Vec2, Vec3};

/// Size of the map area in data units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaSpecs {
    pub width: f32,
    pub height: f32,
}

/// Stand-in for an empty or non-finite area edge.
const FALLBACK_EDGE: f32 = 1.0;

fn usable_edge(edge: f32) -> f32 {
    if edge > 0.0 && edge.is_finite() {
        edge
    } else {
        FALLBACK_EDGE
    }
}

impl AreaSpecs {
    /// Empty or non-finite edges fall back to one unit.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: usable_edge(width),
            height: usable_edge(height),
        }
    }

    /// Uniform scene scale; compressed by [`Z_COMP`] when it exceeds one.
    pub fn scale_factor(&self) -> f32 {
        let longest = usable_edge(self.width).max(usable_edge(self.height));
        if Z_COMP > 1.0 {
            longest / Z_COMP
        } else {
            longest
        }
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= 0.0 && position.x <= self.width && position.y >= 0.0 && position.y <= self.height
    }
}

impl Default for AreaSpecs {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

#[derive(Debug)]
pub struct RenderItemCache {
    items: Vec<RenderItem>,
    area: AreaSpecs,
    scale_factor: f32,
    limits: Limits,
    height_normalizer: f32,
    y_adjustment: f32,
    dirty: bool,
}

impl RenderItemCache {
    pub fn new(area: AreaSpecs) -> Self {
        let area = AreaSpecs::new(area.width, area.height);
        Self {
            items: Vec::new(),
            area,
            scale_factor: area.scale_factor(),
            limits: Limits::default(),
            height_normalizer: 0.0,
            y_adjustment: 2.0,
            dirty: true,
        }
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&RenderItem> {
        self.items.get(index)
    }

    /// Valid items with a non-zero height; the only ones any pass draws.
    pub fn drawable(&self) -> impl Iterator<Item = &RenderItem> {
        self.items.iter().filter(|item| item.is_drawable())
    }

    pub fn area(&self) -> AreaSpecs {
        self.area
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn height_normalizer(&self) -> f32 {
        self.height_normalizer
    }

    pub fn y_adjustment(&self) -> f32 {
        self.y_adjustment
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Change the area; item translations are recomputed on the next rebuild.
    pub fn set_area(&mut self, area: AreaSpecs) {
        let area = AreaSpecs::new(area.width, area.height);
        self.area = area;
        self.scale_factor = area.scale_factor();
        self.dirty = true;
    }

    /// React to one grid notification.
    pub fn handle_event(&mut self, event: &GridEvent, proxy: &dyn DataProxy) {
        if !event.is_structural() {
            return;
        }
        self.update_limits(proxy.limits());
        self.dirty = true;
    }

    /// Drain and handle every queued notification of `proxy`.
    pub fn sync<P: DataProxy>(&mut self, proxy: &mut P) {
        for event in proxy.take_events() {
            self.handle_event(&event, &*proxy);
        }
    }

    fn update_limits(&mut self, limits: Limits) {
        self.limits = limits;
        self.height_normalizer = limits.height_normalizer();
        self.y_adjustment = limits.y_adjustment();
    }

    /// Rebuild the item array if anything changed since the last rebuild.
    ///
    /// Returns whether a rebuild happened. Fails only when the item count
    /// exceeds the picking color space.
    pub fn rebuild_if_dirty(&mut self, proxy: &dyn DataProxy) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let _span = tracing::debug_span!("rebuild_render_items").entered();

        let mut items = Vec::new();
        for (row_index, row) in proxy.array().iter().enumerate() {
            let Some(row) = row else { continue };
            for (column_index, data) in row.iter().enumerate() {
                let valid = self.check_valid(row_index, column_index, data.value, data.position);
                items.push(RenderItem {
                    index: items.len(),
                    source: (row_index, column_index),
                    value: data.value,
                    position: data.position,
                    translation: self.translation(data.position),
                    height: self.height_of(data.value),
                    label: data.label.clone(),
                    valid,
                    selection_color: PickColor::default(),
                });
            }
        }

        picking::assign(&mut items)?;
        tracing::debug!(items = items.len(), normalizer = self.height_normalizer, "render items rebuilt");
        self.items = items;
        self.dirty = false;
        Ok(true)
    }

    /// Scene translation of an area position, centered on the area midpoint.
    pub fn translation(&self, position: Vec2) -> Vec3 {
        Vec3::new(
            2.0 * (position.x - self.area.width / 2.0) / self.scale_factor,
            0.0,
            2.0 * (position.y - self.area.height / 2.0) / self.scale_factor + Z_COMP,
        )
    }

    pub fn height_of(&self, value: f32) -> f32 {
        if self.height_normalizer == 0.0 {
            0.0
        } else {
            value / self.height_normalizer
        }
    }

    fn check_valid(&self, row: usize, column: usize, value: f32, position: Vec2) -> bool {
        if value < 0.0 {
            tracing::error!(row, column, value, "Data item value is negative; item excluded");
            return false;
        }
        if !self.area.contains(position) {
            tracing::error!(
                row,
                column,
                x = position.x,
                y = position.y,
                width = self.area.width,
                height = self.area.height,
                "Data item position outside area; item excluded"
            );
            return false;
        }
        true
    }
}

impl Default for RenderItemCache {
    fn default() -> Self {
        Self::new(AreaSpecs::default())
    }
}
