//! Identity colors for GPU picking.
//!
//! Every render item gets a unique 24-bit color in array order: red is the
//! lowest base-256 digit, then green, then blue. The selection pass clears to
//! [`SKIP_COLOR`], which never decodes to an item.

use super::item::RenderItem;
use crate::util::{Error, Result, Vec3};

/// Exact 8-bit RGB triple as written to and read from the selection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PickColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PickColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a pixel read back from an RGBA8 target; alpha is ignored.
    pub fn from_rgba(pixel: [u8; 4]) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2])
    }

    /// Normalized color for the shader. Each channel is `n / 255`, which an
    /// RGBA8 unorm target stores back as exactly `n`.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

/// Selection clear color meaning "nothing under the pointer".
pub const SKIP_COLOR: PickColor = PickColor::new(255, 255, 255);

/// Item count limit: every index below it encodes to a color other than
/// [`SKIP_COLOR`].
pub const MAX_PICKABLE_ITEMS: usize = 0xFF_FFFF;

/// Encode an item index. Only indices below [`MAX_PICKABLE_ITEMS`] are unique.
pub fn encode(index: usize) -> PickColor {
    PickColor::new(
        (index % 256) as u8,
        ((index / 256) % 256) as u8,
        ((index / 65_536) % 256) as u8,
    )
}

/// Decode a sampled color; `None` for the skip color.
pub fn decode(color: PickColor) -> Option<usize> {
    if color == SKIP_COLOR {
        return None;
    }
    Some(color.r as usize + color.g as usize * 256 + color.b as usize * 65_536)
}

/// Fail when `count` items cannot all get distinct colors.
pub fn check_capacity(count: usize) -> Result<()> {
    if count > MAX_PICKABLE_ITEMS {
        return Err(Error::TooManyItems {
            count,
            max: MAX_PICKABLE_ITEMS,
        });
    }
    Ok(())
}

/// Assign identity colors in array order.
///
/// Non-drawable items keep their slot so that decoding an index always
/// lands on the item that was drawn with that color.
pub fn assign(items: &mut [RenderItem]) -> Result<()> {
    check_capacity(items.len())?;
    for (i, item) in items.iter_mut().enumerate() {
        item.selection_color = encode(i);
    }
    Ok(())
}
