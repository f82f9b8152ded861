//! Render side of the engine.
//!
//! - [`RenderItemCache`] - derived item array, rebuilt on a dirty flag
//! - [`picking`] - identity colors for GPU hit testing
//! - [`ScenePipeline`] - per-frame depth, selection, color and label passes
//! - [`GpuBackend`] / [`LabelDrawer`] - services the pipeline drives

mod adjust;
mod backend;
mod cache;
mod item;
mod mesh;
mod passes;
pub mod picking;
mod pipeline;
mod shadow;
mod theme;

pub use adjust::{AdjustmentDirection, AxisScaling};
pub use backend::{
    BackgroundImage, CullFace, DrawCall, GpuBackend, LabelDrawer, LabelPlacement, LabelStyle,
    MeshHandle, MeshSlot, ObjectUniforms, PassDescriptor, PassKind, PassTarget, ProgramId, TextureId,
};
pub use cache::{AreaSpecs, RenderItemCache};
pub use item::RenderItem;
pub use mesh::{MeshStyle, BACKGROUND_MESH_ID};
pub use picking::{PickColor, MAX_PICKABLE_ITEMS, SKIP_COLOR};
pub use pipeline::{FrameReport, FrameStage, ResizeOutcome, SceneConfig, ScenePipeline, SelectionMode};
pub use shadow::ShadowQuality;
pub use theme::{ColorTheme, LabelTransparency, Theme};

use crate::util::Vec3;

/// Depth compression: the area is squeezed by this factor and pushed back
/// along Z by the same amount.
pub const Z_COMP: f32 = 3.0;

/// Extra light distance used by the depth pass.
pub const DISTANCE_MOD: f32 = 5.0;

/// Width/height ratio below which the scene is zoomed out.
pub const DEFAULT_RATIO: f32 = 1.0 / 1.6;

/// Light offset relative to the eye.
pub const DEFAULT_LIGHT_POS: Vec3 = Vec3::new(0.0, 0.5, 0.0);

/// Light-space projection of the depth pass, degrees / near / far
pub const DEPTH_FOV: f32 = 15.0;
pub const DEPTH_NEAR: f32 = 3.0;
pub const DEPTH_FAR: f32 = 200.0;
