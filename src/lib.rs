//! # mapbars
//!
//! 3D bar/map chart engine: height-mapped items on a 2D area, optionally
//! over a background image, drawn with shadow mapping and picked on the GPU
//! through identity colors.
//!
//! ## Modules
//!
//! - [`util`] - Math re-exports, viewport rectangles, errors
//! - [`data`] - Row-structured data grid with change events, text loader
//! - [`render`] - Render item cache, picking codec, scene pipeline, backend traits
//! - [`camera`] - Orbit camera model
//! - [`interaction`] - Pointer/touch state machine
//! - [`settings`] - Persistent settings
//!
//! ## Example
//!
//! ```ignore
//! use mapbars::prelude::*;
//!
//! let mut data = mapbars::data::loader::load("rainfall.txt".as_ref())?;
//! let area = AreaSpecs::new(data.area.x, data.area.y);
//! let mut pipeline = ScenePipeline::new(SceneConfig::default(), area);
//! pipeline.resize(&mut backend, 1280, 800);
//!
//! let camera = CameraModel::new();
//! let report = pipeline.render_frame(&mut backend, &mut data.grid, &mut labels, &camera, None)?;
//! ```

pub mod util;
pub mod data;
pub mod render;
pub mod camera;
pub mod interaction;
pub mod settings;

// Viewer application (optional, enabled with "viewer" feature)
#[cfg(feature = "viewer")]
pub mod viewer;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, ViewportRect};
    pub use crate::data::{DataGrid, DataItem, DataProxy, GridEvent};
    pub use crate::render::{
        AreaSpecs, GpuBackend, LabelDrawer, RenderItemCache, SceneConfig, ScenePipeline, ShadowQuality,
    };
    pub use crate::camera::CameraModel;
    pub use crate::interaction::{InteractionController, PointerButton, PointerState};
    pub use crate::settings::Settings;
}
