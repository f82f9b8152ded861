//! Data side of the engine: items, the sparse grid and its change events.
//!
//! - [`DataGrid`] - owned rows with add/insert/remove/replace operations
//! - [`GridEvent`] - change notifications drained by the render cache
//! - [`DataProxy`] - the read interface the renderer consumes
//! - [`loader`] - text file loading

mod events;
mod grid;
mod item;
mod labels;
pub mod loader;

pub use events::GridEvent;
pub use grid::{DataGrid, DataProxy, Limits};
pub use item::{DataArray, DataItem, DataRow};
pub use labels::fix_row_labels;
