//! Utility types shared across the engine.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and viewport geometry

mod error;
mod math;

pub use error::*;
pub use math::*;
