//! Mesh catalog identifiers.

use serde::{Deserialize, Serialize};

/// Glyph shape drawn for every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeshStyle {
    #[default]
    Bars,
    Pyramids,
    Cones,
    Cylinders,
    BevelBars,
    Spheres,
}

impl MeshStyle {
    pub const ALL: [MeshStyle; 6] = [
        Self::Bars,
        Self::Pyramids,
        Self::Cones,
        Self::Cylinders,
        Self::BevelBars,
        Self::Spheres,
    ];

    /// Identifier passed to the mesh provider.
    pub fn mesh_id(self, smooth: bool) -> &'static str {
        match (self, smooth) {
            (Self::Bars, false) => "bar",
            (Self::Bars, true) => "barSmooth",
            (Self::Pyramids, false) => "pyramid",
            (Self::Pyramids, true) => "pyramidSmooth",
            (Self::Cones, false) => "cone",
            (Self::Cones, true) => "coneSmooth",
            (Self::Cylinders, false) => "cylinder",
            (Self::Cylinders, true) => "cylinderSmooth",
            (Self::BevelBars, false) => "bevelbar",
            (Self::BevelBars, true) => "bevelbarSmooth",
            (Self::Spheres, false) => "sphere",
            (Self::Spheres, true) => "sphereSmooth",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bars => "Bars",
            Self::Pyramids => "Pyramids",
            Self::Cones => "Cones",
            Self::Cylinders => "Cylinders",
            Self::BevelBars => "Bevel bars",
            Self::Spheres => "Spheres",
        }
    }
}

/// Flat quad under the items, textured with the background image.
pub const BACKGROUND_MESH_ID: &str = "background";
