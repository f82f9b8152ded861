//! Color themes and label styling.

use serde::{Deserialize, Serialize};

use crate::util::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorTheme {
    #[default]
    Default,
    Light,
    Dark,
    ArmyBlue,
    HighContrast,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 5] = [
        Self::Default,
        Self::Light,
        Self::Dark,
        Self::ArmyBlue,
        Self::HighContrast,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::ArmyBlue => "Army Blue",
            Self::HighContrast => "High Contrast",
        }
    }
}

/// How the label background is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LabelTransparency {
    /// Opaque background
    None,
    /// Background alpha from the theme
    #[default]
    FromTheme,
    /// Text only
    NoBackground,
}

/// Colors and light strengths used by the color and label passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub window_color: [f32; 3],
    pub base_color: [f32; 3],
    /// Added to the base color scaled by item height
    pub height_color: [f32; 3],
    pub highlight_bar_color: [f32; 3],
    pub text_color: [f32; 3],
    pub text_background_color: [f32; 4],
    pub ambient_strength: f32,
    pub light_strength: f32,
    pub highlight_light_strength: f32,
    /// Uniform color, or darker toward the base of each bar
    pub uniform_color: bool,
}

impl Theme {
    pub fn from_color_theme(theme: ColorTheme) -> Self {
        let default = Self {
            window_color: [0.92, 0.92, 0.92],
            base_color: [0.45, 0.45, 0.45],
            height_color: [0.35, 0.35, 0.35],
            highlight_bar_color: [1.0, 0.0, 0.0],
            text_color: [0.0, 0.0, 0.0],
            text_background_color: [1.0, 1.0, 1.0, 0.63],
            ambient_strength: 0.3,
            light_strength: 4.0,
            highlight_light_strength: 8.0,
            uniform_color: true,
        };
        match theme {
            ColorTheme::Default => default,
            ColorTheme::Light => Self {
                window_color: [1.0, 1.0, 1.0],
                base_color: [0.55, 0.65, 0.8],
                height_color: [0.2, 0.2, 0.15],
                highlight_bar_color: [0.93, 0.5, 0.1],
                ambient_strength: 0.5,
                ..default
            },
            ColorTheme::Dark => Self {
                window_color: [0.1, 0.1, 0.12],
                base_color: [0.2, 0.45, 0.6],
                height_color: [0.3, 0.3, 0.2],
                highlight_bar_color: [0.95, 0.85, 0.2],
                text_color: [0.9, 0.9, 0.9],
                text_background_color: [0.1, 0.1, 0.1, 0.63],
                ..default
            },
            ColorTheme::ArmyBlue => Self {
                window_color: [0.84, 0.84, 0.84],
                base_color: [0.29, 0.37, 0.46],
                height_color: [0.43, 0.37, 0.31],
                highlight_bar_color: [0.98, 0.96, 0.84],
                text_color: [0.2, 0.2, 0.2],
                ..default
            },
            ColorTheme::HighContrast => Self {
                window_color: [0.0, 0.0, 0.0],
                base_color: [0.92, 0.7, 0.0],
                height_color: [0.0, 0.0, 0.0],
                highlight_bar_color: [0.0, 0.8, 1.0],
                text_color: [1.0, 1.0, 1.0],
                text_background_color: [0.0, 0.0, 0.0, 1.0],
                ambient_strength: 0.5,
                light_strength: 5.0,
                highlight_light_strength: 10.0,
                uniform_color: true,
            },
        }
    }

    /// Shaded color of a non-selected item.
    pub fn item_color(&self, height: f32) -> Vec3 {
        Vec3::from(self.base_color) + Vec3::from(self.height_color) * height
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_color_theme(ColorTheme::Default)
    }
}
