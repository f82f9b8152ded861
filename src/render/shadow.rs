//! Shadow quality levels.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ShadowQuality {
    None,
    Low,
    #[default]
    Medium,
    High,
}

impl ShadowQuality {
    pub const ALL: [ShadowQuality; 4] = [Self::None, Self::Low, Self::Medium, Self::High];

    pub fn is_enabled(self) -> bool {
        self != Self::None
    }

    /// One level lower; `None` is terminal.
    pub fn downgrade(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low | Self::None => Self::None,
        }
    }

    /// Value fed to the `shadow_quality` uniform (PCF offset divisor).
    pub fn shader_factor(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Low => 33.3,
            Self::Medium => 100.0,
            Self::High => 200.0,
        }
    }

    /// Depth target size relative to the scene viewport.
    pub fn texture_multiplier(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Medium => 3,
            Self::High => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "no",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}
