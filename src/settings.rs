//! Persistent application settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::{AreaSpecs, SceneConfig};
use crate::util::Result;

/// Settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Scene
    pub scene: SceneConfig,
    pub area: AreaSpecs,

    // Window
    pub window_width: f32,
    pub window_height: f32,
    pub side_panel_width: f32,

    // Camera
    pub camera_horizontal: f32,
    pub camera_vertical: f32,
    pub camera_zoom: f32,

    // Input
    pub touch_input: bool,

    // Last opened files
    pub last_data_file: Option<PathBuf>,
    pub last_background_file: Option<PathBuf>,

    // Recent data files (most recent first, max 10)
    pub recent_files: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            area: AreaSpecs::default(),
            window_width: 1280.0,
            window_height: 800.0,
            side_panel_width: 220.0,
            camera_horizontal: 0.0,
            camera_vertical: 45.0,
            camera_zoom: 100.0,
            touch_input: false,
            last_data_file: None,
            last_background_file: None,
            recent_files: Vec::new(),
        }
    }
}

const MAX_RECENT_FILES: usize = 10;

impl Settings {
    /// Settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("mapbars");
            p.push("settings.json");
            p
        })
    }

    /// Load from the user config dir, defaults when missing or unreadable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Ignoring settings file {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&text)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save to the user config dir; failures are logged
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(e) = self.save_to(&path) {
                tracing::warn!("Failed to save settings to {}: {}", path.display(), e);
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn sanitize(&mut self) {
        use crate::camera::{HORIZONTAL_LIMIT, MAX_VERTICAL, MAX_ZOOM, MIN_VERTICAL, MIN_ZOOM};

        self.camera_horizontal = self.camera_horizontal.clamp(-HORIZONTAL_LIMIT, HORIZONTAL_LIMIT);
        self.camera_vertical = self.camera_vertical.clamp(MIN_VERTICAL, MAX_VERTICAL);
        self.camera_zoom = self.camera_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if self.scene.font_size.is_nan() || self.scene.font_size <= 0.0 {
            self.scene.font_size = SceneConfig::default().font_size;
        }
        if self.area.width <= 0.0 || self.area.height <= 0.0 {
            self.area = AreaSpecs::default();
        }
    }

    /// Add file to recent files list (moves to top if already present)
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path.clone());
        self.recent_files.truncate(MAX_RECENT_FILES);
        self.last_data_file = Some(path);
    }

    /// Recent files that still exist
    pub fn recent_files(&self) -> Vec<&PathBuf> {
        self.recent_files.iter().filter(|p| p.exists()).collect()
    }
}
