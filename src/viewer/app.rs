//! Main application state and UI

use std::path::PathBuf;

use egui::{CentralPanel, RichText, SidePanel, TopBottomPanel};

use super::background::{self, IMAGE_EXTENSIONS};
use super::viewport::Viewport;
use crate::camera::{CameraPreset, MAX_ZOOM, MIN_ZOOM};
use crate::data::loader::{self, LoadedData};
use crate::data::{DataGrid, DataProxy};
use crate::render::{
    AdjustmentDirection, AreaSpecs, ColorTheme, LabelTransparency, MeshStyle, ScenePipeline, SelectionMode,
    ShadowQuality,
};
use crate::settings::Settings;
use crate::util::Vec3;

/// Data file extensions offered by the open dialog
const DATA_EXTENSIONS: [&str; 3] = ["txt", "csv", "dat"];

const ADJUSTMENTS: [AdjustmentDirection; 5] = [
    AdjustmentDirection::Height,
    AdjustmentDirection::Width,
    AdjustmentDirection::Depth,
    AdjustmentDirection::Radius,
    AdjustmentDirection::All,
];

fn transparency_name(t: LabelTransparency) -> &'static str {
    match t {
        LabelTransparency::None => "Opaque",
        LabelTransparency::FromTheme => "Theme",
        LabelTransparency::NoBackground => "No background",
    }
}

pub struct MapbarsApp {
    viewport: Viewport,
    pipeline: ScenePipeline,
    grid: DataGrid,
    settings: Settings,
    current_file: Option<PathBuf>,
    pending_file: Option<PathBuf>,
    pending_background: Option<PathBuf>,
    background_name: Option<String>,
    skipped_lines: usize,
    status_message: String,
    /// Set when the backend was created this session
    backend_ready: bool,
    _trace_guard: Option<tracing_chrome::FlushGuard>,
}

impl MapbarsApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        initial_file: Option<PathBuf>,
        trace_guard: Option<tracing_chrome::FlushGuard>,
    ) -> Self {
        let settings = Settings::load();

        let mut viewport = Viewport::new(settings.touch_input);
        viewport.camera.set_camera_position(
            settings.camera_horizontal,
            settings.camera_vertical,
            settings.camera_zoom,
        );

        // Use last file if no initial file provided
        let pending_file = initial_file.or_else(|| settings.last_data_file.clone());
        let pending_background = settings.last_background_file.clone().filter(|p| p.exists());

        let mut app = Self {
            viewport,
            pipeline: ScenePipeline::new(settings.scene.clone(), settings.area),
            grid: DataGrid::new(),
            settings,
            current_file: None,
            pending_file,
            pending_background,
            background_name: None,
            skipped_lines: 0,
            status_message: "Ready".into(),
            backend_ready: false,
            _trace_guard: trace_guard,
        };
        if app.pending_file.is_none() {
            app.apply_data(loader::demo_rainfall());
            app.status_message = "Showing demo data".into();
        }
        app
    }

    fn apply_data(&mut self, data: LoadedData) {
        let LoadedData { grid, area, skipped } = data;
        let area = AreaSpecs::new(area.x.max(1.0), area.y.max(1.0));
        // The new grid carries its own reset notification
        self.grid = grid;
        self.skipped_lines = skipped;
        self.pipeline.set_area(area);
        self.pipeline.refresh_labels();
        self.settings.area = area;
    }

    fn load_file(&mut self, path: PathBuf) {
        self.status_message = format!("Loading: {}", path.display());
        match loader::load(&path) {
            Ok(data) => {
                let rows = data.grid.row_count();
                let skipped = data.skipped;
                self.apply_data(data);
                self.current_file = Some(path.clone());
                self.settings.last_data_file = Some(path.clone());
                self.settings.add_recent(path);
                self.settings.save();
                self.status_message = if skipped > 0 {
                    format!("Loaded {} rows, {} invalid lines skipped", rows, skipped)
                } else {
                    format!("Loaded {} rows", rows)
                };
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                self.status_message = format!("Error: {}", e);
            }
        }
    }

    fn load_demo(&mut self) {
        self.apply_data(loader::demo_rainfall());
        self.current_file = None;
        self.settings.last_data_file = None;
        self.settings.save();
        self.status_message = "Showing demo data".into();
    }

    fn load_background(&mut self, path: PathBuf) {
        let Some(backend) = self.viewport.backend.as_mut() else {
            self.status_message = "Renderer not initialized".into();
            return;
        };
        match background::load_background(&path) {
            Ok(image) => {
                self.pipeline.set_background(backend, Some(&image));
                if self.pipeline.has_background() {
                    self.background_name = path.file_name().map(|n| n.to_string_lossy().to_string());
                    self.status_message = format!("Background: {}x{}", image.width, image.height);
                    self.settings.last_background_file = Some(path);
                } else {
                    self.status_message = "Background image too large".into();
                }
                self.settings.save();
            }
            Err(e) => {
                self.status_message = format!("Failed to load background: {}", e);
            }
        }
    }

    fn clear_background(&mut self) {
        if let Some(backend) = self.viewport.backend.as_mut() {
            self.pipeline.set_background(backend, None);
        }
        self.background_name = None;
        self.settings.last_background_file = None;
        self.settings.save();
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Data", &DATA_EXTENSIONS)
            .pick_file()
        {
            self.load_file(path);
        }
    }

    fn open_background_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.load_background(path);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        // Collect recent files to avoid borrow issues
        let recent: Vec<PathBuf> = self.settings.recent_files().into_iter().cloned().collect();

        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open...").clicked() {
                    self.open_file_dialog();
                    ui.close();
                }
                if ui.button("Demo Data").clicked() {
                    self.load_demo();
                    ui.close();
                }

                if !recent.is_empty() {
                    ui.menu_button("Recent", |ui| {
                        for path in &recent {
                            let name = path
                                .file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_else(|| path.display().to_string());
                            if ui.button(&name).clicked() {
                                self.pending_file = Some(path.clone());
                                ui.close();
                            }
                        }
                        ui.separator();
                        if ui.button("Clear Recent").clicked() {
                            self.settings.recent_files.clear();
                            self.settings.save();
                            ui.close();
                        }
                    });
                }

                ui.separator();
                if ui.button("Background Image...").clicked() {
                    self.open_background_dialog();
                    ui.close();
                }
                if ui
                    .add_enabled(self.background_name.is_some(), egui::Button::new("Clear Background"))
                    .clicked()
                {
                    self.clear_background();
                    ui.close();
                }

                ui.separator();
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset Camera").clicked() {
                    self.viewport.camera.reset_rotation();
                    ui.close();
                }
                ui.menu_button("Presets", |ui| {
                    for preset in CameraPreset::ALL {
                        if ui.button(preset.name()).clicked() {
                            self.viewport.camera.apply_preset(preset);
                            ui.close();
                        }
                    }
                });
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    self.status_message = format!(
                        "mapbars {} (built {})",
                        env!("CARGO_PKG_VERSION"),
                        env!("MAPBARS_BUILD_DATE")
                    );
                    ui.close();
                }
            });
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Data");
        ui.separator();

        match &self.current_file {
            Some(path) => ui.label(format!("File: {}", path.file_name().unwrap_or_default().to_string_lossy())),
            None => ui.label("Demo data"),
        };
        let limits = self.grid.limits();
        ui.label(format!("Rows: {}", self.grid.row_count()));
        ui.label(format!("Items: {}", self.pipeline.cache().items().len()));
        if self.skipped_lines > 0 {
            ui.label(format!("Skipped lines: {}", self.skipped_lines));
        }
        ui.label(format!("Range: {:.1} .. {:.1}", limits.min, limits.max));

        ui.separator();
        self.selection_section(ui);

        ui.separator();
        egui::CollapsingHeader::new("Appearance")
            .default_open(true)
            .show(ui, |ui| self.appearance_section(ui));

        egui::CollapsingHeader::new("Camera")
            .default_open(true)
            .show(ui, |ui| self.camera_section(ui));

        egui::CollapsingHeader::new("Labels")
            .default_open(false)
            .show(ui, |ui| self.label_section(ui));

        ui.separator();
        if ui.checkbox(&mut self.settings.touch_input, "Touch input").changed() {
            self.viewport.interaction.set_touch(self.settings.touch_input);
            self.settings.save();
        }
    }

    fn selection_section(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Selection").strong());
        let mut picking = self.pipeline.config().selection_mode == SelectionMode::Item;
        if ui.checkbox(&mut picking, "Item picking").changed() {
            let mode = if picking { SelectionMode::Item } else { SelectionMode::None };
            self.pipeline.set_selection_mode(mode);
        }
        let mut zoom = self.pipeline.is_zoom_active();
        if ui.checkbox(&mut zoom, "Zoom view").changed() {
            self.pipeline.set_zoom_active(zoom);
        }
        match self.pipeline.selected_item() {
            Some(item) => {
                ui.label(item.label_text());
                ui.label(format!("Row {}, column {}", item.source.0, item.source.1));
            }
            None => {
                ui.label("Nothing selected");
            }
        }
    }

    fn appearance_section(&mut self, ui: &mut egui::Ui) {
        let Some(backend) = self.viewport.backend.as_mut() else {
            ui.label("Renderer not initialized");
            return;
        };
        let config = self.pipeline.config().clone();

        let mut theme = config.color_theme;
        egui::ComboBox::from_label("Theme")
            .selected_text(theme.name())
            .show_ui(ui, |ui| {
                for t in ColorTheme::ALL {
                    ui.selectable_value(&mut theme, t, t.name());
                }
            });
        if theme != config.color_theme {
            if let Err(e) = self.pipeline.set_theme(backend, theme) {
                self.status_message = format!("Theme change failed: {}", e);
            }
        }

        let mut uniform = self.pipeline.theme().uniform_color;
        if ui.checkbox(&mut uniform, "Uniform bar color").changed() {
            let t = self.pipeline.theme().clone();
            if let Err(e) = self.pipeline.set_bar_color(backend, t.base_color, t.height_color, uniform) {
                self.status_message = format!("Bar color change failed: {}", e);
            }
        }

        let mut style = config.mesh_style;
        let mut smooth = config.smooth_mesh;
        egui::ComboBox::from_label("Mesh")
            .selected_text(style.name())
            .show_ui(ui, |ui| {
                for s in MeshStyle::ALL {
                    ui.selectable_value(&mut style, s, s.name());
                }
            });
        ui.checkbox(&mut smooth, "Smooth");
        if style != config.mesh_style || smooth != config.smooth_mesh {
            if let Err(e) = self.pipeline.set_mesh_style(backend, style, smooth) {
                self.status_message = format!("Mesh change failed: {}", e);
            }
        }

        let mut quality = config.shadow_quality;
        egui::ComboBox::from_label("Shadows")
            .selected_text(format!("{:?}", quality))
            .show_ui(ui, |ui| {
                for q in ShadowQuality::ALL {
                    ui.selectable_value(&mut quality, q, format!("{:?}", q));
                }
            });
        if quality != config.shadow_quality {
            let outcome = self.pipeline.set_shadow_quality(backend, quality);
            if outcome.shadow_quality != quality {
                self.status_message = format!("Shadow quality lowered to {:?}", outcome.shadow_quality);
            }
        }

        let mut thickness = config.bar_thickness[0];
        let mut adjustment = config.adjustment;
        ui.add(egui::Slider::new(&mut thickness, 0.1..=1.0).text("Thickness"));
        egui::ComboBox::from_label("Scale axis")
            .selected_text(format!("{:?}", adjustment))
            .show_ui(ui, |ui| {
                for a in ADJUSTMENTS {
                    ui.selectable_value(&mut adjustment, a, format!("{:?}", a));
                }
            });
        if thickness != config.bar_thickness[0] || adjustment != config.adjustment {
            self.pipeline.set_bar_specs(Vec3::splat(thickness), adjustment);
        }
    }

    fn camera_section(&mut self, ui: &mut egui::Ui) {
        let camera = &mut self.viewport.camera;
        let (horizontal, vertical) = camera.rotation();
        ui.label(format!("Rotation: {:.0}°, {:.0}°", horizontal, vertical));

        let mut zoom = camera.zoom_level();
        if ui
            .add(egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM).text("Zoom %"))
            .changed()
        {
            camera.set_zoom_level(zoom);
        }

        ui.horizontal_wrapped(|ui| {
            for preset in CameraPreset::ALL {
                if ui.small_button(preset.name()).clicked() {
                    camera.apply_preset(preset);
                }
            }
        });
    }

    fn label_section(&mut self, ui: &mut egui::Ui) {
        let config = self.pipeline.config().clone();

        let mut font_size = config.font_size;
        if ui
            .add(egui::Slider::new(&mut font_size, 10.0..=80.0).text("Font size"))
            .changed()
        {
            self.pipeline.set_font_size(font_size);
        }

        let mut transparency = config.label_transparency;
        egui::ComboBox::from_label("Background")
            .selected_text(transparency_name(transparency))
            .show_ui(ui, |ui| {
                for t in [
                    LabelTransparency::None,
                    LabelTransparency::FromTheme,
                    LabelTransparency::NoBackground,
                ] {
                    ui.selectable_value(&mut transparency, t, transparency_name(t));
                }
            });
        if transparency != config.label_transparency {
            self.pipeline.set_label_transparency(transparency);
        }
        ui.label(format!("Labels generated: {}", self.viewport.labels_generated()));
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status_message);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("FPS: {:.0}", ui.ctx().input(|i| 1.0 / i.stable_dt)));
                if let Some(report) = &self.viewport.last_report {
                    ui.label(format!("Draws: {}", report.color_draws));
                }
            });
        });
    }

    fn store_session(&mut self) {
        let (horizontal, vertical) = self.viewport.camera.rotation();
        self.settings.camera_horizontal = horizontal;
        self.settings.camera_vertical = vertical;
        self.settings.camera_zoom = self.viewport.camera.zoom_level();
        self.settings.scene = self.pipeline.config().clone();
    }
}

impl eframe::App for MapbarsApp {
    fn on_exit(&mut self) {
        self.store_session();
        self.settings.save();
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let _span = tracing::info_span!("viewer_update").entered();

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }
        // H = Home camera
        if ctx.input(|i| i.key_pressed(egui::Key::H)) {
            self.viewport.camera.reset_rotation();
            self.status_message = "Camera reset".into();
        }
        // Z = Toggle zoom view
        if ctx.input(|i| i.key_pressed(egui::Key::Z)) {
            let active = !self.pipeline.is_zoom_active();
            self.pipeline.set_zoom_active(active);
        }

        // Initialize backend if needed
        if !self.backend_ready {
            if let Some(render_state) = frame.wgpu_render_state() {
                self.viewport
                    .init_backend(&render_state.device, &render_state.queue, render_state.target_format);
                self.backend_ready = true;
                // Ensure settings file exists
                self.settings.save();
            }
        }

        if self.backend_ready {
            if let Some(path) = self.pending_file.take() {
                self.load_file(path);
            }
            if let Some(path) = self.pending_background.take() {
                self.load_background(path);
            }
        }

        if let Some(outcome) = self.viewport.last_downgrade.take() {
            self.status_message = format!("Shadow quality lowered to {:?}", outcome.shadow_quality);
        }

        TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        let response = SidePanel::right("side_panel")
            .default_width(self.settings.side_panel_width)
            .min_width(150.0)
            .max_width(400.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.side_panel(ui));
            });
        // Save panel width on resize
        if response.response.rect.width() != self.settings.side_panel_width {
            self.settings.side_panel_width = response.response.rect.width();
        }

        CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let render_state = frame.wgpu_render_state();
                self.viewport.show(ui, render_state, &mut self.pipeline, &mut self.grid);
            });

        ctx.input(|i| {
            if let Some(rect) = i.viewport().inner_rect {
                self.settings.window_width = rect.width();
                self.settings.window_height = rect.height();
            }
        });

        // Rotation and picking change what is drawn while a button is held
        if ctx.input(|i| i.pointer.any_down()) {
            ctx.request_repaint();
        }
    }
}
