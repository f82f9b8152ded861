//! Frame orchestration.
//!
//! [`ScenePipeline`] owns the render item cache and every piece of
//! per-scene state (viewports, off-screen targets, selection). One call to
//! [`ScenePipeline::render_frame`] runs
//! `Idle -> DepthPass -> SelectionPass -> ColorPass -> LabelPass -> Idle`,
//! skipping the passes that are disabled.

use serde::{Deserialize, Serialize};

use super::adjust::{AdjustmentDirection, AxisScaling};
use super::backend::{
    BackgroundImage, CullFace, GpuBackend, LabelDrawer, LabelStyle, MeshHandle, MeshSlot, PassDescriptor,
    PassKind, PassTarget, ProgramId, TextureId,
};
use super::cache::{AreaSpecs, RenderItemCache};
use super::mesh::{MeshStyle, BACKGROUND_MESH_ID};
use super::passes::{self, FrameContext};
use super::picking::{self, PickColor, SKIP_COLOR};
use super::shadow::ShadowQuality;
use super::theme::{ColorTheme, LabelTransparency, Theme};
use super::DEFAULT_RATIO;
use crate::camera::CameraModel;
use crate::data::DataProxy;
use crate::util::{Error, Result, Vec3, ViewportRect};

/// Whether pointer picking is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    None,
    #[default]
    Item,
}

/// User-facing scene configuration. Persisted as part of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub shadow_quality: ShadowQuality,
    pub color_theme: ColorTheme,
    pub mesh_style: MeshStyle,
    pub smooth_mesh: bool,
    /// Item footprint in data units (x, y, z)
    pub bar_thickness: [f32; 3],
    pub adjustment: AdjustmentDirection,
    pub selection_mode: SelectionMode,
    pub label_transparency: LabelTransparency,
    pub font_size: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shadow_quality: ShadowQuality::Medium,
            color_theme: ColorTheme::Default,
            mesh_style: MeshStyle::Bars,
            smooth_mesh: false,
            bar_thickness: [0.8; 3],
            adjustment: AdjustmentDirection::Height,
            selection_mode: SelectionMode::Item,
            label_transparency: LabelTransparency::FromTheme,
            font_size: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStage {
    #[default]
    Idle,
    DepthPass,
    SelectionPass,
    ColorPass,
    LabelPass,
}

/// What one frame did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Executed stages in order
    pub passes: Vec<FrameStage>,
    pub depth_draws: usize,
    pub selection_draws: usize,
    pub color_draws: usize,
    /// Item decoded from a pixel read this frame
    pub picked: Option<usize>,
    /// Item highlighted and labeled this frame
    pub selected: Option<usize>,
    pub label_regenerated: bool,
    /// Cache was rebuilt at the start of the frame
    pub rebuilt: bool,
}

/// Shadow quality after (re)creating the depth target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResizeOutcome {
    pub shadow_quality: ShadowQuality,
    /// Every downgrade step taken, (from, to)
    pub downgrades: Vec<(ShadowQuality, ShadowQuality)>,
}

#[derive(Debug, Clone, Copy)]
struct BackgroundTexture {
    texture: TextureId,
    has_alpha: bool,
}

pub struct ScenePipeline {
    config: SceneConfig,
    theme: Theme,
    cache: RenderItemCache,
    stage: FrameStage,
    initialized: bool,

    window: ViewportRect,
    scene_viewport: ViewportRect,
    zoom_viewport: ViewportRect,
    zoom_active: bool,
    auto_scale_adjustment: f32,

    item_mesh: Option<MeshHandle>,
    background_mesh: Option<MeshHandle>,
    background: Option<BackgroundTexture>,
    selection_target: Option<TextureId>,
    depth_target: Option<TextureId>,

    selection_color: PickColor,
    selected: Option<usize>,
    previously_selected: Option<usize>,
    labels_need_refresh: bool,
}

impl ScenePipeline {
    pub fn new(config: SceneConfig, area: AreaSpecs) -> Self {
        Self {
            theme: Theme::from_color_theme(config.color_theme),
            config,
            cache: RenderItemCache::new(area),
            stage: FrameStage::Idle,
            initialized: false,
            window: ViewportRect::default(),
            scene_viewport: ViewportRect::default(),
            zoom_viewport: ViewportRect::default(),
            zoom_active: false,
            auto_scale_adjustment: 1.0,
            item_mesh: None,
            background_mesh: None,
            background: None,
            selection_target: None,
            depth_target: None,
            selection_color: SKIP_COLOR,
            selected: None,
            previously_selected: None,
            labels_need_refresh: true,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn cache(&self) -> &RenderItemCache {
        &self.cache
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn shadow_quality(&self) -> ShadowQuality {
        self.config.shadow_quality
    }

    pub fn scene_viewport(&self) -> ViewportRect {
        self.scene_viewport
    }

    pub fn zoom_viewport(&self) -> ViewportRect {
        self.zoom_viewport
    }

    pub fn is_zoom_active(&self) -> bool {
        self.zoom_active
    }

    pub fn auto_scale_adjustment(&self) -> f32 {
        self.auto_scale_adjustment
    }

    /// Item selected in the last frame.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&super::RenderItem> {
        self.selected.and_then(|i| self.cache.item(i))
    }

    pub fn labels_need_refresh(&self) -> bool {
        self.labels_need_refresh
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Item mesh currently loaded, `None` before initialization.
    pub fn item_mesh(&self) -> Option<MeshHandle> {
        self.item_mesh
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Load programs and meshes. Called by the first frame when skipped.
    pub fn initialize(&mut self, backend: &mut dyn GpuBackend) -> Result<()> {
        self.load_programs(backend)?;
        self.load_item_mesh(backend)?;
        self.background_mesh = Some(backend.load_mesh(MeshSlot::Background, BACKGROUND_MESH_ID)?);
        self.initialized = true;
        tracing::debug!(
            shadows = self.config.shadow_quality.name(),
            mesh = self.config.mesh_style.name(),
            "scene pipeline initialized"
        );
        Ok(())
    }

    fn load_programs(&mut self, backend: &mut dyn GpuBackend) -> Result<()> {
        let shadows = self.config.shadow_quality.is_enabled();
        backend.load_program(ProgramId::Depth)?;
        backend.load_program(ProgramId::Selection)?;
        backend.load_program(ProgramId::Item {
            shadows,
            uniform_color: self.theme.uniform_color,
        })?;
        backend.load_program(ProgramId::Background { shadows })?;
        Ok(())
    }

    fn load_item_mesh(&mut self, backend: &mut dyn GpuBackend) -> Result<()> {
        let id = self.config.mesh_style.mesh_id(self.config.smooth_mesh);
        self.item_mesh = Some(backend.load_mesh(MeshSlot::Item, id)?);
        Ok(())
    }

    /// Window resize: viewports, auto scale and both off-screen targets.
    pub fn resize(&mut self, backend: &mut dyn GpuBackend, width: u32, height: u32) -> ResizeOutcome {
        self.window = ViewportRect::sized(width, height);
        self.update_viewports();
        self.auto_scale_adjustment = if height == 0 {
            1.0
        } else {
            (DEFAULT_RATIO * (width as f32 / height as f32)).min(1.0)
        };

        if let Some(old) = self.selection_target.take() {
            backend.delete_texture(old);
        }
        if !self.window.is_empty() {
            self.selection_target = backend.create_selection_target(width, height);
            if self.selection_target.is_none() {
                tracing::warn!(width, height, "Creating selection target failed; picking disabled");
            }
        }

        let outcome = self.update_depth_target(backend);
        if !outcome.downgrades.is_empty() && self.initialized {
            if let Err(e) = self.load_programs(backend) {
                tracing::error!("Reloading programs after shadow downgrade failed: {}", e);
            }
        }
        outcome
    }

    /// Recreate the depth target for the current quality, stepping the
    /// quality down until creation succeeds.
    fn update_depth_target(&mut self, backend: &mut dyn GpuBackend) -> ResizeOutcome {
        if let Some(old) = self.depth_target.take() {
            backend.delete_texture(old);
        }

        let mut downgrades = Vec::new();
        let mut quality = self.config.shadow_quality;
        while quality.is_enabled() && !self.window.is_empty() {
            let size = self.window.scaled(quality.texture_multiplier());
            match backend.create_depth_target(size.width, size.height) {
                Some(target) => {
                    self.depth_target = Some(target);
                    break;
                }
                None => {
                    let next = quality.downgrade();
                    tracing::warn!(
                        "Creating {} quality shadows failed. Changing to {} quality.",
                        quality.name(),
                        next.name()
                    );
                    downgrades.push((quality, next));
                    quality = next;
                }
            }
        }
        self.config.shadow_quality = quality;

        ResizeOutcome {
            shadow_quality: quality,
            downgrades,
        }
    }

    fn update_viewports(&mut self) {
        let (w, h) = (self.window.width, self.window.height);
        self.scene_viewport = if self.zoom_active {
            ViewportRect::new(0, h - h / 5, w / 5, h / 5)
        } else {
            self.window
        };
        self.zoom_viewport = self.window;
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Change shadow quality; the depth target and programs follow at once.
    pub fn set_shadow_quality(&mut self, backend: &mut dyn GpuBackend, quality: ShadowQuality) -> ResizeOutcome {
        self.config.shadow_quality = quality;
        let outcome = self.update_depth_target(backend);
        if self.initialized {
            if let Err(e) = self.load_programs(backend) {
                tracing::error!("Reloading programs for {} shadows failed: {}", quality.name(), e);
            }
        }
        outcome
    }

    pub fn set_theme(&mut self, backend: &mut dyn GpuBackend, theme: ColorTheme) -> Result<()> {
        self.config.color_theme = theme;
        self.theme = Theme::from_color_theme(theme);
        self.labels_need_refresh = true;
        if self.initialized {
            self.load_programs(backend)?;
        }
        Ok(())
    }

    /// Override the theme's bar colors. `uniform` picks the flat program
    /// over the one that darkens toward the base.
    pub fn set_bar_color(
        &mut self,
        backend: &mut dyn GpuBackend,
        base: [f32; 3],
        height: [f32; 3],
        uniform: bool,
    ) -> Result<()> {
        self.theme.base_color = base;
        self.theme.height_color = height;
        if self.theme.uniform_color != uniform {
            self.theme.uniform_color = uniform;
            if self.initialized {
                self.load_programs(backend)?;
            }
        }
        Ok(())
    }

    pub fn set_mesh_style(&mut self, backend: &mut dyn GpuBackend, style: MeshStyle, smooth: bool) -> Result<()> {
        self.config.mesh_style = style;
        self.config.smooth_mesh = smooth;
        if self.initialized {
            self.load_item_mesh(backend)?;
        }
        Ok(())
    }

    pub fn set_bar_specs(&mut self, thickness: Vec3, adjustment: AdjustmentDirection) {
        self.config.bar_thickness = thickness.to_array();
        self.config.adjustment = adjustment;
    }

    pub fn set_area(&mut self, area: AreaSpecs) {
        self.cache.set_area(area);
    }

    /// Replace the background image; `None` removes it.
    pub fn set_background(&mut self, backend: &mut dyn GpuBackend, image: Option<&BackgroundImage>) {
        if let Some(old) = self.background.take() {
            backend.delete_texture(old.texture);
        }
        let Some(image) = image else { return };
        match backend.create_texture(image) {
            Some(texture) => {
                self.background = Some(BackgroundTexture {
                    texture,
                    has_alpha: image.has_alpha,
                });
            }
            None => tracing::warn!(width = image.width, height = image.height, "Creating background texture failed"),
        }
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.config.selection_mode = mode;
        if mode == SelectionMode::None {
            self.selection_color = SKIP_COLOR;
            self.selected = None;
        }
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.config.font_size = size;
        self.labels_need_refresh = true;
    }

    pub fn set_label_transparency(&mut self, transparency: LabelTransparency) {
        self.config.label_transparency = transparency;
        self.labels_need_refresh = true;
    }

    /// Shrink the scene into the overview rectangle (or restore it).
    pub fn set_zoom_active(&mut self, active: bool) {
        self.zoom_active = active;
        self.update_viewports();
    }

    /// Ask for a label regeneration on the next frame.
    pub fn refresh_labels(&mut self) {
        self.labels_need_refresh = true;
    }

    fn label_style(&self) -> LabelStyle {
        LabelStyle {
            font_size: self.config.font_size,
            transparency: self.config.label_transparency,
            text_color: self.theme.text_color,
            background_color: self.theme.text_background_color,
        }
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Draw one frame.
    ///
    /// `pick` is the pointer position in window pixels when the host wants
    /// the item under it; without it the last picked color is kept.
    pub fn render_frame<P: DataProxy>(
        &mut self,
        backend: &mut dyn GpuBackend,
        proxy: &mut P,
        labels: &mut dyn LabelDrawer,
        camera: &CameraModel,
        pick: Option<(f32, f32)>,
    ) -> Result<FrameReport> {
        if self.stage != FrameStage::Idle {
            return Err(Error::Reentrant);
        }
        let result = self.run_frame(backend, proxy, labels, camera, pick);
        self.stage = FrameStage::Idle;
        if let Err(e) = &result {
            tracing::error!("Frame aborted: {}", e);
        }
        result
    }

    fn run_frame<P: DataProxy>(
        &mut self,
        backend: &mut dyn GpuBackend,
        proxy: &mut P,
        labels: &mut dyn LabelDrawer,
        camera: &CameraModel,
        pick: Option<(f32, f32)>,
    ) -> Result<FrameReport> {
        if !self.initialized {
            self.initialize(backend)?;
        }

        self.cache.sync(proxy);
        let mut report = FrameReport {
            rebuilt: self.cache.rebuild_if_dirty(&*proxy)?,
            ..Default::default()
        };
        // The item at the selected index may carry a new value or label
        if report.rebuilt {
            self.labels_need_refresh = true;
        }

        if self.scene_viewport.is_empty() {
            return Ok(report);
        }

        let _span = tracing::trace_span!("render_frame", items = self.cache.items().len()).entered();
        backend.begin_frame();

        let scaling = AxisScaling::new(
            self.config.adjustment,
            Vec3::from(self.config.bar_thickness),
            self.cache.scale_factor(),
        );
        let shadow_quality = if self.depth_target.is_some() {
            self.config.shadow_quality
        } else {
            ShadowQuality::None
        };
        let ctx = FrameContext::new(
            camera,
            &self.cache,
            scaling,
            self.scene_viewport,
            self.auto_scale_adjustment,
            shadow_quality,
        );

        if let (Some(depth_target), true) = (self.depth_target, ctx.shadows()) {
            self.depth_pass(backend, &ctx, depth_target, &mut report);
        }

        if self.config.selection_mode != SelectionMode::None && !self.zoom_active {
            if let Some(target) = self.selection_target {
                self.selection_pass(backend, &ctx, target, pick, &mut report);
            }
        }

        let highlight = match self.config.selection_mode {
            SelectionMode::None => None,
            SelectionMode::Item => picking::decode(self.selection_color)
                .filter(|&i| self.cache.item(i).is_some_and(|item| item.is_drawable())),
        };
        self.color_pass(backend, &ctx, highlight, &mut report);

        self.selected = if self.zoom_active { None } else { highlight };
        report.selected = self.selected;
        if let Some(index) = self.selected {
            self.label_pass(labels, &ctx, index, &mut report);
        }

        backend.end_frame();
        tracing::trace!(
            passes = report.passes.len(),
            color_draws = report.color_draws,
            selected = ?report.selected,
            "frame done"
        );
        Ok(report)
    }

    fn depth_pass(
        &mut self,
        backend: &mut dyn GpuBackend,
        ctx: &FrameContext,
        target: TextureId,
        report: &mut FrameReport,
    ) {
        self.stage = FrameStage::DepthPass;
        let multiplier = ctx.shadow_quality.texture_multiplier();
        let viewport = ViewportRect::sized(self.scene_viewport.width, self.scene_viewport.height).scaled(multiplier);
        let draws = passes::depth_draws(ctx, &self.cache);
        backend.execute_pass(
            &PassDescriptor {
                kind: PassKind::Depth,
                target: PassTarget::Offscreen(target),
                viewport,
                clear_color: None,
                cull: CullFace::Front,
                dither: false,
                shadow_map: None,
            },
            &draws,
        );
        report.depth_draws = draws.len();
        report.passes.push(FrameStage::DepthPass);
    }

    fn selection_pass(
        &mut self,
        backend: &mut dyn GpuBackend,
        ctx: &FrameContext,
        target: TextureId,
        pick: Option<(f32, f32)>,
        report: &mut FrameReport,
    ) {
        self.stage = FrameStage::SelectionPass;
        let draws = passes::selection_draws(ctx, &self.cache);
        let skip = SKIP_COLOR.to_vec3();
        backend.execute_pass(
            &PassDescriptor {
                kind: PassKind::Selection,
                target: PassTarget::Offscreen(target),
                viewport: self.scene_viewport,
                clear_color: Some([skip.x, skip.y, skip.z, 1.0]),
                cull: CullFace::Back,
                dither: false,
                shadow_map: None,
            },
            &draws,
        );
        report.selection_draws = draws.len();
        report.passes.push(FrameStage::SelectionPass);

        let Some((x, y)) = pick else { return };
        if !self.scene_viewport.contains(x, y) {
            return;
        }
        match backend.read_pixel(target, x as u32, y as u32) {
            Some(pixel) => {
                self.selection_color = PickColor::from_rgba(pixel);
                report.picked = picking::decode(self.selection_color);
            }
            None => tracing::debug!(x, y, "selection readback failed"),
        }
    }

    fn color_pass(
        &mut self,
        backend: &mut dyn GpuBackend,
        ctx: &FrameContext,
        highlight: Option<usize>,
        report: &mut FrameReport,
    ) {
        self.stage = FrameStage::ColorPass;
        let mut draws = Vec::with_capacity(self.cache.items().len() + 1);
        if let (Some(bg), Some(_)) = (self.background, self.background_mesh) {
            draws.push(passes::background_draw(ctx, &self.cache, &self.theme, bg.texture, bg.has_alpha));
        }
        draws.extend(passes::item_draws(ctx, &self.cache, &self.theme, highlight));

        let [r, g, b] = self.theme.window_color;
        backend.execute_pass(
            &PassDescriptor {
                kind: PassKind::Color,
                target: PassTarget::Output,
                viewport: self.scene_viewport,
                clear_color: Some([r, g, b, 1.0]),
                cull: CullFace::Back,
                dither: true,
                shadow_map: if ctx.shadows() { self.depth_target } else { None },
            },
            &draws,
        );
        report.color_draws = draws.len();
        report.passes.push(FrameStage::ColorPass);
    }

    fn label_pass(&mut self, labels: &mut dyn LabelDrawer, ctx: &FrameContext, index: usize, report: &mut FrameReport) {
        let Some(item) = self.cache.item(index) else { return };
        self.stage = FrameStage::LabelPass;

        if self.previously_selected != Some(index) || self.labels_need_refresh {
            labels.generate_label(item, &self.label_style());
            self.previously_selected = Some(index);
            report.label_regenerated = true;
        }
        let placement = passes::label_placement(ctx, item, self.config.label_transparency);
        labels.draw_label(item, &placement);
        self.labels_need_refresh = false;
        report.passes.push(FrameStage::LabelPass);
    }
}

impl std::fmt::Debug for ScenePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenePipeline")
            .field("stage", &self.stage)
            .field("window", &self.window)
            .field("shadow_quality", &self.config.shadow_quality)
            .field("items", &self.cache.items().len())
            .field("selected", &self.selected)
            .finish()
    }
}
