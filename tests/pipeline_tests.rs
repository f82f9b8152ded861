//! Frame-level tests of the scene pipeline against a recording backend.

use mapbars::prelude::*;
use mapbars::render::{
    picking, BackgroundImage, DrawCall, FrameStage, LabelPlacement, LabelStyle, MeshHandle, MeshSlot,
    PassDescriptor, PassKind, PassTarget, ProgramId, RenderItem, SelectionMode, TextureId,
};
use mapbars::util::{Vec2, Vec3};

/// Records every call; texture creation fails past configurable sizes.
#[derive(Default)]
struct RecordingBackend {
    passes: Vec<(PassDescriptor, Vec<DrawCall>)>,
    programs: Vec<ProgramId>,
    meshes: Vec<(MeshSlot, String)>,
    deleted: Vec<TextureId>,
    next_id: u32,
    /// Largest depth target edge that can be created; `None` = unlimited
    max_depth_edge: Option<u32>,
    fail_selection_target: bool,
    /// Color returned by every pixel read
    pixel: Option<[u8; 4]>,
    reads: Vec<(TextureId, u32, u32)>,
    frames: usize,
}

impl RecordingBackend {
    fn new() -> Self {
        Self::default()
    }

    fn pointing_at(index: usize) -> Self {
        let mut backend = Self::new();
        backend.point_at(index);
        backend
    }

    fn point_at(&mut self, index: usize) {
        let c = picking::encode(index);
        self.pixel = Some([c.r, c.g, c.b, 255]);
    }

    fn id(&mut self) -> TextureId {
        self.next_id += 1;
        TextureId(self.next_id)
    }

    fn passes_of(&self, kind: PassKind) -> Vec<&(PassDescriptor, Vec<DrawCall>)> {
        self.passes.iter().filter(|(p, _)| p.kind == kind).collect()
    }

    fn last_color_draws(&self) -> &[DrawCall] {
        self.passes
            .iter()
            .rev()
            .find(|(p, _)| p.kind == PassKind::Color)
            .map(|(_, d)| d.as_slice())
            .unwrap_or(&[])
    }
}

impl GpuBackend for RecordingBackend {
    fn begin_frame(&mut self) {
        self.frames += 1;
    }

    fn load_mesh(&mut self, slot: MeshSlot, id: &str) -> mapbars::Result<MeshHandle> {
        self.meshes.push((slot, id.to_string()));
        Ok(MeshHandle {
            slot,
            vertex_count: 24,
            index_count: 36,
        })
    }

    fn load_program(&mut self, program: ProgramId) -> mapbars::Result<()> {
        self.programs.push(program);
        Ok(())
    }

    fn create_texture(&mut self, _image: &BackgroundImage) -> Option<TextureId> {
        Some(self.id())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.deleted.push(texture);
    }

    fn create_selection_target(&mut self, _width: u32, _height: u32) -> Option<TextureId> {
        if self.fail_selection_target {
            return None;
        }
        Some(self.id())
    }

    fn create_depth_target(&mut self, width: u32, height: u32) -> Option<TextureId> {
        match self.max_depth_edge {
            Some(max) if width > max || height > max => None,
            _ => Some(self.id()),
        }
    }

    fn execute_pass(&mut self, pass: &PassDescriptor, draws: &[DrawCall]) {
        self.passes.push((pass.clone(), draws.to_vec()));
    }

    fn read_pixel(&mut self, target: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        self.reads.push((target, x, y));
        self.pixel
    }
}

#[derive(Default)]
struct RecordingLabels {
    generated: Vec<usize>,
    drawn: Vec<usize>,
    styles: Vec<LabelStyle>,
    placements: Vec<LabelPlacement>,
}

impl LabelDrawer for RecordingLabels {
    fn generate_label(&mut self, item: &RenderItem, style: &LabelStyle) {
        self.generated.push(item.index);
        self.styles.push(style.clone());
    }

    fn draw_label(&mut self, item: &RenderItem, placement: &LabelPlacement) {
        self.drawn.push(item.index);
        self.placements.push(placement.clone());
    }
}

/// One row of items spaced one unit apart along X
fn single_row(values: &[f32]) -> (DataGrid, AreaSpecs) {
    let row = values
        .iter()
        .enumerate()
        .map(|(i, &v)| DataItem::new(v, Vec2::new(i as f32 + 0.5, 0.5)).with_label(format!("item {i}")))
        .collect();
    let mut grid = DataGrid::new();
    grid.add_row(Some(row), None);
    (grid, AreaSpecs::new(values.len() as f32, 1.0))
}

fn config(shadows: ShadowQuality) -> SceneConfig {
    SceneConfig {
        shadow_quality: shadows,
        ..Default::default()
    }
}

struct Scene {
    pipeline: ScenePipeline,
    backend: RecordingBackend,
    labels: RecordingLabels,
    grid: DataGrid,
    camera: CameraModel,
}

impl Scene {
    fn new(values: &[f32], shadows: ShadowQuality, backend: RecordingBackend) -> Self {
        let (grid, area) = single_row(values);
        let mut scene = Self {
            pipeline: ScenePipeline::new(config(shadows), area),
            backend,
            labels: RecordingLabels::default(),
            grid,
            camera: CameraModel::new(),
        };
        scene.pipeline.resize(&mut scene.backend, 800, 600);
        scene
    }

    fn frame(&mut self, pick: Option<(f32, f32)>) -> mapbars::render::FrameReport {
        self.pipeline
            .render_frame(&mut self.backend, &mut self.grid, &mut self.labels, &self.camera, pick)
            .expect("frame failed")
    }
}

#[test]
fn test_first_frame_initializes_and_runs_passes_in_order() {
    let mut scene = Scene::new(&[1.0, 2.0, 3.0], ShadowQuality::Medium, RecordingBackend::new());
    assert!(!scene.pipeline.is_initialized());

    let report = scene.frame(None);
    assert!(scene.pipeline.is_initialized());
    assert!(report.rebuilt);
    assert_eq!(
        report.passes,
        vec![FrameStage::DepthPass, FrameStage::SelectionPass, FrameStage::ColorPass]
    );
    assert_eq!(scene.pipeline.stage(), FrameStage::Idle);

    assert!(scene.backend.programs.contains(&ProgramId::Depth));
    assert!(scene.backend.programs.contains(&ProgramId::Selection));
    assert!(scene.backend.programs.contains(&ProgramId::Item { shadows: true, uniform_color: false })
        || scene.backend.programs.contains(&ProgramId::Item { shadows: true, uniform_color: true }));
    assert!(scene.backend.meshes.contains(&(MeshSlot::Item, "bar".to_string())));
    assert!(scene.backend.meshes.contains(&(MeshSlot::Background, "background".to_string())));

    // Nothing changed: no rebuild on the next frame
    assert!(!scene.frame(None).rebuilt);
}

#[test]
fn test_depth_pass_uses_scaled_offscreen_target() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::Medium, RecordingBackend::new());
    scene.frame(None);

    let depth = scene.backend.passes_of(PassKind::Depth);
    assert_eq!(depth.len(), 1);
    let (pass, draws) = depth[0];
    assert!(matches!(pass.target, PassTarget::Offscreen(_)));
    assert_eq!(pass.viewport, ViewportRect::sized(2400, 1800));
    assert_eq!(draws.len(), 2);
    assert!(draws.iter().all(|d| d.program == ProgramId::Depth));

    let (color, _) = scene.backend.passes_of(PassKind::Color)[0];
    assert_eq!(color.target, PassTarget::Output);
    assert!(color.shadow_map.is_some());
    assert!(color.dither);
}

#[test]
fn test_no_shadows_skips_depth_pass() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::new());
    let report = scene.frame(None);
    assert!(!report.passes.contains(&FrameStage::DepthPass));
    let (color, draws) = scene.backend.passes_of(PassKind::Color)[0];
    assert!(color.shadow_map.is_none());
    assert!(draws.iter().all(|d| matches!(d.program, ProgramId::Item { shadows: false, .. })));
}

#[test]
fn test_zero_and_negative_items_never_drawn() {
    let mut scene = Scene::new(&[0.0, 5.0, -1.0, 3.0], ShadowQuality::Low, RecordingBackend::new());
    let report = scene.frame(None);

    assert_eq!(scene.pipeline.cache().items().len(), 4);
    assert_eq!(report.depth_draws, 2);
    assert_eq!(report.selection_draws, 2);
    assert_eq!(report.color_draws, 2);

    let drawn: Vec<Option<usize>> = scene.backend.last_color_draws().iter().map(|d| d.item).collect();
    assert_eq!(drawn, vec![Some(1), Some(3)]);
}

#[test]
fn test_shadow_downgrade_chain_on_resize() {
    // 800x600: High needs 4000, Medium 2400, Low 800
    let backend = RecordingBackend {
        max_depth_edge: Some(1000),
        ..Default::default()
    };
    let (_, area) = single_row(&[1.0]);
    let mut pipeline = ScenePipeline::new(config(ShadowQuality::High), area);
    let mut backend = backend;

    let outcome = pipeline.resize(&mut backend, 800, 600);
    assert_eq!(outcome.shadow_quality, ShadowQuality::Low);
    assert_eq!(
        outcome.downgrades,
        vec![
            (ShadowQuality::High, ShadowQuality::Medium),
            (ShadowQuality::Medium, ShadowQuality::Low),
        ]
    );
    assert_eq!(pipeline.shadow_quality(), ShadowQuality::Low);
}

#[test]
fn test_shadows_disabled_when_no_depth_target_fits() {
    let backend = RecordingBackend {
        max_depth_edge: Some(0),
        ..Default::default()
    };
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::Medium, backend);
    assert_eq!(scene.pipeline.shadow_quality(), ShadowQuality::None);

    let report = scene.frame(None);
    assert!(!report.passes.contains(&FrameStage::DepthPass));
    // Programs loaded for the downgraded quality
    assert!(scene
        .backend
        .programs
        .iter()
        .any(|p| matches!(p, ProgramId::Item { shadows: false, .. })));
}

#[test]
fn test_resize_releases_old_targets() {
    let mut scene = Scene::new(&[1.0], ShadowQuality::Medium, RecordingBackend::new());
    scene.pipeline.resize(&mut scene.backend, 1024, 768);
    // Selection + depth targets of the first size
    assert_eq!(scene.backend.deleted.len(), 2);
}

#[test]
fn test_pick_highlights_in_the_same_frame() {
    let mut scene = Scene::new(&[1.0, 2.0, 3.0], ShadowQuality::Medium, RecordingBackend::pointing_at(1));
    let report = scene.frame(Some((100.0, 200.0)));

    assert_eq!(report.picked, Some(1));
    assert_eq!(report.selected, Some(1));
    assert_eq!(scene.pipeline.selected(), Some(1));
    assert_eq!(scene.backend.reads.len(), 1);
    assert_eq!((scene.backend.reads[0].1, scene.backend.reads[0].2), (100, 200));

    let highlight = Vec3::from(scene.pipeline.theme().highlight_bar_color);
    let draws = scene.backend.last_color_draws();
    let picked = draws.iter().find(|d| d.item == Some(1)).expect("picked item drawn");
    assert_eq!(picked.uniforms.color(), highlight);
    assert!(draws
        .iter()
        .filter(|d| d.item != Some(1))
        .all(|d| d.uniforms.color() != highlight));
}

#[test]
fn test_selection_persists_without_new_pick() {
    let mut scene = Scene::new(&[1.0, 2.0, 3.0], ShadowQuality::None, RecordingBackend::pointing_at(2));
    scene.frame(Some((10.0, 10.0)));
    scene.backend.pixel = None;

    let report = scene.frame(None);
    assert_eq!(report.picked, None);
    assert_eq!(report.selected, Some(2));
    assert_eq!(scene.backend.reads.len(), 1);
}

#[test]
fn test_pick_on_background_clears_selection() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::pointing_at(0));
    assert_eq!(scene.frame(Some((5.0, 5.0))).selected, Some(0));

    scene.backend.pixel = Some([255, 255, 255, 255]);
    let report = scene.frame(Some((5.0, 5.0)));
    assert_eq!(report.picked, None);
    assert_eq!(report.selected, None);
    assert!(!report.passes.contains(&FrameStage::LabelPass));
}

#[test]
fn test_pick_of_undrawn_item_selects_nothing() {
    // Item 0 has zero height; a stale color decoding to it must not select it
    let mut scene = Scene::new(&[0.0, 2.0], ShadowQuality::None, RecordingBackend::pointing_at(0));
    let report = scene.frame(Some((5.0, 5.0)));
    assert_eq!(report.picked, Some(0));
    assert_eq!(report.selected, None);
}

#[test]
fn test_pick_outside_scene_viewport_is_not_read() {
    let mut scene = Scene::new(&[1.0], ShadowQuality::None, RecordingBackend::pointing_at(0));
    let report = scene.frame(Some((900.0, 10.0)));
    assert!(scene.backend.reads.is_empty());
    assert_eq!(report.selected, None);
}

#[test]
fn test_label_regenerated_only_on_change_or_refresh() {
    let mut scene = Scene::new(&[1.0, 2.0, 3.0], ShadowQuality::None, RecordingBackend::pointing_at(1));

    let first = scene.frame(Some((10.0, 10.0)));
    assert!(first.label_regenerated);
    assert_eq!(first.passes.last(), Some(&FrameStage::LabelPass));

    let second = scene.frame(None);
    assert!(!second.label_regenerated);
    assert_eq!(scene.labels.generated, vec![1]);
    assert_eq!(scene.labels.drawn, vec![1, 1]);

    scene.pipeline.set_font_size(40.0);
    assert!(scene.frame(None).label_regenerated);
    assert_eq!(scene.labels.styles.last().map(|s| s.font_size), Some(40.0));

    scene.backend.point_at(2);
    assert!(scene.frame(Some((10.0, 10.0))).label_regenerated);
    assert_eq!(scene.labels.generated, vec![1, 1, 2]);
}

#[test]
fn test_label_placement_follows_selected_item() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::pointing_at(1));
    scene.frame(Some((10.0, 10.0)));
    let placement = scene.labels.placements.last().expect("label drawn");
    let item = scene.pipeline.selected_item().expect("selected");
    assert_eq!(placement.item_height, item.height);
    assert_eq!(placement.viewport, scene.pipeline.scene_viewport());
    assert!(!placement.depth_test);
}

#[test]
fn test_zoom_skips_selection_and_label() {
    let mut scene = Scene::new(&[1.0, 2.0, 3.0], ShadowQuality::None, RecordingBackend::pointing_at(1));
    scene.frame(Some((10.0, 10.0)));

    scene.pipeline.set_zoom_active(true);
    let report = scene.frame(Some((10.0, 590.0)));
    assert!(!report.passes.contains(&FrameStage::SelectionPass));
    assert!(!report.passes.contains(&FrameStage::LabelPass));
    assert_eq!(report.selected, None);
    assert_eq!(scene.backend.reads.len(), 1);

    // Highlight stays on the item picked before zooming
    let highlight = Vec3::from(scene.pipeline.theme().highlight_bar_color);
    let picked = scene
        .backend
        .last_color_draws()
        .iter()
        .find(|d| d.item == Some(1))
        .expect("item drawn");
    assert_eq!(picked.uniforms.color(), highlight);

    let (color, _) = scene.backend.passes_of(PassKind::Color).pop().expect("color pass");
    assert_eq!(color.viewport, ViewportRect::new(0, 480, 160, 120));
}

#[test]
fn test_selection_mode_none_disables_picking() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::pointing_at(1));
    scene.frame(Some((10.0, 10.0)));
    scene.pipeline.set_selection_mode(SelectionMode::None);

    let report = scene.frame(Some((10.0, 10.0)));
    assert!(!report.passes.contains(&FrameStage::SelectionPass));
    assert_eq!(report.selected, None);
    assert_eq!(scene.pipeline.selected(), None);
}

#[test]
fn test_missing_selection_target_disables_picking() {
    let backend = RecordingBackend {
        fail_selection_target: true,
        pixel: Some([0, 0, 0, 255]),
        ..Default::default()
    };
    let mut scene = Scene::new(&[1.0], ShadowQuality::None, backend);
    let report = scene.frame(Some((10.0, 10.0)));
    assert!(!report.passes.contains(&FrameStage::SelectionPass));
    assert!(scene.backend.reads.is_empty());
}

#[test]
fn test_selection_pass_clears_to_skip_color_without_dither() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::new());
    scene.frame(None);
    let (pass, draws) = scene.backend.passes_of(PassKind::Selection)[0];
    assert_eq!(pass.clear_color, Some([1.0, 1.0, 1.0, 1.0]));
    assert!(!pass.dither);
    let colors: Vec<Vec3> = draws.iter().map(|d| d.uniforms.color()).collect();
    assert_eq!(colors, vec![picking::encode(0).to_vec3(), picking::encode(1).to_vec3()]);
}

#[test]
fn test_auto_scale_follows_aspect() {
    let mut scene = Scene::new(&[1.0], ShadowQuality::None, RecordingBackend::new());
    scene.pipeline.resize(&mut scene.backend, 1600, 1000);
    assert!((scene.pipeline.auto_scale_adjustment() - 1.0).abs() < 1e-6);
    scene.pipeline.resize(&mut scene.backend, 800, 1000);
    assert!((scene.pipeline.auto_scale_adjustment() - 0.5).abs() < 1e-6);
    scene.pipeline.resize(&mut scene.backend, 3200, 1000);
    assert!((scene.pipeline.auto_scale_adjustment() - 1.0).abs() < 1e-6);
}

#[test]
fn test_empty_window_renders_nothing() {
    let (mut grid, area) = single_row(&[1.0]);
    let mut pipeline = ScenePipeline::new(config(ShadowQuality::Medium), area);
    let mut backend = RecordingBackend::new();
    let mut labels = RecordingLabels::default();
    let report = pipeline
        .render_frame(&mut backend, &mut grid, &mut labels, &CameraModel::new(), None)
        .unwrap();
    assert!(report.passes.is_empty());
    assert!(backend.passes.is_empty());
    assert_eq!(backend.frames, 0);
}

#[test]
fn test_background_drawn_first_and_blended_by_alpha() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::Medium, RecordingBackend::new());
    let image = BackgroundImage {
        width: 2,
        height: 2,
        rgba: vec![255; 16],
        has_alpha: true,
    };
    scene.pipeline.set_background(&mut scene.backend, Some(&image));
    assert!(scene.pipeline.has_background());

    scene.frame(None);
    let draws = scene.backend.last_color_draws().to_vec();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0].program, ProgramId::Background { shadows: true });
    assert_eq!(draws[0].item, None);
    assert!(draws[0].blend);
    assert!(draws[0].texture.is_some());

    // The background never takes part in picking or shadows
    let (_, depth_draws) = scene.backend.passes_of(PassKind::Depth)[0];
    assert!(depth_draws.iter().all(|d| d.item.is_some()));

    scene.pipeline.set_background(&mut scene.backend, None);
    assert!(!scene.pipeline.has_background());
    assert_eq!(scene.backend.deleted.last().copied(), draws[0].texture);
}

#[test]
fn test_grid_edits_rebuild_next_frame() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::new());
    scene.frame(None);

    scene
        .grid
        .add_row(Some(vec![DataItem::new(4.0, Vec2::new(0.5, 0.5))]), None);
    // Limits follow immediately on drain; items on rebuild
    let report = scene.frame(None);
    assert!(report.rebuilt);
    assert_eq!(scene.pipeline.cache().items().len(), 3);
    assert_eq!(scene.pipeline.cache().limits().max, 4.0);
    assert_eq!(report.color_draws, 3);

    scene.grid.set_row_labels(vec!["first".into()]);
    assert!(!scene.frame(None).rebuilt);
}

#[test]
fn test_theme_and_mesh_changes_reload_resources() {
    let mut scene = Scene::new(&[1.0], ShadowQuality::None, RecordingBackend::new());
    scene.frame(None);
    let programs_before = scene.backend.programs.len();

    scene
        .pipeline
        .set_theme(&mut scene.backend, mapbars::render::ColorTheme::Dark)
        .unwrap();
    assert!(scene.backend.programs.len() > programs_before);
    assert!(scene.pipeline.labels_need_refresh());

    scene
        .pipeline
        .set_mesh_style(&mut scene.backend, mapbars::render::MeshStyle::Cylinders, true)
        .unwrap();
    assert_eq!(
        scene.backend.meshes.last(),
        Some(&(MeshSlot::Item, "cylinderSmooth".to_string()))
    );
}

#[test]
fn test_pointer_press_drives_pick() {
    let mut scene = Scene::new(&[1.0, 2.0], ShadowQuality::None, RecordingBackend::pointing_at(0));
    let mut pointer = InteractionController::new(false);
    let viewport = scene.pipeline.scene_viewport();

    pointer.press(PointerButton::Right, Vec2::new(30.0, 40.0), &mut scene.camera, viewport, false);
    assert_eq!(scene.frame(pointer.pick_position()).selected, None);

    pointer.press(PointerButton::Left, Vec2::new(30.0, 40.0), &mut scene.camera, viewport, false);
    assert_eq!(scene.frame(pointer.pick_position()).selected, Some(0));
    assert_eq!(scene.backend.reads.len(), 1);

    pointer.release(Vec2::new(30.0, 40.0));
    assert_eq!(pointer.state(), PointerState::None);
    assert_eq!(scene.frame(pointer.pick_position()).selected, Some(0));
}

#[test]
fn test_label_regenerated_after_selected_item_edit() {
    let mut scene = Scene::new(&[1.0, 2.0, 3.0], ShadowQuality::None, RecordingBackend::pointing_at(1));
    assert!(scene.frame(Some((10.0, 10.0))).label_regenerated);
    assert!(!scene.frame(None).label_regenerated);

    scene
        .grid
        .set_item(0, 1, DataItem::new(2.5, Vec2::new(1.5, 0.5)).with_label("renamed"))
        .unwrap();
    let report = scene.frame(None);
    assert!(report.rebuilt);
    assert_eq!(report.selected, Some(1));
    assert!(report.label_regenerated);
    assert_eq!(scene.labels.generated, vec![1, 1]);
    assert_eq!(scene.pipeline.selected_item().map(|i| i.label_text()), Some("renamed".to_string()));

    // Label-only grid changes leave the prepared label alone
    scene.grid.set_row_labels(vec!["row".into()]);
    assert!(!scene.frame(None).label_regenerated);
}
