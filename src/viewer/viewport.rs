//! 3D viewport widget for egui

use std::collections::BTreeMap;
use std::sync::Arc;

use egui::{Response, Sense, Ui, Vec2};

use super::labels::EguiLabels;
use super::renderer::WgpuBackend;
use crate::camera::CameraModel;
use crate::data::DataGrid;
use crate::interaction::{InteractionController, PointerButton, WHEEL_NOTCH};
use crate::render::{FrameReport, ResizeOutcome, ScenePipeline};
use crate::util;

/// Scroll distance egui reports for one wheel notch
const POINTS_PER_NOTCH: f32 = 50.0;

/// 3D viewport state
pub struct Viewport {
    pub camera: CameraModel,
    pub interaction: InteractionController,
    pub backend: Option<WgpuBackend>,
    labels: EguiLabels,
    texture_id: Option<egui::TextureId>,
    size: (u32, u32),
    /// Active touch points, for pinch zoom
    touches: BTreeMap<u64, egui::Pos2>,
    /// Release seen this frame, applied after rendering so a quick click
    /// still picks once
    pending_release: Option<util::Vec2>,
    pub last_report: Option<FrameReport>,
    /// Set when a resize had to lower the shadow quality
    pub last_downgrade: Option<ResizeOutcome>,
}

impl Viewport {
    pub fn new(touch: bool) -> Self {
        Self {
            camera: CameraModel::new(),
            interaction: InteractionController::new(touch),
            backend: None,
            labels: EguiLabels::new(),
            texture_id: None,
            size: (0, 0),
            touches: BTreeMap::new(),
            pending_release: None,
            last_report: None,
            last_downgrade: None,
        }
    }

    /// Initialize backend (call once when wgpu context is available)
    pub fn init_backend(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) {
        self.backend = Some(WgpuBackend::new(
            Arc::new(device.clone()),
            Arc::new(queue.clone()),
            format,
        ));
    }

    pub fn labels_generated(&self) -> usize {
        self.labels.generated()
    }

    /// Show viewport UI, handle input and render one frame
    pub fn show(
        &mut self,
        ui: &mut Ui,
        render_state: Option<&egui_wgpu::RenderState>,
        pipeline: &mut ScenePipeline,
        grid: &mut DataGrid,
    ) -> Response {
        let _span = tracing::info_span!("viewport_show").entered();
        let available = ui.available_size();
        let size = Vec2::new(available.x.max(64.0), available.y.max(64.0));
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        self.handle_input(ui, &response, pipeline);

        let (Some(render_state), Some(backend)) = (render_state, self.backend.as_mut()) else {
            ui.painter().rect_filled(rect, 0.0, egui::Color32::from_rgb(30, 30, 35));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Initializing...",
                egui::FontId::default(),
                egui::Color32::GRAY,
            );
            return response;
        };

        let width = size.x as u32;
        let height = size.y as u32;
        if (width, height) != self.size {
            let outcome = pipeline.resize(backend, width, height);
            if !outcome.downgrades.is_empty() {
                self.last_downgrade = Some(outcome);
            }
            self.size = (width, height);
        }

        if backend.ensure_output(width, height) {
            if let Some(view) = backend.output_view() {
                let tex_id = render_state.renderer.write().register_native_texture(
                    &render_state.device,
                    view,
                    wgpu::FilterMode::Linear,
                );
                if let Some(old_id) = self.texture_id.replace(tex_id) {
                    render_state.renderer.write().free_texture(&old_id);
                }
            }
        }

        let pick = self.interaction.pick_position();
        match pipeline.render_frame(backend, grid, &mut self.labels, &self.camera, pick) {
            Ok(report) => self.last_report = Some(report),
            Err(e) => {
                log::error!("Frame failed: {}", e);
                self.last_report = None;
            }
        }

        if let Some(position) = self.pending_release.take() {
            self.interaction.release(position);
        }

        if let Some(tex_id) = self.texture_id {
            ui.painter().image(
                tex_id,
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        self.labels.paint(ui.painter(), rect.min);

        response
    }

    fn handle_input(&mut self, ui: &Ui, response: &Response, pipeline: &ScenePipeline) {
        let input = ui.input(|i| i.clone());
        let rect = response.rect;
        let local = |pos: egui::Pos2| util::Vec2::new(pos.x - rect.left(), pos.y - rect.top());
        let zoom_active = pipeline.is_zoom_active();
        let scene_viewport = pipeline.scene_viewport();

        // Touch points; two at once pinch
        for event in &input.events {
            if let egui::Event::Touch { id, phase, pos, .. } = event {
                match phase {
                    egui::TouchPhase::Start | egui::TouchPhase::Move => {
                        self.touches.insert(id.0, *pos);
                    }
                    egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                        self.touches.remove(&id.0);
                    }
                }
            }
        }
        if self.touches.len() == 2 {
            let mut points = self.touches.values().copied();
            if let (Some(a), Some(b)) = (points.next(), points.next()) {
                self.interaction.pinch(local(a), local(b), &mut self.camera);
            }
            return;
        }

        if let Some(pos) = input.pointer.interact_pos().filter(|p| rect.contains(*p)) {
            let buttons = [
                (egui::PointerButton::Primary, PointerButton::Left),
                (egui::PointerButton::Secondary, PointerButton::Right),
                (egui::PointerButton::Middle, PointerButton::Middle),
            ];
            for (egui_button, button) in buttons {
                if input.pointer.button_pressed(egui_button) {
                    self.interaction
                        .press(button, local(pos), &mut self.camera, scene_viewport, zoom_active);
                }
            }
            if response.double_clicked() && self.interaction.is_touch() {
                self.interaction.double_tap(local(pos), zoom_active);
            }
        }

        if let Some(pos) = input.pointer.latest_pos() {
            if input.pointer.is_moving() {
                self.interaction.move_to(local(pos), &mut self.camera);
            }
            if input.pointer.any_released() {
                self.pending_release = Some(local(pos));
            }
        }

        if response.hovered() {
            let scroll = input.raw_scroll_delta.y;
            if scroll.abs() > 0.0 {
                let delta = (scroll / POINTS_PER_NOTCH * WHEEL_NOTCH as f32) as i32;
                self.interaction.wheel(delta, &mut self.camera);
            }
        }
    }
}
