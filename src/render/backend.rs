//! Seams between the scene pipeline and the graphics/text backends.
//!
//! The pipeline decides what to draw and with which uniforms; a
//! [`GpuBackend`] owns meshes, programs and render targets and executes
//! whole passes. Labels go through a separate [`LabelDrawer`].

use super::item::RenderItem;
use super::theme::LabelTransparency;
use crate::util::{Mat4, Result, Vec3, ViewportRect};

/// Mesh slots the pipeline keeps loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshSlot {
    Item,
    Background,
}

/// Loaded mesh as seen by the pipeline. Buffers stay inside the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandle {
    pub slot: MeshSlot,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Shader programs the pipeline binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramId {
    /// Depth only, from the light
    Depth,
    /// Flat identity color
    Selection,
    /// Lit items
    Item { shadows: bool, uniform_color: bool },
    /// Lit textured background quad
    Background { shadows: bool },
}

impl ProgramId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::Selection => "selection",
            Self::Item { shadows: false, uniform_color: true } => "item",
            Self::Item { shadows: false, uniform_color: false } => "item_color_on_y",
            Self::Item { shadows: true, uniform_color: true } => "item_shadow",
            Self::Item { shadows: true, uniform_color: false } => "item_shadow_color_on_y",
            Self::Background { shadows: false } => "background",
            Self::Background { shadows: true } => "background_shadow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// RGBA8 background image.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Source format carried an alpha channel
    pub has_alpha: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Depth,
    Selection,
    Color,
}

/// Where a pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// The backend's current output color target
    Output,
    /// A target created through the backend
    Offscreen(TextureId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    Back,
    Front,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    pub kind: PassKind,
    pub target: PassTarget,
    pub viewport: ViewportRect,
    /// Clear color; `None` keeps existing contents
    pub clear_color: Option<[f32; 4]>,
    pub cull: CullFace,
    /// Color dithering; must stay off wherever exact colors are read back
    pub dither: bool,
    /// Depth target sampled for shadows
    pub shadow_map: Option<TextureId>,
}

/// Per-draw uniform block. Field order and padding match the WGSL
/// `Object` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub mvp: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub normal_model: [[f32; 4]; 4],
    pub depth_mvp: [[f32; 4]; 4],
    /// xyz + unused w
    pub light_position: [f32; 4],
    /// rgb + alpha
    pub color: [f32; 4],
    pub ambient_strength: f32,
    pub light_strength: f32,
    pub shadow_quality: f32,
    pub _pad: f32,
}

impl Default for ObjectUniforms {
    fn default() -> Self {
        Self {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            normal_model: Mat4::IDENTITY.to_cols_array_2d(),
            depth_mvp: Mat4::IDENTITY.to_cols_array_2d(),
            light_position: [0.0; 4],
            color: [1.0; 4],
            ambient_strength: 0.0,
            light_strength: 0.0,
            shadow_quality: 0.0,
            _pad: 0.0,
        }
    }
}

impl ObjectUniforms {
    pub fn color(&self) -> Vec3 {
        Vec3::new(self.color[0], self.color[1], self.color[2])
    }
}

/// One indexed draw of a loaded mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub mesh: MeshSlot,
    pub texture: Option<TextureId>,
    pub blend: bool,
    pub uniforms: ObjectUniforms,
    /// Render item index, `None` for the background
    pub item: Option<usize>,
}

/// GPU services used by [`ScenePipeline`](super::ScenePipeline).
///
/// Creation methods return `None` on failure so the pipeline can degrade.
pub trait GpuBackend {
    /// Called before the first pass of a frame.
    fn begin_frame(&mut self) {}

    /// Called after the last pass of a frame.
    fn end_frame(&mut self) {}

    /// Resolve a mesh identifier and keep it loaded in `slot`.
    fn load_mesh(&mut self, slot: MeshSlot, id: &str) -> Result<MeshHandle>;

    /// Build (or rebuild) a program so later passes can bind it.
    fn load_program(&mut self, program: ProgramId) -> Result<()>;

    fn create_texture(&mut self, image: &BackgroundImage) -> Option<TextureId>;

    fn delete_texture(&mut self, texture: TextureId);

    /// RGBA8 color target with depth, for the selection pass.
    fn create_selection_target(&mut self, width: u32, height: u32) -> Option<TextureId>;

    /// Depth-only target for the shadow pass.
    fn create_depth_target(&mut self, width: u32, height: u32) -> Option<TextureId>;

    fn execute_pass(&mut self, pass: &PassDescriptor, draws: &[DrawCall]);

    /// Synchronously read one RGBA8 pixel of a color target.
    fn read_pixel(&mut self, target: TextureId, x: u32, y: u32) -> Option<[u8; 4]>;
}

/// Text style for the selection label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size: f32,
    pub transparency: LabelTransparency,
    pub text_color: [f32; 3],
    pub background_color: [f32; 4],
}

/// Where and how to draw the label of the selected item.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: ViewportRect,
    /// Scene offset applied to label positions, (0, y adjustment, depth compression)
    pub position_offset: Vec3,
    pub rotation: Vec3,
    pub item_height: f32,
    /// Scene-space point at the top of the selected item
    pub anchor: Vec3,
    pub depth_test: bool,
    pub blend: bool,
}

impl LabelPlacement {
    /// Screen position of the anchor in viewport pixels, `None` behind the camera.
    pub fn anchor_on_screen(&self) -> Option<(f32, f32)> {
        let clip = self.projection * self.view * self.anchor.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = self.viewport.x as f32 + (ndc.x * 0.5 + 0.5) * self.viewport.width as f32;
        let y = self.viewport.y as f32 + (0.5 - ndc.y * 0.5) * self.viewport.height as f32;
        Some((x, y))
    }
}

/// Opaque label text capability.
pub trait LabelDrawer {
    /// Prepare the label texture for `item`.
    fn generate_label(&mut self, item: &RenderItem, style: &LabelStyle);

    /// Draw the prepared label as a screen-facing quad.
    fn draw_label(&mut self, item: &RenderItem, placement: &LabelPlacement);
}
