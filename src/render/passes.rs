//! Draw-list builders for the frame passes.
//!
//! Every pass of a frame shares one [`FrameContext`]: the same projection,
//! view, light and per-item model matrices. Only the program and the
//! uniforms that differ per pass change here.

use super::adjust::AxisScaling;
use super::backend::{DrawCall, LabelPlacement, MeshSlot, ObjectUniforms, ProgramId, TextureId};
use super::cache::RenderItemCache;
use super::item::RenderItem;
use super::shadow::ShadowQuality;
use super::theme::{LabelTransparency, Theme};
use super::{DEPTH_FAR, DEPTH_FOV, DEPTH_NEAR, DISTANCE_MOD, Z_COMP};
use crate::camera::{wgpu_projection, CameraModel};
use crate::util::{normal_matrix, Mat4, Vec3, ViewportRect};

/// Transforms shared by all passes of one frame.
#[derive(Debug, Clone)]
pub(super) struct FrameContext {
    pub projection: Mat4,
    pub view: Mat4,
    pub light_position: Vec3,
    pub scaling: AxisScaling,
    pub y_adjustment: f32,
    pub scale_factor: f32,
    pub shadow_quality: ShadowQuality,
    /// Light-space projection * view; `None` without shadows
    pub depth_view_projection: Option<Mat4>,
    pub viewport: ViewportRect,
}

impl FrameContext {
    pub fn new(
        camera: &CameraModel,
        cache: &RenderItemCache,
        scaling: AxisScaling,
        viewport: ViewportRect,
        auto_scale: f32,
        shadow_quality: ShadowQuality,
    ) -> Self {
        let aspect = viewport.aspect();
        let y_adjustment = cache.y_adjustment();

        let depth_view_projection = shadow_quality.is_enabled().then(|| {
            let eye = camera.light_position((DISTANCE_MOD + 1.5) / auto_scale);
            let center = Vec3::new(0.0, -y_adjustment, Z_COMP);
            let projection = wgpu_projection(DEPTH_FOV.to_radians(), aspect, DEPTH_NEAR, DEPTH_FAR);
            projection * look_at(eye, center)
        });

        Self {
            projection: camera.projection_matrix(aspect),
            view: camera.view_matrix(auto_scale),
            light_position: camera.light_position(0.0),
            scaling,
            y_adjustment,
            scale_factor: cache.scale_factor(),
            shadow_quality,
            depth_view_projection,
            viewport,
        }
    }

    pub fn shadows(&self) -> bool {
        self.depth_view_projection.is_some()
    }

    pub fn item_model(&self, item: &RenderItem) -> Mat4 {
        self.scaling.model_matrix(item.translation, item.height, self.y_adjustment)
    }

    fn depth_mvp(&self, model: Mat4) -> Mat4 {
        self.depth_view_projection.map_or(Mat4::IDENTITY, |vp| vp * model)
    }
}

/// Look-at with Y up, switching to Z up when looking straight down.
fn look_at(eye: Vec3, center: Vec3) -> Mat4 {
    let dir = (center - eye).normalize_or_zero();
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 { Vec3::Z } else { Vec3::Y };
    Mat4::look_at_rh(eye, center, up)
}

fn mat(m: Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

/// Items seen from the light, depth only.
pub(super) fn depth_draws(ctx: &FrameContext, cache: &RenderItemCache) -> Vec<DrawCall> {
    cache
        .drawable()
        .map(|item| {
            let model = ctx.item_model(item);
            DrawCall {
                program: ProgramId::Depth,
                mesh: MeshSlot::Item,
                texture: None,
                blend: false,
                uniforms: ObjectUniforms {
                    mvp: mat(ctx.depth_mvp(model)),
                    model: mat(model),
                    ..Default::default()
                },
                item: Some(item.index),
            }
        })
        .collect()
}

/// Items flat-shaded in their identity colors.
pub(super) fn selection_draws(ctx: &FrameContext, cache: &RenderItemCache) -> Vec<DrawCall> {
    cache
        .drawable()
        .map(|item| {
            let model = ctx.item_model(item);
            DrawCall {
                program: ProgramId::Selection,
                mesh: MeshSlot::Item,
                texture: None,
                blend: false,
                uniforms: ObjectUniforms {
                    mvp: mat(ctx.projection * ctx.view * model),
                    model: mat(model),
                    color: item.selection_color.to_vec3().extend(1.0).to_array(),
                    ..Default::default()
                },
                item: Some(item.index),
            }
        })
        .collect()
}

/// Background quad lying flat under the items and covering the area.
pub(super) fn background_draw(
    ctx: &FrameContext,
    cache: &RenderItemCache,
    theme: &Theme,
    texture: TextureId,
    has_alpha: bool,
) -> DrawCall {
    let area = cache.area();
    let model = Mat4::from_translation(Vec3::new(0.0, -ctx.y_adjustment, Z_COMP))
        * Mat4::from_scale(Vec3::new(area.width / ctx.scale_factor, 1.0, area.height / ctx.scale_factor))
        * Mat4::from_rotation_x((-90.0f32).to_radians());

    let light_strength = if ctx.shadows() {
        theme.light_strength / 25.0
    } else {
        theme.light_strength
    };

    DrawCall {
        program: ProgramId::Background { shadows: ctx.shadows() },
        mesh: MeshSlot::Background,
        texture: Some(texture),
        blend: has_alpha,
        uniforms: ObjectUniforms {
            mvp: mat(ctx.projection * ctx.view * model),
            model: mat(model),
            view: mat(ctx.view),
            normal_model: mat(normal_matrix(model)),
            depth_mvp: mat(ctx.depth_mvp(model)),
            light_position: ctx.light_position.extend(0.0).to_array(),
            color: [1.0; 4],
            ambient_strength: theme.ambient_strength * 3.0,
            light_strength,
            shadow_quality: ctx.shadow_quality.shader_factor(),
            _pad: 0.0,
        },
        item: None,
    }
}

/// Lit items; `highlight` gets the theme highlight color and light.
pub(super) fn item_draws(
    ctx: &FrameContext,
    cache: &RenderItemCache,
    theme: &Theme,
    highlight: Option<usize>,
) -> Vec<DrawCall> {
    let program = ProgramId::Item {
        shadows: ctx.shadows(),
        uniform_color: theme.uniform_color,
    };

    cache
        .drawable()
        .map(|item| {
            let model = ctx.item_model(item);
            let (color, mut light_strength) = if highlight == Some(item.index) {
                (Vec3::from(theme.highlight_bar_color), theme.highlight_light_strength)
            } else {
                (theme.item_color(item.height), theme.light_strength)
            };
            if ctx.shadows() {
                light_strength /= 10.0;
            }

            DrawCall {
                program,
                mesh: MeshSlot::Item,
                texture: None,
                blend: false,
                uniforms: ObjectUniforms {
                    mvp: mat(ctx.projection * ctx.view * model),
                    model: mat(model),
                    view: mat(ctx.view),
                    normal_model: mat(ctx.scaling.normal_matrix(item.height)),
                    depth_mvp: mat(ctx.depth_mvp(model)),
                    light_position: ctx.light_position.extend(0.0).to_array(),
                    color: color.extend(1.0).to_array(),
                    ambient_strength: theme.ambient_strength,
                    light_strength,
                    shadow_quality: ctx.shadow_quality.shader_factor(),
                    _pad: 0.0,
                },
                item: Some(item.index),
            }
        })
        .collect()
}

pub(super) fn label_placement(
    ctx: &FrameContext,
    item: &RenderItem,
    transparency: LabelTransparency,
) -> LabelPlacement {
    LabelPlacement {
        view: ctx.view,
        projection: ctx.projection,
        viewport: ctx.viewport,
        position_offset: Vec3::new(0.0, ctx.y_adjustment, Z_COMP),
        rotation: Vec3::ZERO,
        item_height: item.height,
        anchor: ctx.scaling.top_of(item.translation, item.height, ctx.y_adjustment),
        depth_test: false,
        blend: transparency > LabelTransparency::None,
    }
}
