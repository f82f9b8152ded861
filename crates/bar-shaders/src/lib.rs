//! WGSL programs for mapbars
//!
//! One shared `Object` uniform block per draw (bound with a dynamic offset),
//! an optional shadow map and, for the background, a color texture.
//!
//! ## Programs
//!
//! | Program                  | Vertex      | Fragment                     | Groups                   |
//! |--------------------------|-------------|------------------------------|--------------------------|
//! | depth                    | `vs_depth`  | none                         | object                   |
//! | selection                | `vs_main`   | `fs_selection`               | object                   |
//! | item (+ color on Y)      | `vs_main`   | `fs_item*`                   | object                   |
//! | item shadow (+ on Y)     | `vs_main`   | `fs_item_shadow*`            | object, shadow           |
//! | background               | `vs_main`   | `fs_background`              | object, texture          |
//! | background shadow        | `vs_main`   | `fs_background_shadow`       | object, texture, shadow  |
//!
//! ## Usage
//!
//! ```ignore
//! use bar_shaders::{create_bind_group_layouts, create_pipeline, PipelineConfig, ShaderProgram};
//!
//! let layouts = create_bind_group_layouts(&device);
//! let pipeline = create_pipeline(&device, &layouts, &PipelineConfig {
//!     program: ShaderProgram::Item { shadows: true, uniform_color: true },
//!     ..Default::default()
//! });
//! ```

pub mod meshes;

pub use meshes::{mesh_by_id, MeshData, MESH_IDS};

/// Shared declarations, prepended to every program module
pub const COMMON_SOURCE: &str = include_str!("shaders/common.wgsl");
/// Depth, selection and lit item entry points
pub const ITEMS_SOURCE: &str = include_str!("shaders/items.wgsl");
/// Background entry points
pub const BACKGROUND_SOURCE: &str = include_str!("shaders/background.wgsl");

/// Size of the WGSL `Object` block in bytes
pub const OBJECT_UNIFORM_SIZE: u64 = 368;

/// Depth format of every target
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Selection target format; unorm so identity colors read back unchanged
pub const SELECTION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub fn items_shader_source() -> String {
    format!("{COMMON_SOURCE}\n{ITEMS_SOURCE}")
}

pub fn background_shader_source() -> String {
    format!("{COMMON_SOURCE}\n{BACKGROUND_SOURCE}")
}

/// Standard vertex format
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertex buffer layout for [`Vertex`]
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

/// Program variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    Depth,
    Selection,
    Item { shadows: bool, uniform_color: bool },
    Background { shadows: bool },
}

impl ShaderProgram {
    pub fn vertex_entry(self) -> &'static str {
        match self {
            Self::Depth => "vs_depth",
            _ => "vs_main",
        }
    }

    /// `None` for the depth-only program
    pub fn fragment_entry(self) -> Option<&'static str> {
        Some(match self {
            Self::Depth => return None,
            Self::Selection => "fs_selection",
            Self::Item { shadows: false, uniform_color: true } => "fs_item",
            Self::Item { shadows: false, uniform_color: false } => "fs_item_color_on_y",
            Self::Item { shadows: true, uniform_color: true } => "fs_item_shadow",
            Self::Item { shadows: true, uniform_color: false } => "fs_item_shadow_color_on_y",
            Self::Background { shadows: false } => "fs_background",
            Self::Background { shadows: true } => "fs_background_shadow",
        })
    }

    pub fn uses_shadow_map(self) -> bool {
        matches!(self, Self::Item { shadows: true, .. } | Self::Background { shadows: true })
    }

    pub fn uses_texture(self) -> bool {
        matches!(self, Self::Background { .. })
    }

    pub fn source(self) -> String {
        match self {
            Self::Background { .. } => background_shader_source(),
            _ => items_shader_source(),
        }
    }
}

/// Bind group layouts shared by all programs
pub struct BindGroupLayouts {
    /// Group 0: per-draw `Object` block, dynamic offset
    pub object: wgpu::BindGroupLayout,
    /// Shadow map + comparison sampler
    pub shadow: wgpu::BindGroupLayout,
    /// Background texture + filtering sampler
    pub texture: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    /// Layouts in group order for `program`
    pub fn for_program(&self, program: ShaderProgram) -> Vec<&wgpu::BindGroupLayout> {
        let mut layouts = vec![&self.object];
        if program.uses_texture() {
            layouts.push(&self.texture);
        }
        if program.uses_shadow_map() {
            layouts.push(&self.shadow);
        }
        layouts
    }
}

/// Create bind group layouts
pub fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
    let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bar_object"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: std::num::NonZeroU64::new(OBJECT_UNIFORM_SIZE),
            },
            count: None,
        }],
    });

    let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bar_shadow"),
        entries: &[
            // Shadow depth texture
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            // Comparison sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
    });

    let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bar_background_texture"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    BindGroupLayouts { object, shadow, texture }
}

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Debug label (defaults to "bar_pipeline")
    pub label: Option<&'static str>,
    pub program: ShaderProgram,
    /// Color target format; ignored by the depth program
    pub format: wgpu::TextureFormat,
    /// Enable alpha blending
    pub blend: bool,
    /// Cull mode
    pub cull_mode: Option<wgpu::Face>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: None,
            program: ShaderProgram::Item {
                shadows: false,
                uniform_color: true,
            },
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            blend: false,
            cull_mode: Some(wgpu::Face::Back),
        }
    }
}

/// Create a render pipeline for `config.program`
pub fn create_pipeline(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    config: &PipelineConfig,
) -> wgpu::RenderPipeline {
    let program = config.program;
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("bar_shader"),
        source: wgpu::ShaderSource::Wgsl(program.source().into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("bar_pipeline_layout"),
        bind_group_layouts: &layouts.for_program(program),
        push_constant_ranges: &[],
    });

    let blend_state = if config.blend {
        Some(wgpu::BlendState::ALPHA_BLENDING)
    } else {
        Some(wgpu::BlendState::REPLACE)
    };

    // Color targets for fragment shader (must outlive the pipeline descriptor)
    let targets = [Some(wgpu::ColorTargetState {
        format: config.format,
        blend: blend_state,
        write_mask: wgpu::ColorWrites::ALL,
    })];

    let fragment_state = program.fragment_entry().map(|entry| wgpu::FragmentState {
        module: &shader,
        entry_point: Some(entry),
        compilation_options: Default::default(),
        targets: &targets,
    });

    // Depth-only pass biases depth to reduce shadow acne
    let bias = if program == ShaderProgram::Depth {
        wgpu::DepthBiasState {
            constant: 2,
            slope_scale: 2.0,
            clamp: 0.0,
        }
    } else {
        wgpu::DepthBiasState::default()
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(config.label.unwrap_or("bar_pipeline")),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(program.vertex_entry()),
            compilation_options: Default::default(),
            buffers: &[vertex_buffer_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: config.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias,
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: fragment_state,
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_entry_points_exist_in_source() {
        let programs = [
            ShaderProgram::Depth,
            ShaderProgram::Selection,
            ShaderProgram::Item { shadows: false, uniform_color: true },
            ShaderProgram::Item { shadows: false, uniform_color: false },
            ShaderProgram::Item { shadows: true, uniform_color: true },
            ShaderProgram::Item { shadows: true, uniform_color: false },
            ShaderProgram::Background { shadows: false },
            ShaderProgram::Background { shadows: true },
        ];
        for program in programs {
            let source = program.source();
            assert!(source.contains(&format!("fn {}(", program.vertex_entry())), "{program:?}");
            if let Some(fs) = program.fragment_entry() {
                assert!(source.contains(&format!("fn {fs}(")), "{program:?}");
            }
        }
    }

    #[test]
    fn test_object_block_fields_in_order() {
        let fields = [
            "mvp:", "model:", "view:", "normal_model:", "depth_mvp:", "light_position:", "color:",
            "ambient_strength:", "light_strength:", "shadow_quality:", "_pad:",
        ];
        let start = COMMON_SOURCE.find("struct Object").unwrap();
        let block = &COMMON_SOURCE[start..start + COMMON_SOURCE[start..].find('}').unwrap()];
        let mut last = 0;
        for field in fields {
            let pos = block.find(field).unwrap_or_else(|| panic!("missing {field}"));
            assert!(pos >= last, "{field} out of order");
            last = pos;
        }
    }
}
