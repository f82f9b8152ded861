//! GPU-side resources owned by the backend.

use wgpu::util::DeviceExt;

use bar_shaders::{MeshData, DEPTH_FORMAT, SELECTION_FORMAT};

/// Vertex + index buffers of one loaded mesh
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            vertex_count: data.vertices.len() as u32,
            index_count: data.indices.len() as u32,
        }
    }
}

/// Depth attachment paired with a color target
#[derive(Debug)]
pub struct DepthTexture {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl DepthTexture {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, sampled: bool) -> Self {
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if sampled {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size: (width, height),
        }
    }
}

/// Color texture with its own depth buffer
#[derive(Debug)]
pub struct ColorTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub depth: DepthTexture,
    pub format: wgpu::TextureFormat,
    pub size: (u32, u32),
}

impl ColorTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = DepthTexture::new(device, &format!("{label}_depth"), width, height, false);
        Self {
            texture,
            view,
            depth,
            format,
            size: (width, height),
        }
    }

    /// Off-screen picking target, copyable for readback
    pub fn selection(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::new(
            device,
            "selection_target",
            width,
            height,
            SELECTION_FORMAT,
            wgpu::TextureUsages::COPY_SRC,
        )
    }
}

/// Shadow depth target and the bind group that samples it
#[derive(Debug)]
pub struct ShadowTarget {
    pub depth: DepthTexture,
    pub bind_group: wgpu::BindGroup,
}

/// Uploaded background image
#[derive(Debug)]
pub struct ImageTexture {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Everything a [`TextureId`](crate::render::TextureId) can name
#[derive(Debug)]
pub enum TextureResource {
    Selection(ColorTarget),
    Shadow(ShadowTarget),
    Image(ImageTexture),
}

/// Growable buffer of per-draw `Object` blocks, bound with dynamic offsets.
#[derive(Debug)]
pub struct ObjectBuffer {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    /// Bytes between consecutive blocks
    pub stride: u64,
    /// Blocks that fit
    pub capacity: usize,
}

impl ObjectBuffer {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(bar_shaders::OBJECT_UNIFORM_SIZE, alignment);
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniform_buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: std::num::NonZeroU64::new(bar_shaders::OBJECT_UNIFORM_SIZE),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

/// Round `value` up to a multiple of `alignment`
pub fn align_to(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}
