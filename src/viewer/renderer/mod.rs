//! wgpu implementation of [`GpuBackend`].
//!
//! Meshes come from the `bar-shaders` catalog, programs are pipelines built
//! per target format, and every [`TextureId`] names an entry of one table:
//! selection targets, shadow depth targets or background images. Each pass
//! is submitted on its own so a following pixel readback sees it.

mod passes;
mod pipelines;
mod resources;

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::render::{BackgroundImage, DrawCall, GpuBackend, MeshHandle, MeshSlot, PassDescriptor, ProgramId, TextureId};
use crate::util::{Error, Result};

use pipelines::{shader_program, PipelineKey, Pipelines};
use resources::{ColorTarget, DepthTexture, GpuMesh, ImageTexture, ObjectBuffer, ShadowTarget, TextureResource};

/// Initial number of per-draw blocks in the uniform buffer
const INITIAL_OBJECT_CAPACITY: usize = 256;

/// Readback buffer size: one texel padded to the copy row alignment
const READBACK_SIZE: u64 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    /// Format of the viewport texture the color pass renders into
    output_format: wgpu::TextureFormat,
    pipelines: Pipelines,
    meshes: HashMap<MeshSlot, GpuMesh>,
    textures: HashMap<TextureId, TextureResource>,
    next_texture: u32,
    objects: ObjectBuffer,
    output: Option<ColorTarget>,
    shadow_sampler: wgpu::Sampler,
    image_sampler: wgpu::Sampler,
    readback: wgpu::Buffer,
    frame_passes: usize,
}

impl WgpuBackend {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, output_format: wgpu::TextureFormat) -> Self {
        let pipelines = Pipelines::new(&device);
        let objects = ObjectBuffer::new(&device, &pipelines.layouts().object, INITIAL_OBJECT_CAPACITY);

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let image_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("background_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("selection_readback_buffer"),
            size: READBACK_SIZE,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            device,
            queue,
            output_format,
            pipelines,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            next_texture: 1,
            objects,
            output: None,
            shadow_sampler,
            image_sampler,
            readback,
            frame_passes: 0,
        }
    }

    /// (Re)create the output texture; true when a new texture was made.
    pub fn ensure_output(&mut self, width: u32, height: u32) -> bool {
        if self.output.as_ref().is_some_and(|o| o.size == (width, height)) {
            return false;
        }
        if width == 0 || height == 0 {
            self.output = None;
            return false;
        }
        self.output = Some(ColorTarget::new(
            &self.device,
            "viewport_render_texture",
            width,
            height,
            self.output_format,
            wgpu::TextureUsages::TEXTURE_BINDING,
        ));
        true
    }

    pub fn output_view(&self) -> Option<&wgpu::TextureView> {
        self.output.as_ref().map(|o| &o.view)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn fits(&self, width: u32, height: u32) -> bool {
        let max = self.device.limits().max_texture_dimension_2d;
        width > 0 && height > 0 && width <= max && height <= max
    }

    fn insert_texture(&mut self, resource: TextureResource) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, resource);
        id
    }

    /// Pre-build the pipeline a program is normally drawn with
    fn warm_pipeline(&mut self, program: ProgramId) {
        let format = match program {
            ProgramId::Depth => bar_shaders::DEPTH_FORMAT,
            ProgramId::Selection => bar_shaders::SELECTION_FORMAT,
            _ => self.output_format,
        };
        let cull = match program {
            ProgramId::Depth => wgpu::Face::Front,
            _ => wgpu::Face::Back,
        };
        self.pipelines.prepare(
            &self.device,
            PipelineKey {
                program: shader_program(program),
                format,
                blend: false,
                cull,
            },
        );
    }
}

impl GpuBackend for WgpuBackend {
    fn begin_frame(&mut self) {
        self.frame_passes = 0;
    }

    fn end_frame(&mut self) {
        tracing::trace!(passes = self.frame_passes, pipelines = self.pipelines.len(), "gpu frame submitted");
    }

    fn load_mesh(&mut self, slot: MeshSlot, id: &str) -> Result<MeshHandle> {
        let data = bar_shaders::mesh_by_id(id).ok_or_else(|| Error::MeshNotFound(id.to_string()))?;
        let mesh = GpuMesh::new(&self.device, id, &data);
        let handle = MeshHandle {
            slot,
            vertex_count: mesh.vertex_count,
            index_count: mesh.index_count,
        };
        tracing::debug!(?slot, id, vertices = mesh.vertex_count, "loaded mesh");
        self.meshes.insert(slot, mesh);
        Ok(handle)
    }

    fn load_program(&mut self, program: ProgramId) -> Result<()> {
        self.pipelines.invalidate(shader_program(program));
        self.warm_pipeline(program);
        tracing::debug!(program = program.name(), "loaded program");
        Ok(())
    }

    fn create_texture(&mut self, image: &BackgroundImage) -> Option<TextureId> {
        let expected = image.width as usize * image.height as usize * 4;
        if !self.fits(image.width, image.height) || image.rgba.len() != expected {
            return None;
        }
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("background_texture"),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("background_bind_group"),
            layout: &self.pipelines.layouts().texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.image_sampler),
                },
            ],
        });
        Some(self.insert_texture(TextureResource::Image(ImageTexture { texture, bind_group })))
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            tracing::debug!(?texture, "deleting unknown texture");
        }
    }

    fn create_selection_target(&mut self, width: u32, height: u32) -> Option<TextureId> {
        if !self.fits(width, height) {
            return None;
        }
        let target = ColorTarget::selection(&self.device, width, height);
        Some(self.insert_texture(TextureResource::Selection(target)))
    }

    fn create_depth_target(&mut self, width: u32, height: u32) -> Option<TextureId> {
        if !self.fits(width, height) {
            return None;
        }
        let depth = DepthTexture::new(&self.device, "shadow_depth_texture", width, height, true);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &self.pipelines.layouts().shadow,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
                },
            ],
        });
        Some(self.insert_texture(TextureResource::Shadow(ShadowTarget { depth, bind_group })))
    }

    fn execute_pass(&mut self, pass: &PassDescriptor, draws: &[DrawCall]) {
        self.encode_pass(pass, draws);
        self.frame_passes += 1;
    }

    fn read_pixel(&mut self, target: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        self.read_selection_pixel(target, x, y)
    }
}
