//! Pass encoding and selection readback.

use super::pipelines::{cull_face, shader_program, PipelineKey};
use super::resources::{ObjectBuffer, TextureResource};
use super::{WgpuBackend, READBACK_SIZE};
use crate::render::{DrawCall, PassDescriptor, PassKind, PassTarget, TextureId};

impl WgpuBackend {
    /// Pipeline format of a pass target; the depth format for depth-only
    /// targets, `None` when the target is gone.
    fn target_format(&self, target: PassTarget) -> Option<wgpu::TextureFormat> {
        match target {
            PassTarget::Output => self.output.as_ref().map(|o| o.format),
            PassTarget::Offscreen(id) => match self.textures.get(&id)? {
                TextureResource::Selection(t) => Some(t.format),
                TextureResource::Shadow(_) => Some(bar_shaders::DEPTH_FORMAT),
                TextureResource::Image(_) => None,
            },
        }
    }

    fn image_bind_group(&self, id: TextureId) -> Option<&wgpu::BindGroup> {
        match self.textures.get(&id)? {
            TextureResource::Image(image) => Some(&image.bind_group),
            _ => None,
        }
    }

    fn shadow_bind_group(&self, id: TextureId) -> Option<&wgpu::BindGroup> {
        match self.textures.get(&id)? {
            TextureResource::Shadow(shadow) => Some(&shadow.bind_group),
            _ => None,
        }
    }

    /// Record and submit one pass.
    pub(super) fn encode_pass(&mut self, pass: &PassDescriptor, draws: &[DrawCall]) {
        let _span = tracing::trace_span!("gpu_pass", kind = ?pass.kind, draws = draws.len()).entered();

        let Some(format) = self.target_format(pass.target) else {
            tracing::warn!(kind = ?pass.kind, target = ?pass.target, "pass target missing, skipped");
            return;
        };

        if draws.len() > self.objects.capacity {
            self.objects = ObjectBuffer::new(
                &self.device,
                &self.pipelines.layouts().object,
                draws.len().next_power_of_two(),
            );
        }

        let cull = cull_face(pass.cull);
        let keys: Vec<PipelineKey> = draws
            .iter()
            .map(|draw| PipelineKey {
                program: shader_program(draw.program),
                format,
                blend: draw.blend,
                cull,
            })
            .collect();
        for key in &keys {
            self.pipelines.prepare(&self.device, *key);
        }

        let stride = self.objects.stride as usize;
        if !draws.is_empty() {
            let mut bytes = vec![0u8; stride * draws.len()];
            for (i, draw) in draws.iter().enumerate() {
                let block = bytemuck::bytes_of(&draw.uniforms);
                bytes[i * stride..i * stride + block.len()].copy_from_slice(block);
            }
            self.queue.write_buffer(&self.objects.buffer, 0, &bytes);
        }

        let (color_view, depth_view, size) = match pass.target {
            PassTarget::Output => match &self.output {
                Some(o) => (Some(&o.view), &o.depth.view, o.size),
                None => return,
            },
            PassTarget::Offscreen(id) => match self.textures.get(&id) {
                Some(TextureResource::Selection(t)) => (Some(&t.view), &t.depth.view, t.size),
                Some(TextureResource::Shadow(s)) => (None, &s.depth.view, s.depth.size),
                _ => return,
            },
        };
        let shadow_group = pass.shadow_map.and_then(|id| self.shadow_bind_group(id));

        // wgpu never dithers color writes, so `pass.dither` needs no state here
        let load = match pass.clear_color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_view
            .map(|view| wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })
            .into_iter()
            .map(Some)
            .collect();

        let label = match pass.kind {
            PassKind::Depth => "shadow_depth_pass",
            PassKind::Selection => "selection_pass",
            PassKind::Color => "color_pass",
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Clamp to the target; wgpu rejects viewports outside it
            let (tw, th) = size;
            let x = pass.viewport.x.min(tw);
            let y = pass.viewport.y.min(th);
            let w = pass.viewport.width.min(tw - x);
            let h = pass.viewport.height.min(th - y);

            if w > 0 && h > 0 {
                rp.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);

                for (i, (draw, key)) in draws.iter().zip(&keys).enumerate() {
                    let (Some(pipeline), Some(mesh)) = (self.pipelines.get(key), self.meshes.get(&draw.mesh)) else {
                        continue;
                    };
                    rp.set_pipeline(pipeline);
                    rp.set_bind_group(0, &self.objects.bind_group, &[(i * stride) as u32]);

                    let mut group = 1;
                    if key.program.uses_texture() {
                        let Some(image) = draw.texture.and_then(|id| self.image_bind_group(id)) else {
                            continue;
                        };
                        rp.set_bind_group(group, image, &[]);
                        group += 1;
                    }
                    if key.program.uses_shadow_map() {
                        let Some(shadow) = shadow_group else {
                            continue;
                        };
                        rp.set_bind_group(group, shadow, &[]);
                    }

                    rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    rp.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    rp.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
    }

    /// Copy one texel of a selection target and block until it is mapped.
    pub(super) fn read_selection_pixel(&mut self, target: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        let Some(TextureResource::Selection(t)) = self.textures.get(&target) else {
            return None;
        };
        if x >= t.size.0 || y >= t.size.1 {
            return None;
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("selection_readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &t.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    // bytes_per_row must be aligned to 256
                    bytes_per_row: Some(READBACK_SIZE as u32),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        match rx.try_recv() {
            Ok(Ok(())) => {
                let pixel = {
                    let data = slice.get_mapped_range();
                    [data[0], data[1], data[2], data[3]]
                };
                self.readback.unmap();
                Some(pixel)
            }
            Ok(Err(e)) => {
                tracing::debug!("selection readback map failed: {}", e);
                None
            }
            Err(_) => None,
        }
    }
}
