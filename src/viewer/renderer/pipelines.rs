//! Render pipelines, built on first use per program/target combination.

use std::collections::HashMap;

use bar_shaders::{BindGroupLayouts, PipelineConfig, ShaderProgram};

use crate::render::{CullFace, ProgramId};

/// Shader program of a pipeline id
pub fn shader_program(program: ProgramId) -> ShaderProgram {
    match program {
        ProgramId::Depth => ShaderProgram::Depth,
        ProgramId::Selection => ShaderProgram::Selection,
        ProgramId::Item { shadows, uniform_color } => ShaderProgram::Item { shadows, uniform_color },
        ProgramId::Background { shadows } => ShaderProgram::Background { shadows },
    }
}

pub fn cull_face(cull: CullFace) -> wgpu::Face {
    match cull {
        CullFace::Back => wgpu::Face::Back,
        CullFace::Front => wgpu::Face::Front,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ShaderProgram,
    pub format: wgpu::TextureFormat,
    pub blend: bool,
    pub cull: wgpu::Face,
}

pub struct Pipelines {
    layouts: BindGroupLayouts,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            layouts: bar_shaders::create_bind_group_layouts(device),
            cache: HashMap::new(),
        }
    }

    pub fn layouts(&self) -> &BindGroupLayouts {
        &self.layouts
    }

    /// Drop every cached pipeline using `program`
    pub fn invalidate(&mut self, program: ShaderProgram) {
        self.cache.retain(|key, _| key.program != program);
    }

    /// Build the pipeline for `key` unless already cached
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.cache.contains_key(&key) {
            return;
        }
        let config = PipelineConfig {
            label: Some(program_label(key.program)),
            program: key.program,
            format: key.format,
            blend: key.blend,
            cull_mode: Some(key.cull),
        };
        let pipeline = bar_shaders::create_pipeline(device, &self.layouts, &config);
        tracing::debug!(?key, "created pipeline");
        self.cache.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(key)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

fn program_label(program: ShaderProgram) -> &'static str {
    match program {
        ShaderProgram::Depth => "depth_pipeline",
        ShaderProgram::Selection => "selection_pipeline",
        ShaderProgram::Item { shadows: false, .. } => "item_pipeline",
        ShaderProgram::Item { shadows: true, .. } => "item_shadow_pipeline",
        ShaderProgram::Background { shadows: false } => "background_pipeline",
        ShaderProgram::Background { shadows: true } => "background_shadow_pipeline",
    }
}
