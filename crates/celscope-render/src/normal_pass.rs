//! Normal prepass: renders view-space normals into an offscreen buffer.

use crate::engine::{RenderEngine, DEPTH_FORMAT};
use crate::mesh_render::GpuScene;

/// Format of the normal buffer: signed float RGB normals plus a coverage
/// flag in alpha.
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Normal prepass resources.
///
/// All geometry is drawn through one "normal as color" pipeline instead of
/// the shading materials. Because the substitution is a pipeline bound
/// inside this pass only, it cannot leak into any later pass: the scene
/// pass and every other pass bind their own pipelines, on every exit path.
pub struct NormalPass {
    pipeline: wgpu::RenderPipeline,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    // Depth used for occlusion within this pass only; the readable depth
    // consumed by the edge filter is produced by the depth pass.
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl NormalPass {
    /// Creates the normal prepass and its render target.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        mesh_bind_group_layout: &wgpu::BindGroupLayout,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("normal pass shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/normal_pass.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("normal pass pipeline layout"),
            bind_group_layouts: &[mesh_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("normal pass pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: NORMAL_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (texture, view) = Self::create_target(device, width, height);
        let (depth_texture, depth_view) = RenderEngine::create_depth_texture(device, width, height);

        Self {
            pipeline,
            texture,
            view,
            depth_texture,
            depth_view,
        }
    }

    fn create_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("normal buffer"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: NORMAL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the render target at a new size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (texture, view) = Self::create_target(device, width, height);
        self.texture = texture;
        self.view = view;
        let (depth_texture, depth_view) = RenderEngine::create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    /// Renders scene normals into the normal buffer.
    ///
    /// The background clears to a zero vector, which reads as "no surface"
    /// to the edge filter and makes silhouettes against empty space
    /// register as normal discontinuities.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, scene: &GpuScene) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("normal pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(&self.pipeline);
        for draw in &scene.draws {
            render_pass.set_bind_group(0, &draw.bind_group, &[]);
            render_pass.draw(0..draw.vertex_count, 0..1);
        }
    }

    /// Returns the normal buffer view.
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
