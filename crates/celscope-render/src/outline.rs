//! The outline composite pipeline.
//!
//! Runs the full per-frame sequence: scene pass (true materials), normal
//! prepass, depth prepass, screen-space edge filter, FXAA, present. All
//! passes are encoded in order into one command encoder, so each pass's
//! writes are visible to the next.

use celscope_core::OutlineConfig;
use glam::Vec3;

use crate::depth_pass::DepthPass;
use crate::edge_pass::{EdgePass, EdgeUniforms};
use crate::engine::RenderEngine;
use crate::fxaa_pass::FxaaPass;
use crate::mesh_render::GpuScene;
use crate::normal_pass::NormalPass;

/// Converts a logical extent to physical pixels, rounding per the
/// platform's scale factor convention and clamping to at least one pixel.
#[must_use]
pub fn physical_extent(logical: u32, pixel_ratio: f64) -> u32 {
    ((f64::from(logical) * pixel_ratio).round() as u32).max(1)
}

/// The outline composite pipeline and the render targets it owns.
///
/// The normal and depth buffers are owned exclusively by this pipeline and
/// resized only through [`OutlinePipeline::set_size`]. The scene graph and
/// camera are externally owned and only read during rendering.
pub struct OutlinePipeline {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    config: OutlineConfig,
    // Scene color target (true materials).
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    // Depth used by the scene pass for occlusion.
    scene_depth_texture: wgpu::Texture,
    scene_depth_view: wgpu::TextureView,
    // Outline-composited color, input to FXAA.
    edge_texture: wgpu::Texture,
    edge_view: wgpu::TextureView,
    normal_pass: NormalPass,
    depth_pass: DepthPass,
    edge_pass: EdgePass,
    fxaa_pass: FxaaPass,
}

impl OutlinePipeline {
    /// Creates the pipeline and its targets at `logical × pixel_ratio`
    /// pixels.
    #[must_use]
    pub fn new(
        engine: &RenderEngine,
        logical_width: u32,
        logical_height: u32,
        pixel_ratio: f64,
        config: OutlineConfig,
    ) -> Self {
        let width = physical_extent(logical_width, pixel_ratio);
        let height = physical_extent(logical_height, pixel_ratio);
        let device = &engine.device;
        let format = engine.surface_config.format;

        let (color_texture, color_view) = Self::create_color_target(device, format, width, height);
        let (edge_texture, edge_view) = Self::create_color_target(device, format, width, height);
        let (scene_depth_texture, scene_depth_view) =
            RenderEngine::create_depth_texture(device, width, height);

        let normal_pass = NormalPass::new(device, &engine.mesh_bind_group_layout, width, height);
        let depth_pass = DepthPass::new(device, &engine.mesh_bind_group_layout, width, height);
        let mut edge_pass = EdgePass::new(device, format);
        let fxaa_pass = FxaaPass::new(device, format);

        edge_pass.update_uniforms(
            &engine.queue,
            EdgeUniforms {
                resolution: [width as f32, height as f32],
                near: engine.camera.near,
                far: engine.camera.far,
                outline_color: config.color.to_array(),
                thickness: config.thickness,
            },
        );
        fxaa_pass.set_resolution(&engine.queue, width, height);

        Self {
            width,
            height,
            pixel_ratio,
            config,
            color_texture,
            color_view,
            scene_depth_texture,
            scene_depth_view,
            edge_texture,
            edge_view,
            normal_pass,
            depth_pass,
            edge_pass,
            fxaa_pass,
        }
    }

    fn create_color_target(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("outline color target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Applies the resize contract: recompute device-pixel-scaled
    /// dimensions, recreate every target, update the camera's aspect ratio,
    /// and rewrite every resolution-dependent uniform.
    pub fn set_size(&mut self, engine: &mut RenderEngine, logical_width: u32, logical_height: u32) {
        let width = physical_extent(logical_width, self.pixel_ratio);
        let height = physical_extent(logical_height, self.pixel_ratio);
        self.width = width;
        self.height = height;

        let device = &engine.device;
        let format = engine.surface_config.format;

        let (color_texture, color_view) = Self::create_color_target(device, format, width, height);
        self.color_texture = color_texture;
        self.color_view = color_view;

        let (edge_texture, edge_view) = Self::create_color_target(device, format, width, height);
        self.edge_texture = edge_texture;
        self.edge_view = edge_view;

        let (scene_depth_texture, scene_depth_view) =
            RenderEngine::create_depth_texture(device, width, height);
        self.scene_depth_texture = scene_depth_texture;
        self.scene_depth_view = scene_depth_view;

        self.normal_pass.resize(&engine.device, width, height);
        self.depth_pass.resize(&engine.device, width, height);

        engine
            .camera
            .set_aspect_ratio(width as f32 / height as f32);

        let mut uniforms = self.edge_pass.uniforms();
        uniforms.resolution = [width as f32, height as f32];
        uniforms.near = engine.camera.near;
        uniforms.far = engine.camera.far;
        self.edge_pass.update_uniforms(&engine.queue, uniforms);
        self.fxaa_pass.set_resolution(&engine.queue, width, height);
    }

    /// Updates the pixel ratio (e.g. after a window moved across
    /// monitors); takes effect at the next `set_size`.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
    }

    /// Changes the outline thickness without reconstructing the pipeline.
    pub fn set_thickness(&mut self, queue: &wgpu::Queue, thickness: f32) {
        self.config.thickness = thickness;
        let mut uniforms = self.edge_pass.uniforms();
        uniforms.thickness = thickness;
        self.edge_pass.update_uniforms(queue, uniforms);
    }

    /// Changes the outline color without reconstructing the pipeline.
    pub fn set_outline_color(&mut self, queue: &wgpu::Queue, color: Vec3) {
        self.config.color = color;
        let mut uniforms = self.edge_pass.uniforms();
        uniforms.outline_color = color.to_array();
        self.edge_pass.update_uniforms(queue, uniforms);
    }

    /// Returns the current outline parameters.
    #[must_use]
    pub fn config(&self) -> OutlineConfig {
        self.config
    }

    /// Returns the pipeline's render target dimensions in physical pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Executes one full frame: scene, normals, depth, edge filter, FXAA,
    /// and writes the result to `surface_view`.
    pub fn render(
        &mut self,
        engine: &RenderEngine,
        encoder: &mut wgpu::CommandEncoder,
        scene: &GpuScene,
        surface_view: &wgpu::TextureView,
        background: Vec3,
    ) {
        // The camera's clip planes may have been refitted since the last
        // frame (model swap); the edge filter linearizes with the same
        // planes the depth pass rendered with.
        let uniforms = self.edge_pass.uniforms();
        if uniforms.near != engine.camera.near || uniforms.far != engine.camera.far {
            let mut updated = uniforms;
            updated.near = engine.camera.near;
            updated.far = engine.camera.far;
            self.edge_pass.update_uniforms(&engine.queue, updated);
        }

        // 1. Scene pass with true materials.
        engine.draw_scene(
            encoder,
            &self.color_view,
            &self.scene_depth_view,
            scene,
            background,
        );

        // 2. Normal prepass into the normal buffer.
        self.normal_pass.render(encoder, scene);

        // 3. Depth prepass into the readable depth buffer.
        self.depth_pass.render(encoder, scene);

        // 4. Edge filter composites outlines over the scene color.
        let edge_bind_group = self.edge_pass.create_bind_group(
            &engine.device,
            &self.color_view,
            self.normal_pass.view(),
            self.depth_pass.view(),
        );
        self.edge_pass
            .render(encoder, &self.edge_view, &edge_bind_group);

        // 5. FXAA into the visible framebuffer.
        self.fxaa_pass
            .render_to_target(&engine.device, encoder, &self.edge_view, surface_view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_extent_rounds_per_platform_convention() {
        assert_eq!(physical_extent(800, 1.0), 800);
        assert_eq!(physical_extent(800, 2.0), 1600);
        assert_eq!(physical_extent(800, 1.5), 1200);
        // 801 * 1.25 = 1001.25 rounds down; 801 * 1.5 = 1201.5 rounds up.
        assert_eq!(physical_extent(801, 1.25), 1001);
        assert_eq!(physical_extent(801, 1.5), 1202);
    }

    #[test]
    fn test_physical_extent_never_zero() {
        assert_eq!(physical_extent(0, 2.0), 1);
        assert_eq!(physical_extent(1, 0.1), 1);
    }
}
