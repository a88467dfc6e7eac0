//! Headless rendering: one-shot frames without a window.
//!
//! Useful for integration tests, batch processing, and automated
//! screenshot generation.

use pollster::FutureExt;

use celscope_core::{CelscopeError, Result, ViewerState};
use celscope_render::{GpuScene, OutlinePipeline, RenderEngine};

/// Renders the state's scene to a tightly packed RGBA8 pixel buffer.
///
/// Creates a headless GPU context, renders one frame (through the outline
/// pipeline when toon shading is enabled, directly otherwise), and reads
/// the result back. The returned buffer holds `width * height * 4` bytes,
/// rows ordered top to bottom.
pub fn render_to_image(state: &ViewerState, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut engine = RenderEngine::new_headless(width, height)
        .block_on()
        .map_err(|e| CelscopeError::Render(format!("failed to create headless engine: {e}")))?;

    if let Some(model) = &state.model {
        if let Some((min, max)) = model.bounding_box() {
            engine.camera.look_at_box(min, max);
        }
    }
    engine.update_camera_uniforms();

    let scene = state
        .model
        .as_ref()
        .map_or_else(GpuScene::empty, |model| GpuScene::build(&engine, model));

    let texture = engine.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("headless target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: engine.surface_config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = engine
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("headless encoder"),
        });

    if state.options.toon_enabled {
        let mut outline = OutlinePipeline::new(&engine, width, height, 1.0, state.options.outline);
        outline.render(
            &engine,
            &mut encoder,
            &scene,
            &view,
            state.options.background_color,
        );
        engine.queue.submit(std::iter::once(encoder.finish()));
    } else {
        engine.draw_scene(
            &mut encoder,
            &view,
            &engine.depth_view,
            &scene,
            state.options.background_color,
        );
        engine.queue.submit(std::iter::once(encoder.finish()));
    }

    celscope_render::read_texture_rgba(&engine.device, &engine.queue, &texture, width, height)
        .map_err(|e| CelscopeError::Render(format!("readback failed: {e}")))
}

/// Renders the state's scene and saves it as a PNG or JPEG file.
pub fn render_to_file(
    state: &ViewerState,
    filename: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    let data = render_to_image(state, width, height)?;
    celscope_render::save_image(filename, &data, width, height)
        .map_err(|e| CelscopeError::Render(format!("failed to save image: {e}")))
}
