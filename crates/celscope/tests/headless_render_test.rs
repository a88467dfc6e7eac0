//! Headless GPU integration tests.
//!
//! These need a working GPU adapter and are ignored by default.
//! Run manually with: cargo test -- --ignored

use celscope::*;

fn cube_state() -> ViewerState {
    let vertices = vec![
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ];
    let triangles = vec![
        [4, 5, 6],
        [4, 6, 7],
        [1, 0, 3],
        [1, 3, 2],
        [5, 1, 2],
        [5, 2, 6],
        [0, 4, 7],
        [0, 7, 3],
        [7, 6, 2],
        [7, 2, 3],
        [0, 1, 5],
        [0, 5, 4],
    ];

    let mut state = ViewerState::new();
    state.swap_model("cube", Node::with_mesh("cube", Mesh::new(vertices, triangles)));
    state
}

#[test]
#[ignore]
fn test_headless_render_produces_full_buffer() {
    let state = cube_state();
    let pixels = render_to_image(&state, 320, 240).expect("headless render");
    assert_eq!(pixels.len(), 320 * 240 * 4);

    // The outlined cube must darken some pixels relative to the flat
    // background.
    let background = &pixels[0..4];
    assert!(
        pixels.chunks_exact(4).any(|p| p[0] != background[0]),
        "frame is a solid color; nothing was drawn"
    );
}

#[test]
#[ignore]
fn test_disabled_mode_skips_outline_pipeline() {
    let mut state = cube_state();
    state.set_toon_enabled(false);
    let pixels = render_to_image(&state, 128, 128).expect("direct render");
    assert_eq!(pixels.len(), 128 * 128 * 4);
}

#[test]
#[ignore]
fn test_set_size_then_render_does_not_crash() {
    use pollster::FutureExt;

    let mut engine = RenderEngine::new_headless(256, 256)
        .block_on()
        .expect("headless engine");
    let mut outline = OutlinePipeline::new(&engine, 256, 256, 1.25, OutlineConfig::default());

    outline.set_size(&mut engine, 200, 100);
    assert_eq!(
        outline.dimensions(),
        (physical_extent(200, 1.25), physical_extent(100, 1.25))
    );

    let texture = engine.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("resize test target"),
        size: wgpu::Extent3d {
            width: 256,
            height: 256,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: engine.surface_config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let scene = GpuScene::empty();
    let mut encoder = engine
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    outline.render(&engine, &mut encoder, &scene, &view, Vec3::ONE);
    engine.queue.submit(std::iter::once(encoder.finish()));
}
