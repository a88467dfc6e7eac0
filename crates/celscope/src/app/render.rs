use super::{App, GpuScene};

impl App {
    /// Renders one frame.
    ///
    /// Per displayed frame the outline pipeline runs scene, normal, depth,
    /// edge-filter, and FXAA passes in strict order. When toon shading is
    /// disabled, none of those passes run and the scene draws directly to
    /// the surface.
    pub(super) fn render(&mut self) {
        self.poll_loader();
        self.advance_auto_rotate();

        let Some(engine) = &mut self.engine else {
            return;
        };

        if self.scene_dirty {
            self.gpu_scene = self
                .state
                .model
                .as_ref()
                .map(|model| GpuScene::build(engine, model));
            self.scene_dirty = false;
            self.transforms_dirty = false;
        } else if self.transforms_dirty {
            if let (Some(scene), Some(model)) = (&mut self.gpu_scene, &self.state.model) {
                scene.update_transforms(&engine.queue, model);
            }
            self.transforms_dirty = false;
        }

        engine.update_camera_uniforms();

        let Some(surface) = engine.surface.as_ref() else {
            return;
        };
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                engine.resize(engine.width, engine.height);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of memory");
                self.close_requested = true;
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout");
                return;
            }
            Err(wgpu::SurfaceError::Other) => {
                log::warn!("surface error: other");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let empty = GpuScene::empty();
        let scene = self.gpu_scene.as_ref().unwrap_or(&empty);
        let background = self.state.options.background_color;

        // Caller-level branch: disabled mode runs none of the outline
        // passes and draws straight to the surface.
        let toon_on = self.state.options.toon_enabled;
        if let (true, Some(outline)) = (toon_on, &mut self.outline) {
            outline.render(engine, &mut encoder, scene, &view, background);
        } else {
            engine.draw_scene(&mut encoder, &view, &engine.depth_view, scene, background);
        }

        engine.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(filename) = self.screenshot_pending.take() {
            self.capture_screenshot(&filename);
        }
    }

    /// Applies a finished model load, if one is ready.
    ///
    /// Failures are logged and the current model is preserved; a success
    /// atomically swaps the displayed model and refits the camera.
    fn poll_loader(&mut self) {
        let Some((name, outcome)) = self.loader.poll() else {
            return;
        };

        match outcome {
            Ok(model) => {
                let bounds = model.bounding_box();
                let old = self.state.swap_model(name, model);
                drop(old);

                if let (Some(engine), Some((min, max))) = (&mut self.engine, bounds) {
                    engine.camera.look_at_box(min, max);
                }
                self.scene_dirty = true;
            }
            Err(e) => {
                log::error!("model load failed: {e}");
            }
        }
    }

    /// Advances the auto-rotate spin by the frame delta.
    fn advance_auto_rotate(&mut self) {
        let now = std::time::Instant::now();
        let dt = self
            .last_frame_time
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame_time = Some(now);

        if !self.state.options.auto_rotate || dt <= 0.0 {
            return;
        }
        if let Some(model) = &mut self.state.model {
            let angle = dt * self.state.options.rotate_speed;
            model.transform = glam::Mat4::from_rotation_y(angle) * model.transform;
            self.transforms_dirty = true;
        }
    }

    /// Renders one extra frame into a readable texture and saves it.
    fn capture_screenshot(&mut self, filename: &str) {
        let Some(engine) = &mut self.engine else {
            return;
        };

        let (width, height) = engine.dimensions();
        let texture = engine.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("screenshot texture"),
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
                label: Some("screenshot encoder"),
            });

        let empty = GpuScene::empty();
        let scene = self.gpu_scene.as_ref().unwrap_or(&empty);
        let background = self.state.options.background_color;

        if let (true, Some(outline)) = (self.state.options.toon_enabled, &mut self.outline) {
            outline.render(engine, &mut encoder, scene, &view, background);
        } else {
            engine.draw_scene(&mut encoder, &view, &engine.depth_view, scene, background);
        }

        engine.queue.submit(std::iter::once(encoder.finish()));

        match celscope_render::read_texture_rgba(
            &engine.device,
            &engine.queue,
            &texture,
            width,
            height,
        ) {
            Ok(mut data) => {
                if matches!(
                    engine.surface_config.format,
                    wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
                ) {
                    for pixel in data.chunks_exact_mut(4) {
                        pixel.swap(0, 2);
                    }
                }
                match celscope_render::save_image(filename, &data, width, height) {
                    Ok(()) => log::info!("saved screenshot to {filename}"),
                    Err(e) => log::error!("screenshot save failed: {e}"),
                }
            }
            Err(e) => log::error!("screenshot readback failed: {e}"),
        }
    }
}
