use super::{
    ActiveEventLoop, App, ApplicationHandler, Arc, ElementState, FutureExt, KeyCode, LogicalSize,
    MouseButton, OutlinePipeline, RenderEngine, Window, WindowEvent, WindowId,
};

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("celscope")
            .with_inner_size(LogicalSize::new(1280, 720));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create window"),
        );

        let mut engine = RenderEngine::new_windowed(window.clone())
            .block_on()
            .expect("failed to create render engine");

        if let Some(model) = &self.state.model {
            if let Some((min, max)) = model.bounding_box() {
                engine.camera.look_at_box(min, max);
            }
        }

        let scale_factor = window.scale_factor();
        let logical: LogicalSize<u32> = window.inner_size().to_logical(scale_factor);
        let outline = OutlinePipeline::new(
            &engine,
            logical.width.max(1),
            logical.height.max(1),
            scale_factor,
            self.state.options.outline,
        );

        self.window = Some(window);
        self.engine = Some(engine);
        self.outline = Some(outline);
        self.scene_dirty = true;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let (Some(engine), Some(outline), Some(window)) =
                    (&mut self.engine, &mut self.outline, &self.window)
                {
                    engine.resize(size.width, size.height);
                    let logical: LogicalSize<u32> = size.to_logical(window.scale_factor());
                    outline.set_size(engine, logical.width.max(1), logical.height.max(1));
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(outline) = &mut self.outline {
                    outline.set_pixel_ratio(scale_factor);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let delta_x = position.x - self.mouse_pos.0;
                let delta_y = position.y - self.mouse_pos.1;
                self.mouse_pos = (position.x, position.y);

                if self.left_mouse_down {
                    if let Some(engine) = &mut self.engine {
                        engine
                            .camera
                            .orbit(delta_x as f32 * 0.01, delta_y as f32 * 0.01);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.left_mouse_down = state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(engine) = &mut self.engine {
                    let scroll = match delta {
                        winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                        winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                    };
                    let scale = engine.camera.position.distance(engine.camera.target) * 0.1;
                    engine.camera.zoom(scroll * scale);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let winit::keyboard::PhysicalKey::Code(code) = event.physical_key {
                    match code {
                        KeyCode::Escape => {
                            self.close_requested = true;
                        }
                        KeyCode::KeyT => {
                            self.state.toggle_toon();
                            self.scene_dirty = true;
                            log::info!(
                                "toon shading {}",
                                if self.state.options.toon_enabled {
                                    "enabled"
                                } else {
                                    "disabled"
                                }
                            );
                        }
                        KeyCode::KeyR => {
                            self.state.options.auto_rotate = !self.state.options.auto_rotate;
                        }
                        KeyCode::F12 => {
                            self.request_auto_screenshot();
                            log::info!("screenshot requested (F12)");
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::DroppedFile(path) => {
                self.loader.request(path);
            }
            _ => {}
        }

        if self.close_requested {
            event_loop.exit();
        }
    }
}
