//! Screen-space edge detection and outline compositing.
//!
//! The GPU pass lives in [`EdgePass`]; the filter math is also implemented
//! as plain scalar functions below, which the WGSL mirrors expression for
//! expression. The scalar form documents the filter and is what the unit
//! and property tests exercise.

use glam::Vec3;
use wgpu::util::DeviceExt;

/// Raw depth samples at or beyond this value are background and never
/// outlined.
pub const BACKGROUND_DEPTH_THRESHOLD: f32 = 0.9999;

/// Combined edge indicators at or below this value pass the input color
/// through exactly.
pub const EDGE_THRESHOLD: f32 = 0.1;

/// Reconstructs linear depth from a non-linear device depth sample.
#[must_use]
pub fn linearize_depth(z: f32, near: f32, far: f32) -> f32 {
    (2.0 * near * far) / (far + near - (2.0 * z - 1.0) * (far - near))
}

/// Hermite smoothstep matching the WGSL builtin.
#[must_use]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Depth-edge indicator from horizontal and vertical linear-depth
/// differences, smoothly thresholded.
#[must_use]
pub fn depth_edge_indicator(dx: f32, dy: f32) -> f32 {
    smoothstep(0.5, 0.6, (dx * dx + dy * dy).sqrt())
}

/// Normal-edge indicator from the summed squared horizontal/vertical
/// normal differences, smoothly thresholded.
#[must_use]
pub fn normal_edge_indicator(dnx: Vec3, dny: Vec3) -> f32 {
    smoothstep(0.08, 0.13, dnx.dot(dnx) + dny.dot(dny))
}

/// Outline blend weight: fully opaque near the camera, fading toward
/// transparency with distance. Bounded in [0, 1] whenever `edge` is.
#[must_use]
pub fn outline_blend_weight(center_linear_depth: f32, edge: f32) -> f32 {
    (12.0 / (2.0 + center_linear_depth)).clamp(0.0, 1.0) * edge
}

/// One pixel's worth of filter inputs: the center samples plus the four
/// neighbors offset by ±thickness texels along each axis.
#[derive(Debug, Clone, Copy)]
pub struct FilterInputs {
    /// Scene color at the center pixel.
    pub color: Vec3,
    /// Raw (non-linear) depth at the center pixel.
    pub depth: f32,
    /// Raw depth at (-x, +x) neighbors.
    pub depth_x: (f32, f32),
    /// Raw depth at (-y, +y) neighbors.
    pub depth_y: (f32, f32),
    /// Normals at (-x, +x) neighbors.
    pub normal_x: (Vec3, Vec3),
    /// Normals at (-y, +y) neighbors.
    pub normal_y: (Vec3, Vec3),
}

/// Scalar reference implementation of the edge filter for one pixel.
///
/// Mirrors `shaders/edge_filter.wgsl`.
#[must_use]
pub fn filter_pixel(
    inputs: &FilterInputs,
    near: f32,
    far: f32,
    outline_color: Vec3,
) -> Vec3 {
    if inputs.depth >= BACKGROUND_DEPTH_THRESHOLD {
        return inputs.color;
    }

    let dx = linearize_depth(inputs.depth_x.1, near, far) - linearize_depth(inputs.depth_x.0, near, far);
    let dy = linearize_depth(inputs.depth_y.1, near, far) - linearize_depth(inputs.depth_y.0, near, far);
    let depth_edge = depth_edge_indicator(dx, dy);

    let dnx = inputs.normal_x.1 - inputs.normal_x.0;
    let dny = inputs.normal_y.1 - inputs.normal_y.0;
    let normal_edge = normal_edge_indicator(dnx, dny);

    let edge = depth_edge.max(normal_edge);
    if edge <= EDGE_THRESHOLD {
        return inputs.color;
    }

    let center = linearize_depth(inputs.depth, near, far);
    let weight = outline_blend_weight(center, edge);
    inputs.color.lerp(outline_color, weight)
}

/// GPU representation of the edge filter uniforms.
/// Note: Layout must match WGSL EdgeUniforms exactly (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EdgeUniforms {
    /// Render target resolution in pixels.
    pub resolution: [f32; 2],
    /// Camera near plane.
    pub near: f32,
    /// Camera far plane.
    pub far: f32,
    /// Outline stroke color.
    pub outline_color: [f32; 3],
    /// Neighbor sampling offset in texels.
    pub thickness: f32,
}

impl Default for EdgeUniforms {
    fn default() -> Self {
        Self {
            resolution: [1280.0, 720.0],
            near: 0.1,
            far: 100.0,
            outline_color: [0.0, 0.0, 0.0],
            thickness: 1.0,
        }
    }
}

/// Edge filter pass resources.
pub struct EdgePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    depth_sampler: wgpu::Sampler,
    uniforms: EdgeUniforms,
}

impl EdgePass {
    /// Creates the edge filter pass.
    #[must_use]
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("edge filter bind group layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Scene color
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Normal buffer
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Depth buffer
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Color/normal sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Depth sampler (non-filtering)
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("edge filter shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/edge_filter.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("edge filter pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("edge filter pipeline"),
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
                    format: output_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniforms = EdgeUniforms::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("edge filter uniform buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Nearest on purpose: the normal buffer must be fetched per texel,
        // not blended across the very discontinuities being detected.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("edge filter sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let depth_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("edge filter depth sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            depth_sampler,
            uniforms,
        }
    }

    /// Returns the current uniform values.
    #[must_use]
    pub fn uniforms(&self) -> EdgeUniforms {
        self.uniforms
    }

    /// Rewrites the uniform block.
    pub fn update_uniforms(&mut self, queue: &wgpu::Queue, uniforms: EdgeUniforms) {
        self.uniforms = uniforms;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Creates a bind group over the three input buffers.
    #[must_use]
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        color_view: &wgpu::TextureView,
        normal_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("edge filter bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.depth_sampler),
                },
            ],
        })
    }

    /// Renders the edge filter as a fullscreen triangle.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("edge filter pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NEAR: f32 = 0.1;
    const FAR: f32 = 100.0;

    fn flat_inputs(color: Vec3, depth: f32) -> FilterInputs {
        FilterInputs {
            color,
            depth,
            depth_x: (depth, depth),
            depth_y: (depth, depth),
            normal_x: (Vec3::Z, Vec3::Z),
            normal_y: (Vec3::Z, Vec3::Z),
        }
    }

    #[test]
    fn test_background_passes_through() {
        let color = Vec3::new(0.2, 0.4, 0.6);
        let mut inputs = flat_inputs(color, 1.0);
        // Even with wildly different neighbors, a background center pixel
        // is never outlined.
        inputs.normal_x = (Vec3::X, Vec3::NEG_X);
        inputs.depth_x = (0.1, 0.9);

        let out = filter_pixel(&inputs, NEAR, FAR, Vec3::ZERO);
        assert_eq!(out, color);

        let out = filter_pixel(&flat_inputs(color, 0.9999), NEAR, FAR, Vec3::ZERO);
        assert_eq!(out, color);
    }

    #[test]
    fn test_flat_interior_passes_through() {
        let color = Vec3::new(0.8, 0.1, 0.1);
        let out = filter_pixel(&flat_inputs(color, 0.5), NEAR, FAR, Vec3::ZERO);
        assert_eq!(out, color);
    }

    #[test]
    fn test_cube_face_boundary_triggers_normal_edge() {
        // Two faces of a unit cube meet at 90 degrees: normals +Z and +X.
        let dn = Vec3::X - Vec3::Z;
        let indicator = normal_edge_indicator(dn, Vec3::ZERO);
        assert!(indicator > 0.99, "indicator = {indicator}");

        // Flat face interior: identical normals on both sides.
        assert_eq!(normal_edge_indicator(Vec3::ZERO, Vec3::ZERO), 0.0);
    }

    #[test]
    fn test_coplanar_depth_bent_normals() {
        // Two triangles sharing an edge at the same depth but different
        // orientations: depth differences are ~zero, normals differ.
        let n_left = Vec3::new(-0.5, 0.0, 0.866).normalize();
        let n_right = Vec3::new(0.5, 0.0, 0.866).normalize();

        let inputs = FilterInputs {
            color: Vec3::ONE,
            depth: 0.5,
            depth_x: (0.5, 0.5),
            depth_y: (0.5, 0.5),
            normal_x: (n_left, n_right),
            normal_y: (n_left, n_left),
        };

        let dx = linearize_depth(0.5, NEAR, FAR) - linearize_depth(0.5, NEAR, FAR);
        assert_eq!(depth_edge_indicator(dx, 0.0), 0.0);
        assert!(normal_edge_indicator(n_right - n_left, Vec3::ZERO) > 0.99);

        let out = filter_pixel(&inputs, NEAR, FAR, Vec3::ZERO);
        assert_ne!(out, Vec3::ONE, "edge should blend the outline color in");
    }

    #[test]
    fn test_outline_darkens_toward_outline_color() {
        let inputs = FilterInputs {
            color: Vec3::ONE,
            depth: 0.2,
            depth_x: (0.2, 0.2),
            depth_y: (0.2, 0.2),
            normal_x: (Vec3::Z, Vec3::X),
            normal_y: (Vec3::Z, Vec3::Z),
        };
        let out = filter_pixel(&inputs, NEAR, FAR, Vec3::ZERO);
        assert!(out.x < 1.0 && out.y < 1.0 && out.z < 1.0);
    }

    #[test]
    fn test_blend_weight_saturates_near_camera() {
        // 12 / (2 + d) >= 1 for d <= 10, so near geometry gets the full
        // edge value.
        assert_eq!(outline_blend_weight(1.0, 1.0), 1.0);
        assert_eq!(outline_blend_weight(10.0, 1.0), 1.0);
        assert!(outline_blend_weight(50.0, 1.0) < 0.5);
    }

    proptest! {
        #[test]
        fn prop_linearize_monotonic(a in 0.0f32..0.999, b in 0.0f32..0.999) {
            // Keep the samples a representable distance apart so f32
            // rounding cannot collapse the strict inequality.
            prop_assume!(b - a >= 1e-4);
            let la = linearize_depth(a, NEAR, FAR);
            let lb = linearize_depth(b, NEAR, FAR);
            prop_assert!(la < lb, "la = {la}, lb = {lb}");
        }

        #[test]
        fn prop_blend_weight_bounded(depth in 0.0f32..1.0e6, edge in 0.0f32..1.0) {
            let w = outline_blend_weight(depth, edge);
            prop_assert!((0.0..=1.0).contains(&w));
        }

        #[test]
        fn prop_blend_weight_non_increasing_in_depth(
            d0 in 0.0f32..1.0e4,
            delta in 0.0f32..1.0e4,
            edge in 0.0f32..1.0,
        ) {
            let near_w = outline_blend_weight(d0, edge);
            let far_w = outline_blend_weight(d0 + delta, edge);
            prop_assert!(far_w <= near_w + f32::EPSILON);
        }

        #[test]
        fn prop_subthreshold_is_identity(
            r in 0.0f32..1.0, g in 0.0f32..1.0, b in 0.0f32..1.0,
            depth in 0.0f32..0.99,
        ) {
            // Identical neighbors produce zero indicators, which is below
            // the 0.1 threshold; output must equal input exactly.
            let color = Vec3::new(r, g, b);
            let out = filter_pixel(&flat_inputs(color, depth), NEAR, FAR, Vec3::ZERO);
            prop_assert_eq!(out, color);
        }
    }
}
