//! GPU resources for mesh drawing.
//!
//! Each material slot of each mesh becomes one draw item with its own
//! expanded geometry buffers. Geometry is expanded to per-triangle-vertex
//! storage buffers indexed by `vertex_index`, so multi-material meshes
//! simply expand each slot's triangle range separately.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use celscope_core::{Material, Mesh, Node};

use crate::engine::RenderEngine;
use crate::textures;

/// Uniforms for one mesh draw.
/// Note: Layout must match WGSL MeshUniforms exactly (96 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct MeshUniforms {
    /// Model (world) transform.
    pub model: [[f32; 4]; 4],
    /// Base color (rgb) and opacity (a).
    pub base_color: [f32; 4],
    /// Shading mode: 0 = standard, 1 = toon ramp lookup.
    pub shading_mode: u32,
    /// Whether the albedo texture modulates the base color.
    pub use_albedo: u32,
    /// Whether back faces are lit with a flipped normal.
    pub double_sided: u32,
    pub _pad: u32,
}

impl Default for MeshUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            shading_mode: 0,
            use_albedo: 0,
            double_sided: 0,
            _pad: 0,
        }
    }
}

/// GPU resources for one mesh/slot draw.
pub struct MeshRenderData {
    /// Position buffer (storage, vec4 for alignment).
    pub position_buffer: wgpu::Buffer,
    /// Normal buffer (storage, vec4 for alignment).
    pub normal_buffer: wgpu::Buffer,
    /// UV buffer (storage, vec2).
    pub uv_buffer: wgpu::Buffer,
    /// Uniform buffer.
    pub uniform_buffer: wgpu::Buffer,
    /// Group 0 bind group (camera + uniforms + geometry).
    pub bind_group: wgpu::BindGroup,
    /// Group 1 bind group (albedo + ramp textures).
    pub texture_bind_group: wgpu::BindGroup,
    /// Number of expanded vertices (triangles × 3).
    pub vertex_count: u32,
    /// Whether the material is double-sided (selects the no-cull pipeline).
    pub double_sided: bool,
    /// Whether the material blends.
    pub transparent: bool,
    /// Cached uniform contents, rewritten on transform updates.
    pub uniforms: MeshUniforms,
}

impl MeshRenderData {
    fn new(
        engine: &RenderEngine,
        mesh: &Mesh,
        slot: usize,
        material: &Material,
        world: Mat4,
        ramp_views: &mut HashMap<usize, wgpu::TextureView>,
    ) -> Self {
        let device = &engine.device;
        let range = mesh.slot_triangles(slot);

        let mut positions: Vec<f32> = Vec::with_capacity(range.count as usize * 3 * 4);
        let mut normals: Vec<f32> = Vec::with_capacity(range.count as usize * 3 * 4);
        let mut uvs: Vec<f32> = Vec::with_capacity(range.count as usize * 3 * 2);

        let end = ((range.start + range.count) as usize).min(mesh.triangles.len());
        for tri in &mesh.triangles[range.start as usize..end] {
            for &vi in tri {
                let v = mesh.vertices[vi as usize];
                positions.extend_from_slice(&[v.x, v.y, v.z, 1.0]);

                let n = mesh
                    .normals
                    .get(vi as usize)
                    .copied()
                    .unwrap_or(Vec3::Y);
                normals.extend_from_slice(&[n.x, n.y, n.z, 0.0]);

                let uv = mesh.uvs.get(vi as usize).copied().unwrap_or(Vec2::ZERO);
                uvs.extend_from_slice(&[uv.x, uv.y]);
            }
        }
        let vertex_count = (end as u32 - range.start) * 3;

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh positions"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh normals"),
            contents: bytemuck::cast_slice(&normals),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let uv_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh uvs"),
            contents: bytemuck::cast_slice(&uvs),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let base = material.base_color();
        let uniforms = MeshUniforms {
            model: world.to_cols_array_2d(),
            base_color: [
                base.x,
                base.y,
                base.z,
                if material.transparent() {
                    material.opacity()
                } else {
                    1.0
                },
            ],
            shading_mode: u32::from(material.is_toon()),
            use_albedo: u32::from(material.albedo().is_some()),
            double_sided: u32::from(material.side() == celscope_core::CullSide::Double),
            _pad: 0,
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh bind group"),
            layout: &engine.mesh_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: engine.camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: normal_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: uv_buffer.as_entire_binding(),
                },
            ],
        });

        // Upload each distinct ramp once per scene build; draws sharing a
        // ramp Arc share the GPU texture.
        let ramp_view: &wgpu::TextureView = match material {
            Material::Toon(toon) => {
                let key = std::sync::Arc::as_ptr(&toon.ramp) as usize;
                ramp_views.entry(key).or_insert_with(|| {
                    textures::upload_ramp(&engine.device, &engine.queue, &toon.ramp)
                })
            }
            Material::Standard(_) => &engine.default_ramp_view,
        };

        let albedo_view = material
            .albedo()
            .map(|tex| textures::upload_albedo(&engine.device, &engine.queue, tex));

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material textures bind group"),
            layout: &engine.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        albedo_view.as_ref().unwrap_or(&engine.white_view),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&engine.albedo_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(ramp_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&engine.ramp_sampler),
                },
            ],
        });

        Self {
            position_buffer,
            normal_buffer,
            uv_buffer,
            uniform_buffer,
            bind_group,
            texture_bind_group,
            vertex_count,
            double_sided: material.side() == celscope_core::CullSide::Double,
            transparent: material.transparent(),
            uniforms,
        }
    }

    /// Rewrites the model transform, keeping material parameters.
    pub fn update_transform(&mut self, queue: &wgpu::Queue, world: Mat4) {
        self.uniforms.model = world.to_cols_array_2d();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms]),
        );
    }
}

/// All draw items for the current model, in draw order (opaque first).
pub struct GpuScene {
    /// Draw items.
    pub draws: Vec<MeshRenderData>,
}

impl GpuScene {
    /// An empty scene; drawing it just clears the targets.
    #[must_use]
    pub fn empty() -> Self {
        Self { draws: Vec::new() }
    }

    /// Builds GPU resources for every mesh/slot in the tree.
    ///
    /// Called on model swap and shading toggle, not per frame.
    #[must_use]
    pub fn build(engine: &RenderEngine, root: &Node) -> Self {
        let mut ramp_views = HashMap::new();
        let mut draws = Vec::new();

        root.visit_meshes_with_transform(&mut |mesh, world| {
            for slot in 0..mesh.slots.len() {
                let material = mesh.slots.get(slot).expect("slot index in range");
                draws.push(MeshRenderData::new(
                    engine,
                    mesh,
                    slot,
                    material,
                    world,
                    &mut ramp_views,
                ));
            }
        });

        // Opaque geometry first so transparent surfaces blend over it.
        draws.sort_by_key(|d| d.transparent);

        log::debug!("built gpu scene: {} draw(s)", draws.len());
        Self { draws }
    }

    /// Rewrites every draw's model transform from the current node tree.
    ///
    /// Must visit in the same order as [`GpuScene::build`]; the tree's
    /// structure does not change between swaps, only its transforms.
    pub fn update_transforms(&mut self, queue: &wgpu::Queue, root: &Node) {
        // Rebuild the (mesh, world) sequence in traversal order, then apply
        // it per draw. Transparent draws were sorted to the back, so match
        // through the same sort.
        let mut worlds: Vec<(Mat4, bool)> = Vec::with_capacity(self.draws.len());
        root.visit_meshes_with_transform(&mut |mesh, world| {
            for slot in 0..mesh.slots.len() {
                let transparent = mesh
                    .slots
                    .get(slot)
                    .is_some_and(celscope_core::Material::transparent);
                worlds.push((world, transparent));
            }
        });
        worlds.sort_by_key(|&(_, transparent)| transparent);

        for (draw, (world, _)) in self.draws.iter_mut().zip(worlds) {
            draw.update_transform(queue, world);
        }
    }

    /// Returns true when there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_uniforms_size() {
        let size = std::mem::size_of::<MeshUniforms>();

        // Expected size breakdown:
        // model: 64 bytes (mat4)
        // base_color: 16 bytes (vec4)
        // shading_mode + use_albedo + double_sided + _pad: 16 bytes
        // Total: 96 bytes, 16-byte aligned for uniform buffers.
        assert_eq!(size, 96);
        assert_eq!(size % 16, 0);
    }

    #[test]
    fn test_mesh_uniforms_default() {
        let uniforms = MeshUniforms::default();
        assert_eq!(uniforms.shading_mode, 0);
        assert_eq!(uniforms.use_albedo, 0);
        assert_eq!(uniforms.base_color, [1.0, 1.0, 1.0, 1.0]);
    }
}
