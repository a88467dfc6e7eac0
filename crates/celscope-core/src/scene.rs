//! Owned scene graph: nodes, meshes, and traversal helpers.

use glam::{Mat4, Vec2, Vec3};

use crate::material::{Material, MaterialSlots, StandardMaterial};

/// A triangle range belonging to one material slot.
///
/// Ranges are expressed in triangles, not indices, and partition the mesh's
/// triangle list in slot order when the mesh is multi-material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    /// First triangle of the range.
    pub start: u32,
    /// Number of triangles in the range.
    pub count: u32,
}

/// Triangle mesh geometry plus its material slots.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals, same length as `vertices`.
    pub normals: Vec<Vec3>,
    /// Per-vertex texture coordinates; empty when the mesh is untextured.
    pub uvs: Vec<Vec2>,
    /// Triangle vertex indices.
    pub triangles: Vec<[u32; 3]>,
    /// Per-slot triangle ranges, aligned with `slots` when multi-material.
    /// Empty means every triangle belongs to slot 0.
    pub slot_ranges: Vec<SlotRange>,
    /// Active material slots.
    pub slots: MaterialSlots,
    /// Pre-toon material backup. Populated on first toon derivation and
    /// kept for the mesh's lifetime so shading can be toggled without
    /// reloading the asset.
    pub original: Option<MaterialSlots>,
}

impl Mesh {
    /// Creates a single-slot mesh with a default material.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        let normals = compute_vertex_normals(&vertices, &triangles);
        Self {
            vertices,
            normals,
            uvs: Vec::new(),
            triangles,
            slot_ranges: Vec::new(),
            slots: MaterialSlots::Single(Material::Standard(StandardMaterial::default())),
            original: None,
        }
    }

    /// Replaces the active material slots. `slot_ranges` must already be
    /// consistent when switching to multi-material.
    pub fn set_slots(&mut self, slots: MaterialSlots) {
        self.slots = slots;
    }

    /// Returns the triangle range drawn with the given slot.
    #[must_use]
    pub fn slot_triangles(&self, slot: usize) -> SlotRange {
        if self.slot_ranges.is_empty() {
            SlotRange {
                start: 0,
                count: self.triangles.len() as u32,
            }
        } else {
            self.slot_ranges.get(slot).copied().unwrap_or(SlotRange {
                start: 0,
                count: 0,
            })
        }
    }

    /// Returns the axis-aligned bounding box of the raw vertex positions,
    /// or `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &v in &self.vertices {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }
}

/// Computes area-weighted vertex normals from triangle geometry.
#[must_use]
pub fn compute_vertex_normals(vertices: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| vertices[i as usize]);
        // Cross product length is proportional to triangle area, so
        // accumulating the unnormalized cross gives area weighting.
        let face = (b - a).cross(c - a);
        for &i in tri {
            normals[i as usize] += face;
        }
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
        if *n == Vec3::ZERO {
            *n = Vec3::Y;
        }
    }
    normals
}

/// A node in the owned scene tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name, used for logging only.
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Mat4,
    /// Optional mesh attached to this node.
    pub mesh: Option<Mesh>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Node {
    /// Creates an empty node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Creates a node carrying a mesh.
    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            mesh: Some(mesh),
            children: Vec::new(),
        }
    }

    /// Appends a child node.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Visits this node and every descendant, depth-first.
    pub fn visit(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Visits every mesh in the subtree, depth-first, regardless of
    /// nesting depth.
    pub fn visit_meshes_mut(&mut self, f: &mut impl FnMut(&mut Mesh)) {
        if let Some(mesh) = &mut self.mesh {
            f(mesh);
        }
        for child in &mut self.children {
            child.visit_meshes_mut(f);
        }
    }

    /// Visits every mesh with its world transform, depth-first.
    pub fn visit_meshes_with_transform(&self, f: &mut impl FnMut(&Mesh, Mat4)) {
        self.visit_meshes_with_transform_inner(Mat4::IDENTITY, f);
    }

    fn visit_meshes_with_transform_inner(&self, parent: Mat4, f: &mut impl FnMut(&Mesh, Mat4)) {
        let world = parent * self.transform;
        if let Some(mesh) = &self.mesh {
            f(mesh, world);
        }
        for child in &self.children {
            child.visit_meshes_with_transform_inner(world, f);
        }
    }

    /// Returns the number of meshes in the subtree.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |node| {
            if node.mesh.is_some() {
                count += 1;
            }
        });
        count
    }

    /// Returns the world-space bounding box of all meshes in the subtree,
    /// or `None` if the subtree has no geometry.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut has_extent = false;

        self.visit_meshes_with_transform(&mut |mesh, world| {
            for &v in &mesh.vertices {
                let p = world.transform_point3(v);
                min = min.min(p);
                max = max.max(p);
                has_extent = true;
            }
        });

        has_extent.then_some((min, max))
    }

    /// Centers the subtree at the origin and scales it so its bounding-box
    /// diagonal equals `target_size`.
    ///
    /// A degenerate bounding box (zero diagonal, e.g. a single point or an
    /// empty model) keeps a unit scale factor instead of dividing by zero.
    pub fn normalize_placement(&mut self, target_size: f32) {
        let Some((min, max)) = self.bounding_box() else {
            return;
        };

        let center = (min + max) * 0.5;
        let diagonal = (max - min).length();
        let scale = if diagonal > 0.0 {
            target_size / diagonal
        } else {
            1.0
        };

        self.transform = Mat4::from_scale(Vec3::splat(scale))
            * Mat4::from_translation(-center)
            * self.transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_visit_meshes_reaches_all_depths() {
        let mut root = Node::new("root");
        let mut mid = Node::with_mesh("mid", unit_triangle());
        mid.add_child(Node::with_mesh("deep", unit_triangle()));
        root.add_child(mid);

        let mut visited = 0;
        root.visit_meshes_mut(&mut |_| visited += 1);
        assert_eq!(visited, 2);
        assert_eq!(root.mesh_count(), 2);
    }

    #[test]
    fn test_bounding_box_applies_transforms() {
        let mut node = Node::with_mesh("tri", unit_triangle());
        node.transform = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));

        let (min, max) = node.bounding_box().unwrap();
        assert!((min.x - 10.0).abs() < 1e-5);
        assert!((max.x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_placement_centers_and_scales() {
        let mut node = Node::with_mesh(
            "box",
            Mesh::new(
                vec![Vec3::splat(2.0), Vec3::splat(4.0)],
                vec![[0, 1, 1]],
            ),
        );
        node.normalize_placement(1.0);

        let (min, max) = node.bounding_box().unwrap();
        let center = (min + max) * 0.5;
        assert!(center.length() < 1e-5);
        assert!(((max - min).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_placement_degenerate_keeps_identity_scale() {
        let mut node = Node::with_mesh(
            "point",
            Mesh::new(vec![Vec3::splat(3.0)], vec![[0, 0, 0]]),
        );
        node.normalize_placement(1.0);

        // The single point is centered but not scaled.
        let (min, max) = node.bounding_box().unwrap();
        assert!(min.length() < 1e-5);
        assert!(max.length() < 1e-5);
        let scale = node.transform.x_axis.x;
        assert!((scale - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_slot_triangles_default_covers_all() {
        let mesh = unit_triangle();
        let range = mesh.slot_triangles(0);
        assert_eq!(range.start, 0);
        assert_eq!(range.count, 1);
    }

    #[test]
    fn test_computed_normals_are_unit() {
        let mesh = unit_triangle();
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
        // A triangle in the XY plane faces +Z.
        assert!(mesh.normals[0].z > 0.99);
    }
}
