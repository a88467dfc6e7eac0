//! Material quantization: deriving toon materials across a scene tree.
//!
//! [`apply_toon_shading`] rewrites every mesh's material slots to toon-lit
//! variants sampling a shared [`GradientRamp`]; [`restore_materials`]
//! reverts to the originals. Both run on demand (model load, shading
//! toggle), never per frame.

use std::sync::Arc;

use crate::material::{Material, ToonMaterial};
use crate::ramp::GradientRamp;
use crate::scene::Node;

/// Replaces every mesh's material slots in the subtree with derived toon
/// materials referencing `ramp`.
///
/// The first application records each mesh's current slots as its backup;
/// the backup is never overwritten afterwards. Every application derives
/// from the backup, never from the active slots, so re-applying is
/// idempotent and toggling loses nothing. Slot order and the single/multi
/// shape are preserved.
pub fn apply_toon_shading(node: &mut Node, ramp: &Arc<GradientRamp>) {
    let mut derived = 0usize;
    node.visit_meshes_mut(&mut |mesh| {
        derived += mesh.slots.len();
        if mesh.original.is_none() {
            mesh.original = Some(mesh.slots.clone());
        }

        // Unwrap is fine: populated just above when absent.
        let backup = mesh.original.as_ref().unwrap();
        mesh.slots = backup.map(|mat| match mat {
            Material::Standard(src) => Material::Toon(ToonMaterial::derive(src, ramp)),
            // A backup can only hold a toon material if the mesh was
            // authored that way; keep its parameters and retarget the ramp.
            Material::Toon(src) => Material::Toon(ToonMaterial {
                ramp: Arc::clone(ramp),
                ..src.clone()
            }),
        });
    });
    log::debug!("derived {derived} toon material slot(s) with ramp '{}'", ramp.name);
}

/// Reverts every mesh in the subtree to its pre-toon material slots.
///
/// The backup is retained so toon shading can be re-applied later; meshes
/// that were never quantized are left untouched.
pub fn restore_materials(node: &mut Node) {
    node.visit_meshes_mut(&mut |mesh| {
        if let Some(original) = &mesh.original {
            mesh.slots = original.clone();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{CullSide, MaterialSlots, StandardMaterial, TextureData};
    use crate::scene::Mesh;
    use glam::Vec3;

    fn mesh_with_slots(slots: MaterialSlots) -> Mesh {
        let mut mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]);
        mesh.slots = slots;
        mesh
    }

    fn source(color: Vec3) -> StandardMaterial {
        StandardMaterial {
            base_color: color,
            ..StandardMaterial::default()
        }
    }

    fn toon_params(mat: &Material) -> (Vec3, bool, f32, CullSide) {
        match mat {
            Material::Toon(t) => (t.base_color, t.transparent, t.opacity, t.side),
            Material::Standard(_) => panic!("expected toon material"),
        }
    }

    #[test]
    fn test_apply_derives_every_mesh_at_any_depth() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let mut root = Node::new("root");
        let mut mid = Node::with_mesh(
            "mid",
            mesh_with_slots(MaterialSlots::Single(Material::Standard(source(Vec3::X)))),
        );
        mid.add_child(Node::with_mesh(
            "deep",
            mesh_with_slots(MaterialSlots::Single(Material::Standard(source(Vec3::Y)))),
        ));
        root.add_child(mid);

        apply_toon_shading(&mut root, &ramp);

        let mut toon_count = 0;
        root.visit_meshes_mut(&mut |mesh| {
            assert!(mesh.slots.get(0).unwrap().is_toon());
            toon_count += 1;
        });
        assert_eq!(toon_count, 2);
    }

    #[test]
    fn test_multi_slot_preserves_count_and_order() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let colors = [Vec3::X, Vec3::Y, Vec3::Z];
        let slots = MaterialSlots::Multi(
            colors
                .iter()
                .map(|&c| Material::Standard(source(c)))
                .collect(),
        );
        let mut node = Node::with_mesh("multi", mesh_with_slots(slots));

        apply_toon_shading(&mut node, &ramp);

        let mesh = node.mesh.as_ref().unwrap();
        assert!(matches!(mesh.slots, MaterialSlots::Multi(_)));
        assert_eq!(mesh.slots.len(), 3);
        for (i, &c) in colors.iter().enumerate() {
            assert_eq!(mesh.slots.get(i).unwrap().base_color(), c);
            assert!(mesh.slots.get(i).unwrap().is_toon());
        }
    }

    #[test]
    fn test_single_slot_stays_single() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let mut node = Node::with_mesh(
            "single",
            mesh_with_slots(MaterialSlots::Single(Material::Standard(source(Vec3::X)))),
        );

        apply_toon_shading(&mut node, &ramp);

        let mesh = node.mesh.as_ref().unwrap();
        assert!(matches!(mesh.slots, MaterialSlots::Single(_)));
    }

    #[test]
    fn test_reapply_is_idempotent_from_backup() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let tex = Arc::new(TextureData::new(1, 1, vec![10, 20, 30, 255], false));
        let mut node = Node::with_mesh(
            "tex",
            mesh_with_slots(MaterialSlots::Single(Material::Standard(
                StandardMaterial {
                    base_color: Vec3::new(0.3, 0.6, 0.9),
                    albedo: Some(tex),
                    transparent: true,
                    opacity: 0.25,
                    side: CullSide::Double,
                },
            ))),
        );

        apply_toon_shading(&mut node, &ramp);
        let first = toon_params(node.mesh.as_ref().unwrap().slots.get(0).unwrap());
        let first_albedo = node
            .mesh
            .as_ref()
            .unwrap()
            .slots
            .get(0)
            .unwrap()
            .albedo()
            .unwrap()
            .clone();

        apply_toon_shading(&mut node, &ramp);
        let second = toon_params(node.mesh.as_ref().unwrap().slots.get(0).unwrap());
        let second_albedo = node
            .mesh
            .as_ref()
            .unwrap()
            .slots
            .get(0)
            .unwrap()
            .albedo()
            .unwrap()
            .clone();

        assert_eq!(first, second);
        assert_eq!(*first_albedo, *second_albedo);
        assert!(second_albedo.srgb);
        // The backup still holds the untagged source texture.
        let backup = node.mesh.as_ref().unwrap().original.as_ref().unwrap();
        assert!(!backup.get(0).unwrap().albedo().unwrap().srgb);
    }

    #[test]
    fn test_toggle_round_trip_restores_equivalent_derivation() {
        let ramp = Arc::new(GradientRamp::five_tone());
        let mut node = Node::with_mesh(
            "toggle",
            mesh_with_slots(MaterialSlots::Single(Material::Standard(source(
                Vec3::new(0.1, 0.7, 0.4),
            )))),
        );

        apply_toon_shading(&mut node, &ramp);
        let first = toon_params(node.mesh.as_ref().unwrap().slots.get(0).unwrap());
        let first_ramp = match node.mesh.as_ref().unwrap().slots.get(0).unwrap() {
            Material::Toon(t) => Arc::clone(&t.ramp),
            Material::Standard(_) => unreachable!(),
        };

        restore_materials(&mut node);
        assert!(!node.mesh.as_ref().unwrap().slots.get(0).unwrap().is_toon());

        apply_toon_shading(&mut node, &ramp);
        let second = toon_params(node.mesh.as_ref().unwrap().slots.get(0).unwrap());
        let second_ramp = match node.mesh.as_ref().unwrap().slots.get(0).unwrap() {
            Material::Toon(t) => Arc::clone(&t.ramp),
            Material::Standard(_) => unreachable!(),
        };

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first_ramp, &second_ramp));
    }

    #[test]
    fn test_restore_without_apply_is_a_no_op() {
        let mut node = Node::with_mesh(
            "untouched",
            mesh_with_slots(MaterialSlots::Single(Material::Standard(source(Vec3::Z)))),
        );
        restore_materials(&mut node);
        let mesh = node.mesh.as_ref().unwrap();
        assert!(mesh.original.is_none());
        assert_eq!(mesh.slots.get(0).unwrap().base_color(), Vec3::Z);
    }
}
