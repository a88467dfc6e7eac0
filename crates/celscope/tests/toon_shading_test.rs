//! Integration tests for the material quantization stage and the viewer
//! state, exercised through the public API.

use std::sync::Arc;

use celscope::*;

fn triangle_mesh() -> Mesh {
    Mesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![[0, 1, 2]],
    )
}

fn colored(color: Vec3) -> Material {
    Material::Standard(StandardMaterial {
        base_color: color,
        ..StandardMaterial::default()
    })
}

#[test]
fn test_quantization_round_trip_through_state() {
    let mut state = ViewerState::new();

    let mut root = Node::new("root");
    let mut inner = Node::new("inner");
    inner.add_child(Node::with_mesh("deep", triangle_mesh()));
    root.add_child(inner);
    root.add_child(Node::with_mesh("shallow", triangle_mesh()));

    state.swap_model("scene", root);

    // Toon enabled by default: every mesh is derived, at any depth.
    let model = state.model.as_ref().unwrap();
    let mut toon_count = 0;
    model.visit(&mut |node| {
        if let Some(mesh) = &node.mesh {
            assert!(mesh.slots.get(0).unwrap().is_toon());
            assert!(mesh.original.is_some());
            toon_count += 1;
        }
    });
    assert_eq!(toon_count, 2);

    // Disable: originals come back, backups stay.
    state.set_toon_enabled(false);
    let model = state.model.as_ref().unwrap();
    model.visit(&mut |node| {
        if let Some(mesh) = &node.mesh {
            assert!(!mesh.slots.get(0).unwrap().is_toon());
            assert!(mesh.original.is_some());
        }
    });

    // Re-enable: equivalent derivation, same shared ramp.
    state.set_toon_enabled(true);
    let ramp = Arc::clone(&state.ramp);
    let model = state.model.as_ref().unwrap();
    model.visit(&mut |node| {
        if let Some(mesh) = &node.mesh {
            match mesh.slots.get(0).unwrap() {
                Material::Toon(toon) => assert!(Arc::ptr_eq(&toon.ramp, &ramp)),
                Material::Standard(_) => panic!("expected toon material"),
            }
        }
    });
}

#[test]
fn test_multi_slot_meshes_keep_slot_structure() {
    let ramp = Arc::new(GradientRamp::five_tone());

    let mut mesh = triangle_mesh();
    mesh.set_slots(MaterialSlots::Multi(vec![
        colored(Vec3::X),
        colored(Vec3::Y),
        colored(Vec3::Z),
    ]));
    let mut multi = Node::with_mesh("multi", mesh);

    let mut single = Node::with_mesh("single", triangle_mesh());

    apply_toon_shading(&mut multi, &ramp);
    apply_toon_shading(&mut single, &ramp);

    let slots = &multi.mesh.as_ref().unwrap().slots;
    assert!(matches!(slots, MaterialSlots::Multi(_)));
    assert_eq!(slots.len(), 3);
    assert_eq!(slots.get(0).unwrap().base_color(), Vec3::X);
    assert_eq!(slots.get(1).unwrap().base_color(), Vec3::Y);
    assert_eq!(slots.get(2).unwrap().base_color(), Vec3::Z);

    let slots = &single.mesh.as_ref().unwrap().slots;
    assert!(matches!(slots, MaterialSlots::Single(_)));
}

#[test]
fn test_shared_ramp_across_meshes() {
    let ramp = Arc::new(GradientRamp::three_tone());
    let mut root = Node::new("root");
    root.add_child(Node::with_mesh("a", triangle_mesh()));
    root.add_child(Node::with_mesh("b", triangle_mesh()));

    apply_toon_shading(&mut root, &ramp);

    let mut refs = Vec::new();
    root.visit(&mut |node| {
        if let Some(mesh) = &node.mesh {
            if let Some(Material::Toon(toon)) = mesh.slots.get(0) {
                refs.push(Arc::clone(&toon.ramp));
            }
        }
    });
    assert_eq!(refs.len(), 2);
    assert!(Arc::ptr_eq(&refs[0], &refs[1]));
    assert!(Arc::ptr_eq(&refs[0], &ramp));
}

#[test]
fn test_physical_extent_convention() {
    // Buffers are sized to logical size times the device pixel ratio,
    // rounded, never zero.
    assert_eq!(physical_extent(640, 2.0), 1280);
    assert_eq!(physical_extent(640, 1.5), 960);
    assert_eq!(physical_extent(0, 1.0), 1);
}

#[test]
fn test_outline_defaults() {
    let config = OutlineConfig::default();
    assert_eq!(config.thickness, 1.0);
    assert_eq!(config.color, Vec3::ZERO);
}
