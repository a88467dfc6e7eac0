//! Interactive cel-shaded viewer.
//!
//! Run with a model path, or with no arguments for a built-in cube:
//!
//! ```sh
//! cargo run --example viewer -- path/to/model.obj
//! ```
//!
//! Controls: left-drag orbits, scroll zooms, `T` toggles toon shading,
//! `R` toggles auto-rotate, `F12` saves a screenshot, `Esc` quits.
//! Dropping an OBJ file onto the window loads it.

use celscope::*;

fn main() -> Result<()> {
    let mut state = ViewerState::new();
    state.options.auto_rotate = true;

    if let Some(path) = std::env::args().nth(1) {
        let model = load_model_file(path.as_ref())?;
        state.swap_model(path, model);
    } else {
        state.swap_model("cube", cube_node());
    }

    run(state);
    Ok(())
}

/// A unit cube with hard face normals, so every face boundary shows the
/// normal-edge outline.
fn cube_node() -> Node {
    // One (normal, up) pair per face; four corners each.
    let faces: [(Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y),
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut triangles = Vec::with_capacity(12);

    for (normal, up) in faces {
        let right = up.cross(normal);
        let base = vertices.len() as u32;
        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            vertices.push((normal + right * u + up * v) * 0.5);
            normals.push(normal);
        }
        triangles.push([base, base + 1, base + 2]);
        triangles.push([base, base + 2, base + 3]);
    }

    let mut mesh = Mesh::new(vertices, triangles);
    mesh.normals = normals;
    mesh.set_slots(MaterialSlots::Single(Material::Standard(
        StandardMaterial {
            base_color: Vec3::new(0.95, 0.55, 0.25),
            ..StandardMaterial::default()
        },
    )));

    Node::with_mesh("cube", mesh)
}
