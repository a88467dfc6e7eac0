//! Asynchronous OBJ model loading.
//!
//! Loading runs on a background thread so a request never blocks frame
//! presentation; results are delivered over a channel polled once per
//! frame. A failed load is reported and the currently displayed model is
//! left untouched.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use glam::{Vec2, Vec3};

use celscope_core::{
    CelscopeError, CullSide, Material, MaterialSlots, Mesh, Node, Result, StandardMaterial,
    TextureData,
};

/// A finished load: the model's display name and the outcome.
pub type LoadResult = (String, Result<Node>);

/// Background model loader.
pub struct ModelLoader {
    requests: Sender<PathBuf>,
    results: Receiver<LoadResult>,
}

impl ModelLoader {
    /// Spawns the loader thread.
    #[must_use]
    pub fn new() -> Self {
        let (request_tx, request_rx) = channel::<PathBuf>();
        let (result_tx, result_rx) = channel::<LoadResult>();

        thread::spawn(move || {
            while let Ok(path) = request_rx.recv() {
                let name = path
                    .file_stem()
                    .map_or_else(|| "model".to_string(), |s| s.to_string_lossy().into_owned());
                let outcome = load_model_file(&path);
                if result_tx.send((name, outcome)).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            results: result_rx,
        }
    }

    /// Queues a load request. Never blocks.
    pub fn request(&self, path: PathBuf) {
        log::info!("loading model: {}", path.display());
        let _ = self.requests.send(path);
    }

    /// Returns a finished load, if one is ready. Never blocks.
    pub fn poll(&self) -> Option<LoadResult> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads an OBJ file (with its MTL materials, when present) into a scene
/// node, centered at the origin and scaled to a bounding-box diagonal of 2.
pub fn load_model_file(path: &Path) -> Result<Node> {
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| CelscopeError::ModelLoad(format!("{}: {e}", path.display())))?;

    let materials = match materials {
        Ok(mats) => mats,
        Err(e) => {
            log::warn!("ignoring material library for {}: {e}", path.display());
            Vec::new()
        }
    };

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let source_materials: Vec<StandardMaterial> = materials
        .iter()
        .map(|mat| convert_material(mat, base_dir))
        .collect();

    let mut root = Node::new(
        path.file_stem()
            .map_or_else(|| "model".to_string(), |s| s.to_string_lossy().into_owned()),
    );

    for model in &models {
        let Some(mesh) = convert_mesh(&model.mesh, &source_materials) else {
            log::warn!("skipping empty mesh '{}'", model.name);
            continue;
        };
        root.add_child(Node::with_mesh(model.name.clone(), mesh));
    }

    if root.mesh_count() == 0 {
        return Err(CelscopeError::ModelLoad(format!(
            "{}: no usable geometry",
            path.display()
        )));
    }

    root.normalize_placement(2.0);
    log::info!(
        "loaded {} ({} mesh(es))",
        path.display(),
        root.mesh_count()
    );
    Ok(root)
}

fn convert_mesh(mesh: &tobj::Mesh, materials: &[StandardMaterial]) -> Option<Mesh> {
    if mesh.positions.is_empty() || mesh.indices.is_empty() {
        return None;
    }

    let vertices: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();

    let triangles: Vec<[u32; 3]> = mesh
        .indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    } else {
        celscope_core::scene::compute_vertex_normals(&vertices, &triangles)
    };

    // OBJ texture coordinates are bottom-left origin; flip V for sampling.
    let uvs: Vec<Vec2> = mesh
        .texcoords
        .chunks_exact(2)
        .map(|uv| Vec2::new(uv[0], 1.0 - uv[1]))
        .collect();

    let material = mesh
        .material_id
        .and_then(|id| materials.get(id).cloned())
        .unwrap_or_default();

    let mut out = Mesh::new(vertices, triangles);
    out.normals = normals;
    out.uvs = uvs;
    out.set_slots(MaterialSlots::Single(Material::Standard(material)));
    Some(out)
}

fn convert_material(mat: &tobj::Material, base_dir: &Path) -> StandardMaterial {
    // Missing fields substitute defaults: opaque white, no texture.
    let base_color = mat
        .diffuse
        .map_or(Vec3::ONE, |d| Vec3::new(d[0], d[1], d[2]));

    let opacity = mat.dissolve.unwrap_or(1.0);

    let albedo = mat
        .diffuse_texture
        .as_ref()
        .and_then(|tex_path| load_texture(&base_dir.join(tex_path)));

    StandardMaterial {
        base_color,
        albedo,
        transparent: opacity < 1.0,
        opacity,
        side: CullSide::Front,
    }
}

fn load_texture(path: &Path) -> Option<Arc<TextureData>> {
    match image::open(path) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            // Image files are display-referred.
            Some(Arc::new(TextureData::new(
                width,
                height,
                rgba.into_raw(),
                true,
            )))
        }
        Err(e) => {
            log::warn!("failed to load texture {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_soft_error() {
        let result = load_model_file(Path::new("/nonexistent/missing.obj"));
        assert!(matches!(result, Err(CelscopeError::ModelLoad(_))));
    }

    #[test]
    fn test_loader_poll_is_non_blocking() {
        let loader = ModelLoader::new();
        assert!(loader.poll().is_none());

        loader.request(PathBuf::from("/nonexistent/missing.obj"));
        // The request eventually fails; poll never blocks while waiting.
        let mut reported = None;
        for _ in 0..200 {
            if let Some(result) = loader.poll() {
                reported = Some(result);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let (name, outcome) = reported.expect("load result delivered");
        assert_eq!(name, "missing");
        assert!(outcome.is_err());
    }
}
