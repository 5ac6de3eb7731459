use std::io::{BufReader, Cursor};

use anyhow::Context as _;

use crate::resources::{Asset, Bounds};

/**
 * CPU-side geometry of a model effect.
 *
 * Effects never deform their mesh; animation happens through the transform,
 * the light colour and the frame index, so positions and indices are all a
 * renderer needs besides the bounds.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl MeshData {
    pub fn new(name: &str, positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let bounds = Bounds::enclosing(positions.iter().copied());
        Self {
            name: name.to_owned(),
            positions,
            indices,
            bounds,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Parses Wavefront OBJ text. Materials are ignored; effects bring their own
/// render recipe.
pub fn parse_obj(name: &str, text: &str) -> anyhow::Result<Asset> {
    let mut reader = BufReader::new(Cursor::new(text));
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .with_context(|| format!("`{name}` is not a valid OBJ file"))?;

    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for model in &models {
        let base = positions.len() as u32;
        positions.extend(
            model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]]),
        );
        indices.extend(model.mesh.indices.iter().map(|i| base + i));
    }
    if positions.is_empty() {
        anyhow::bail!("`{name}` contains no geometry");
    }
    Ok(Asset::Model(MeshData::new(name, positions, indices)))
}

/// Flattens every mesh primitive of a glTF document into one mesh.
pub fn from_gltf(name: &str, gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> anyhow::Result<Asset> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for mesh in gltf.meshes() {
        for primitive in mesh.primitives() {
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let base = positions.len() as u32;
            let Some(primitive_positions) = reader.read_positions() else {
                log::warn!(
                    "primitive {} of mesh {:?} in {} has no positions and is skipped",
                    primitive.index(),
                    mesh.name(),
                    name
                );
                continue;
            };
            positions.extend(primitive_positions);
            match reader.read_indices() {
                Some(read) => indices.extend(read.into_u32().map(|i| base + i)),
                None => indices.extend(base..positions.len() as u32),
            }
        }
    }
    if positions.is_empty() {
        anyhow::bail!("`{name}` contains no geometry");
    }
    Ok(Asset::Model(MeshData::new(name, positions, indices)))
}
