//! Renderable resource payloads
//!
//! These are the CPU-side descriptions the draw generator reads out of the
//! [`ResourceCache`](super::ResourceCache). GPU objects and file formats live
//! elsewhere.

use crate::scene::bounds::AABB;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Blending mode of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransparencyMode {
    /// No blending
    #[default]
    Opaque = 0,
    /// Standard alpha blending
    Blended = 1,
    /// Additive blending
    Additive = 2,
    /// Subtractive blending
    Subtractive = 3,
}

impl TransparencyMode {
    /// Whether draws with this mode need back-to-front ordering
    pub fn is_transparent(self) -> bool {
        self != Self::Opaque
    }
}

/// Vertex data summary
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Object-space bounds
    pub bounds: AABB,
}

impl Mesh {
    /// Create a mesh description
    pub fn new(name: impl Into<String>, bounds: AABB) -> Self {
        Self { name: name.into(), bounds }
    }
}

/// Surface description
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Identifier used to group draws by material, 15 bits are kept
    pub sort_id: u16,
    /// Blending mode
    pub transparency: TransparencyMode,
}

impl Material {
    /// Create an opaque material
    pub fn new(name: impl Into<String>, sort_id: u16) -> Self {
        Self {
            name: name.into(),
            sort_id,
            transparency: TransparencyMode::Opaque,
        }
    }

    /// Builder: set the blending mode
    pub fn with_transparency(mut self, transparency: TransparencyMode) -> Self {
        self.transparency = transparency;
        self
    }
}

/// One mesh/material pairing of a model, drawn with a single command
#[derive(Debug, Clone, PartialEq)]
pub struct MeshChunk {
    /// Geometry
    pub mesh: Arc<Mesh>,
    /// Surface
    pub material: Arc<Material>,
}

/// A drawable model made of chunks
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Model name
    pub name: String,
    /// Chunks in draw order
    pub chunks: Vec<MeshChunk>,
}

impl Model {
    /// Create an empty model
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), chunks: Vec::new() }
    }

    /// Builder: append a chunk
    pub fn with_chunk(mut self, mesh: Mesh, material: Material) -> Self {
        self.chunks.push(MeshChunk {
            mesh: Arc::new(mesh),
            material: Arc::new(material),
        });
        self
    }

    /// Object-space bounds over every chunk
    pub fn bounds(&self) -> Option<AABB> {
        let corners: Vec<_> = self
            .chunks
            .iter()
            .flat_map(|chunk| [chunk.mesh.bounds.min, chunk.mesh.bounds.max])
            .collect();
        AABB::from_points(&corners)
    }
}

/// A linked shader program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    /// Program name
    pub name: String,
    /// Identifier used to group draws by program
    pub sort_id: u8,
    linked: bool,
}

impl ShaderProgram {
    /// A linked program
    pub fn new(name: impl Into<String>, sort_id: u8) -> Self {
        Self { name: name.into(), sort_id, linked: true }
    }

    /// A program whose link step has not succeeded
    pub fn unlinked(name: impl Into<String>, sort_id: u8) -> Self {
        Self { name: name.into(), sort_id, linked: false }
    }

    /// Whether the program can be bound
    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_model_bounds_cover_chunks() {
        let model = Model::new("pair")
            .with_chunk(
                Mesh::new("a", AABB::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0))),
                Material::new("m", 1),
            )
            .with_chunk(
                Mesh::new("b", AABB::new(Vec3::new(2.0, -3.0, 0.0), Vec3::new(4.0, 0.0, 0.5))),
                Material::new("m", 1),
            );

        let bounds = model.bounds().expect("has chunks");
        assert_eq!(bounds.min, Vec3::new(-1.0, -3.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(4.0, 1.0, 1.0));
        assert!(Model::new("empty").bounds().is_none());
    }

    #[test]
    fn test_transparency() {
        assert!(!TransparencyMode::Opaque.is_transparent());
        assert!(TransparencyMode::Additive.is_transparent());
    }
}
