//! Asset access for the scene core
//!
//! Resource lookups and the payload types the draw generator consumes.

pub mod model;
pub mod resource_cache;

pub use model::{Material, Mesh, MeshChunk, Model, ShaderProgram, TransparencyMode};
pub use resource_cache::{ResourceCache, ResourceHandle, ResourceKind};
