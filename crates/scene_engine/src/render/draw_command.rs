//! Draw commands
//!
//! One [`DrawCommand`] per visible mesh chunk per camera per frame. Commands
//! come out of the generator in submission order (layers in registry order,
//! traversal order inside a layer, skybox last). Renderers that prefer state
//! sorting can reorder with [`sort_draw_commands`].
//!
//! ## Sort key layout
//!
//! ```text
//!  63      59 58     52 51  49 48                                         0
//! ┌──────────┬─────────┬──────┬────────────────────────────────────────────┐
//! │ viewport │  layer  │ mode │ opaque:      shader | material | depth      │
//! │  5 bits  │ 7 bits  │3 bits│ transparent: ~depth | shader   | material   │
//! └──────────┴─────────┴──────┴────────────────────────────────────────────┘
//! ```
//!
//! Opaque draws group by shader then material and go front to back inside a
//! group. Transparent draws go strictly back to front.

use crate::assets::{Material, Mesh, ShaderProgram, TransparencyMode};
use crate::foundation::collections::{LayerId, ObjectId, ResourceId};
use crate::foundation::math::Mat4;
use crate::render::uniforms::{UniformValue, WORLD_MATRIX_UNIFORM};
use crate::scene::bounds::AABB;
use std::sync::Arc;

const VIEWPORT_BITS: u32 = 5;
const LAYER_BITS: u32 = 7;
const MODE_BITS: u32 = 3;
const SHADER_BITS: u32 = 8;
const MATERIAL_BITS: u32 = 15;
const DEPTH_BITS: u32 = 26;

const VIEWPORT_SHIFT: u32 = 64 - VIEWPORT_BITS;
const LAYER_SHIFT: u32 = VIEWPORT_SHIFT - LAYER_BITS;
const MODE_SHIFT: u32 = LAYER_SHIFT - MODE_BITS;

const fn mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

/// Packed 64-bit ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SortKey(pub u64);

impl SortKey {
    /// Pack a key
    ///
    /// `viewport_depth` and `layer_position` saturate at their field widths.
    /// `normalized_depth` is the view depth divided by the far plane and is
    /// clamped to `[0, 1]`.
    pub fn new(
        viewport_depth: i32,
        layer_position: usize,
        transparency: TransparencyMode,
        shader_id: u8,
        material_id: u16,
        normalized_depth: f32,
    ) -> Self {
        let viewport = u64::try_from(viewport_depth).unwrap_or(0).min(mask(VIEWPORT_BITS));
        let layer = (layer_position as u64).min(mask(LAYER_BITS));
        let mode = transparency as u64 & mask(MODE_BITS);
        let shader = u64::from(shader_id);
        let material = u64::from(material_id) & mask(MATERIAL_BITS);
        let depth = (f64::from(normalized_depth.clamp(0.0, 1.0)) * mask(DEPTH_BITS) as f64) as u64;

        let tail = if transparency.is_transparent() {
            let inverted = mask(DEPTH_BITS) - depth;
            (inverted << (SHADER_BITS + MATERIAL_BITS)) | (shader << MATERIAL_BITS) | material
        } else {
            (shader << (MATERIAL_BITS + DEPTH_BITS)) | (material << DEPTH_BITS) | depth
        };

        Self((viewport << VIEWPORT_SHIFT) | (layer << LAYER_SHIFT) | (mode << MODE_SHIFT) | tail)
    }

    /// Viewport depth field
    pub fn viewport(self) -> u64 {
        self.0 >> VIEWPORT_SHIFT
    }

    /// Layer position field
    pub fn layer(self) -> u64 {
        (self.0 >> LAYER_SHIFT) & mask(LAYER_BITS)
    }

    /// Transparency field
    pub fn transparency(self) -> u64 {
        (self.0 >> MODE_SHIFT) & mask(MODE_BITS)
    }
}

/// The mesh/material pairing a command draws
#[derive(Debug, Clone)]
pub struct ChunkRef {
    /// Model the chunk belongs to
    pub model: ResourceId,
    /// Index of the chunk within the model
    pub index: usize,
    /// Geometry
    pub mesh: Arc<Mesh>,
    /// Surface
    pub material: Arc<Material>,
}

/// What produced a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// Ordinary scene object chunk
    Mesh,
    /// Skybox, never culled
    Skybox,
}

/// One unit of renderable work
#[derive(Debug, Clone)]
pub struct DrawCommand {
    /// Scene object the command was built for
    pub object: ObjectId,
    /// Chunk to draw
    pub chunk: ChunkRef,
    /// Program to draw it with
    pub shader: Arc<ShaderProgram>,
    /// Layer the command was emitted in
    pub layer: LayerId,
    /// Per-draw uniform overrides
    pub uniforms: Vec<(String, UniformValue)>,
    /// World-space bounds of the chunk
    pub world_bounds: AABB,
    /// Distance of the bounds center along the camera's view direction
    pub depth: f32,
    /// Origin of the command
    pub kind: DrawKind,
    /// Derived ordering key
    pub sort_key: SortKey,
}

impl DrawCommand {
    /// Uniform override by name
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// World matrix override
    pub fn world_matrix(&self) -> Option<&Mat4> {
        self.uniform(WORLD_MATRIX_UNIFORM).and_then(UniformValue::as_mat4)
    }

    /// Derived ordering key
    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Whether the chunk's material blends
    pub fn is_transparent(&self) -> bool {
        self.chunk.material.transparency.is_transparent()
    }
}

/// Reorder commands by sort key; equal keys keep their generation order
pub fn sort_draw_commands(commands: &mut [DrawCommand]) {
    commands.sort_by_key(DrawCommand::sort_key);
}
