//! Scene management system
//!
//! Following Game Engine Architecture Chapter 11.2.7 - Scene Graphs.
//!
//! ## Architecture
//!
//! ```text
//! SceneManager (per-frame orchestration)
//!      ↓
//! SceneGraph (objects + components) ── TransformGraph (world matrices)
//!      ↓
//! DrawCommandGenerator (per camera, per layer)
//! ```
//!
//! Bounding volumes and the frustum used for culling live here too, next to
//! the render layer registry that orders the draw lists.

pub mod bounds;
pub mod frame_context;
pub mod frustum;
pub mod render_layer;
pub mod scene_graph;
pub mod scene_manager;
pub mod transform;

#[cfg(test)]
mod tests;

pub use bounds::{BoundingSphere, Halfspace, Plane, Ray, AABB};
pub use frame_context::FrameContext;
pub use frustum::{Frustum, FrustumPlane};
pub use render_layer::{RenderLayer, RenderLayerRegistry, DEFAULT_LAYERS};
pub use scene_graph::{Renderable, SceneGraph, SceneObject, Skybox, SKYBOX_SHADER};
pub use scene_manager::{CameraPass, FrameOutput, SceneManager};
pub use transform::{
    InheritanceMode, NoopObserver, TransformGraph, TransformNode, TransformObserver, TransformState,
};
