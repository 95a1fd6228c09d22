//! # Scene Engine
//!
//! The runtime core of a real-time 3D scene engine: a transform hierarchy
//! that propagates world matrices every frame, cameras with frustum culling,
//! and a generator that turns a scene plus a camera into an ordered draw list.
//!
//! ## Features
//!
//! - **Transform Graph**: arena-backed hierarchy with per-node inheritance modes
//! - **Cameras**: look-at views, perspective and orthographic projections,
//!   normalized viewports, orbit/pan/tilt/zoom motions
//! - **Culling**: Gribb–Hartmann frustum against world-space bounds
//! - **Draw Lists**: per-layer ordering, skybox handling, 64-bit sort keys
//! - **Async-Friendly Resources**: not-yet-loaded resources are skipped, never awaited
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     scene_engine::foundation::logging::init_with_level(&config.log_level);
//!
//!     let mut manager = SceneManager::from_config(&config)?;
//!     let camera = manager.add_camera_object("main", Vec3::new(0.0, 2.0, 10.0), Vec3::zeros())?;
//!
//!     let input = InputManager::new();
//!     let frame = manager.update_frame(&input);
//!     if let Some(pass) = frame.pass(camera) {
//!         for command in &pass.commands {
//!             println!("{:?} in layer {:?}", command.chunk.mesh.name, command.layer);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;
pub mod error;

pub mod assets;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

pub use error::{CameraError, SceneError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{Material, Mesh, Model, ResourceCache, ResourceHandle, ResourceKind, ShaderProgram, TransparencyMode},
        config::{Config, ConfigError},
        core::config::EngineConfig,
        error::{CameraError, SceneError},
        foundation::{
            collections::{LayerId, NodeId, ObjectId, ResourceId},
            math::{Mat4, Quat, Vec2, Vec3},
            time::{FrameClock, FrameTime},
        },
        input::{InputManager, KeyCode, MouseButton},
        render::{
            Camera, CameraController, CameraOptions, ControllerProfile, DrawCommand, DrawCommandGenerator,
            Projection, Viewport,
        },
        scene::{
            FrameContext, FrameOutput, InheritanceMode, RenderLayerRegistry, Renderable, SceneGraph, SceneManager,
            Skybox, TransformState, AABB,
        },
    };
}
