//! # Rendering System
//!
//! The renderer-facing half of the scene core: cameras and their projection
//! and viewport math, the input-driven camera controller, and the draw
//! command lists handed to a backend each frame.
//!
//! No GPU API is touched here. A backend consumes [`DrawCommand`] lists and
//! the [`CameraUniformBuffer`] written by [`Camera::bind_uniforms`].

pub mod camera;
pub mod camera_controller;
pub mod draw_command;
pub mod draw_generator;
pub mod projection;
pub mod uniforms;
pub mod viewport;

pub use camera::{Camera, CameraOptions, CameraSettings};
pub use camera_controller::{CameraController, ControllerProfile, MovementTypes};
pub use draw_command::{sort_draw_commands, ChunkRef, DrawCommand, DrawKind, SortKey};
pub use draw_generator::{DrawCommandGenerator, GenerationStats};
pub use projection::Projection;
pub use uniforms::{CameraUniformBuffer, UniformValue, WORLD_MATRIX_UNIFORM};
pub use viewport::{PixelRect, Viewport};
