//! Foundation module
//!
//! Building blocks shared by the scene and render halves of the crate:
//! nalgebra aliases and view/projection builders, slotmap key types,
//! the frame clock, and `env_logger` setup.

pub mod collections;
pub mod logging;
pub mod math;
pub mod time;
