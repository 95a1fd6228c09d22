//! Uniform data produced by the scene core
//!
//! [`CameraUniformBuffer`] is the per-frame block every shader reads camera
//! state from. [`UniformValue`] carries per-draw overrides such as the world
//! matrix. Buffer layout and upload belong to the renderer.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};

/// Name of the per-draw world matrix uniform
pub const WORLD_MATRIX_UNIFORM: &str = "worldMatrix";

/// A single uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Scalar float
    Float(f32),
    /// Scalar int
    Int(i32),
    /// Two-component vector
    Vec2(Vec2),
    /// Three-component vector
    Vec3(Vec3),
    /// Four-component vector
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(Mat4),
}

impl UniformValue {
    /// Matrix payload, if this is a matrix
    pub fn as_mat4(&self) -> Option<&Mat4> {
        match self {
            Self::Mat4(m) => Some(m),
            _ => None,
        }
    }
}

/// Camera block shared by every draw in a camera's pass
#[derive(Debug, Clone, PartialEq)]
pub struct CameraUniformBuffer {
    /// World to view
    pub view_matrix: Mat4,
    /// View to clip
    pub projection_matrix: Mat4,
    /// View to world
    pub inv_view_matrix: Mat4,
    /// Clip to view
    pub inv_projection_matrix: Mat4,
    /// World to clip
    pub view_projection_matrix: Mat4,
    /// Eye position in world space
    pub eye_position: Vec3,
    /// Near clip distance
    pub z_near: f32,
    /// Far clip distance
    pub z_far: f32,
    /// Viewport width in pixels
    pub viewport_width: f32,
    /// Viewport height in pixels
    pub viewport_height: f32,
    /// Fraction of the render target covered by the viewport
    pub screen_percentage: f32,
}

impl Default for CameraUniformBuffer {
    fn default() -> Self {
        Self {
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::identity(),
            inv_view_matrix: Mat4::identity(),
            inv_projection_matrix: Mat4::identity(),
            view_projection_matrix: Mat4::identity(),
            eye_position: Vec3::zeros(),
            z_near: 0.0,
            z_far: 0.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            screen_percentage: 1.0,
        }
    }
}
