//! Math utilities and types
//!
//! Provides fundamental math types for 3D scene management along with the
//! right-handed OpenGL-convention view and projection builders used by cameras.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Tolerance used when deciding whether a vector is degenerate
pub const DEGENERATE_EPSILON: f32 = 1e-8;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Quat, Unit, Vec3, DEGENERATE_EPSILON};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Normalize a vector, returning `None` when its length is (near) zero
    pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
        v.try_normalize(DEGENERATE_EPSILON)
    }

    /// Rotate `point` about `pivot` around `axis` by `angle` radians
    ///
    /// A zero-length axis leaves the point untouched.
    pub fn rotate_about_point(point: &Vec3, pivot: &Vec3, axis: &Vec3, angle: f32) -> Vec3 {
        let Some(axis) = Unit::try_new(*axis, DEGENERATE_EPSILON) else {
            return *point;
        };
        let rotation = Quat::from_axis_angle(&axis, angle);
        pivot + rotation * (point - pivot)
    }

    /// Translation column of an affine matrix
    pub fn translation_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }

    /// Pick the world axis least aligned with `v`
    ///
    /// Used as a replacement up vector when the requested one is parallel
    /// to the view direction.
    pub fn least_aligned_axis(v: &Vec3) -> Vec3 {
        let a = v.abs();
        if a.x <= a.y && a.x <= a.z {
            Vec3::x()
        } else if a.y <= a.z {
            Vec3::y()
        } else {
            Vec3::z()
        }
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a right-handed OpenGL perspective projection (clip z in [-1, 1])
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed OpenGL orthographic projection (clip z in [-1, 1])
    fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    ///
    /// Returns `None` when `up` is parallel to the view direction or the eye
    /// coincides with the target.
    fn try_look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Option<Mat4>;

    /// Strip rotation and scale, keeping only the translation column
    fn translation_only(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = f / aspect;
        result[(1, 1)] = f;
        result[(2, 2)] = (far + near) / (near - far);
        result[(2, 3)] = (2.0 * far * near) / (near - far);
        result[(3, 2)] = -1.0;
        result
    }

    fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = -2.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = -(far + near) / (far - near);
        result
    }

    fn try_look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Option<Mat4> {
        let up = utils::try_normalize(up)?;
        let z = utils::try_normalize(&(eye - target))?;
        let x = utils::try_normalize(&up.cross(&z))?;
        let y = z.cross(&x);

        Some(Mat4::new(
            x.x, x.y, x.z, -x.dot(eye),
            y.x, y.y, y.z, -y.dot(eye),
            z.x, z.y, z.z, -z.dot(eye),
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    fn translation_only(&self) -> Mat4 {
        Mat4::new_translation(&utils::translation_of(self))
    }
}
