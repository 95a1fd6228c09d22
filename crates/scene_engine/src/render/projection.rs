//! Camera projections
//!
//! A camera carries exactly one [`Projection`]. Parameters are validated when
//! a projection is built or edited so the matrix is always invertible.

use crate::error::CameraError;
use crate::foundation::math::{utils, Mat4, Mat4Ext};
use serde::{Deserialize, Serialize};

/// Default vertical field of view in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 70.0;
/// Default near clip distance
pub const DEFAULT_NEAR: f32 = 0.01;
/// Default far clip distance
pub const DEFAULT_FAR: f32 = 1000.0;

/// Projection descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in degrees
        fov_y: f32,
        /// Width over height
        aspect_ratio: f32,
        /// Near clip distance
        near: f32,
        /// Far clip distance
        far: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Left edge of the view volume
        left: f32,
        /// Right edge of the view volume
        right: f32,
        /// Bottom edge of the view volume
        bottom: f32,
        /// Top edge of the view volume
        top: f32,
        /// Near clip distance
        near: f32,
        /// Far clip distance
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fov_y: DEFAULT_FOV_DEGREES,
            aspect_ratio: 1.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl Projection {
    /// Validated perspective projection
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Result<Self, CameraError> {
        let projection = Self::Perspective { fov_y, aspect_ratio, near, far };
        projection.validate()?;
        Ok(projection)
    }

    /// Validated orthographic projection
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, CameraError> {
        let projection = Self::Orthographic { left, right, bottom, top, near, far };
        projection.validate()?;
        Ok(projection)
    }

    /// Unit-cube orthographic projection used when switching a camera to orthographic
    pub fn default_orthographic() -> Self {
        Self::Orthographic {
            left: -0.5,
            right: 0.5,
            bottom: -0.5,
            top: 0.5,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Reject parameters that would make the matrix singular
    pub fn validate(&self) -> Result<(), CameraError> {
        let invalid = |msg: String| Err(CameraError::InvalidProjection(msg));
        match *self {
            Self::Perspective { fov_y, aspect_ratio, near, far } => {
                if ![fov_y, aspect_ratio, near, far].iter().all(|v| v.is_finite()) {
                    return invalid(format!(
                        "non-finite perspective parameters fov {fov_y}, aspect {aspect_ratio}, near {near}, far {far}"
                    ));
                }
                if !(fov_y > 0.0 && fov_y < 180.0) {
                    return invalid(format!("field of view {fov_y} must be in (0, 180) degrees"));
                }
                if !(aspect_ratio > 0.0) || !aspect_ratio.is_finite() {
                    return invalid(format!("aspect ratio {aspect_ratio} must be positive"));
                }
                if !(near > 0.0) {
                    return invalid(format!("near plane {near} must be positive"));
                }
                if !(far > near) {
                    return invalid(format!("far plane {far} must exceed near plane {near}"));
                }
            }
            Self::Orthographic { left, right, bottom, top, near, far } => {
                if ![left, right, bottom, top, near, far].iter().all(|v| v.is_finite()) {
                    return invalid(format!(
                        "non-finite orthographic bounds [{left}, {right}] x [{bottom}, {top}] x [{near}, {far}]"
                    ));
                }
                if left == right || bottom == top {
                    return invalid(format!("zero-area view volume [{left}, {right}] x [{bottom}, {top}]"));
                }
                if near == far {
                    return invalid(format!("near and far planes coincide at {near}"));
                }
            }
        }
        Ok(())
    }

    /// Projection matrix (OpenGL clip conventions)
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective { fov_y, aspect_ratio, near, far } => {
                Mat4::perspective_gl(utils::deg_to_rad(fov_y), aspect_ratio, near, far)
            }
            Self::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic_gl(left, right, bottom, top, near, far)
            }
        }
    }

    /// Near clip distance
    pub fn near(&self) -> f32 {
        match *self {
            Self::Perspective { near, .. } | Self::Orthographic { near, .. } => near,
        }
    }

    /// Far clip distance
    pub fn far(&self) -> f32 {
        match *self {
            Self::Perspective { far, .. } | Self::Orthographic { far, .. } => far,
        }
    }

    /// Vertical field of view in degrees, perspective only
    pub fn fov_y(&self) -> Option<f32> {
        match *self {
            Self::Perspective { fov_y, .. } => Some(fov_y),
            Self::Orthographic { .. } => None,
        }
    }

    /// Width over height of the view volume
    pub fn aspect_ratio(&self) -> f32 {
        match *self {
            Self::Perspective { aspect_ratio, .. } => aspect_ratio,
            Self::Orthographic { left, right, bottom, top, .. } => (right - left) / (top - bottom),
        }
    }

    /// Whether this is a perspective projection
    pub fn is_perspective(&self) -> bool {
        matches!(self, Self::Perspective { .. })
    }

    /// Copy with new clip distances
    pub fn with_clip_planes(self, new_near: f32, new_far: f32) -> Result<Self, CameraError> {
        let projection = match self {
            Self::Perspective { fov_y, aspect_ratio, .. } => {
                Self::Perspective { fov_y, aspect_ratio, near: new_near, far: new_far }
            }
            Self::Orthographic { left, right, bottom, top, .. } => {
                Self::Orthographic { left, right, bottom, top, near: new_near, far: new_far }
            }
        };
        projection.validate()?;
        Ok(projection)
    }

    /// Copy with a new field of view; orthographic projections are returned unchanged
    pub fn with_fov(self, new_fov: f32) -> Result<Self, CameraError> {
        let projection = match self {
            Self::Perspective { aspect_ratio, near, far, .. } => {
                Self::Perspective { fov_y: new_fov, aspect_ratio, near, far }
            }
            ortho @ Self::Orthographic { .. } => ortho,
        };
        projection.validate()?;
        Ok(projection)
    }

    /// Update the aspect ratio from render-target pixel dimensions
    ///
    /// Only perspective projections follow the target size. A zero-sized
    /// target is rejected.
    pub fn resized(self, width: u32, height: u32) -> Result<Self, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidProjection(format!(
                "render target {width}x{height} has no area"
            )));
        }
        match self {
            Self::Perspective { fov_y, near, far, .. } => {
                Self::perspective(fov_y, width as f32 / height as f32, near, far)
            }
            ortho @ Self::Orthographic { .. } => Ok(ortho),
        }
    }

    /// Convert a depth-buffer value in [0, 1] back to linear view distance
    pub fn linearize_depth(&self, depth: f32) -> f32 {
        let (near, far) = (self.near(), self.far());
        let z_ndc = depth * 2.0 - 1.0;
        match self {
            Self::Perspective { .. } => (2.0 * near * far) / (far + near - z_ndc * (far - near)),
            Self::Orthographic { .. } => near + depth * (far - near),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_perspective_70() {
        let projection = Projection::default();
        assert_eq!(projection.fov_y(), Some(70.0));
        assert_relative_eq!(projection.near(), 0.01);
        assert_relative_eq!(projection.far(), 1000.0);
        assert!(projection.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_parameters() {
        assert!(Projection::perspective(70.0, 1.0, 1.0, 1.0).is_err());
        assert!(Projection::perspective(70.0, 1.0, 0.0, 10.0).is_err());
        assert!(Projection::perspective(70.0, 0.0, 0.1, 10.0).is_err());
        assert!(Projection::perspective(0.0, 1.0, 0.1, 10.0).is_err());
        assert!(Projection::orthographic(-1.0, -1.0, -1.0, 1.0, 0.1, 10.0).is_err());
        assert!(Projection::orthographic(-1.0, 1.0, -1.0, 1.0, 5.0, 5.0).is_err());
    }

    #[test]
    fn test_rejects_non_finite_parameters() {
        assert!(Projection::orthographic(f32::NAN, 1.0, -1.0, 1.0, 0.1, 10.0).is_err());
        assert!(Projection::orthographic(-1.0, 1.0, -1.0, f32::INFINITY, 0.1, 10.0).is_err());
        assert!(Projection::orthographic(-1.0, 1.0, -1.0, 1.0, 0.1, f32::NAN).is_err());
        assert!(Projection::perspective(70.0, 1.0, 0.1, f32::INFINITY).is_err());
        assert!(Projection::perspective(f32::NAN, 1.0, 0.1, 10.0).is_err());
        assert!(Projection::perspective(70.0, 1.0, f32::NAN, 10.0).is_err());
    }

    #[test]
    fn test_resize_updates_perspective_only() {
        let perspective = Projection::default().resized(1920, 1080).expect("valid size");
        assert_relative_eq!(perspective.aspect_ratio(), 1920.0 / 1080.0);

        let ortho = Projection::default_orthographic();
        assert_eq!(ortho.resized(1920, 1080), Ok(ortho));

        assert!(Projection::default().resized(0, 1080).is_err());
    }

    #[test]
    fn test_linearize_depth_endpoints() {
        let projection = Projection::perspective(60.0, 1.0, 0.5, 50.0).expect("valid");
        assert_relative_eq!(projection.linearize_depth(0.0), 0.5, epsilon = 1e-4);
        assert_relative_eq!(projection.linearize_depth(1.0), 50.0, epsilon = 1e-2);
    }

    #[test]
    fn test_serde_tagged_format() {
        let json = serde_json::to_string(&Projection::default_orthographic()).expect("serialize");
        assert!(json.contains("\"type\":\"Orthographic\""));
        let back: Projection = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Projection::default_orthographic());
    }
}
