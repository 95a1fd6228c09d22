//! View frustum for visibility culling
//!
//! Planes are extracted from the combined view-projection matrix with the
//! Gribb-Hartmann method and stored normalized, normals pointing inward.

use crate::foundation::math::{Mat4, Vec3};
use crate::scene::bounds::{BoundingSphere, Halfspace, Plane, AABB};

/// Index of each plane inside [`Frustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Left clip plane
    Left = 0,
    /// Right clip plane
    Right = 1,
    /// Top clip plane
    Top = 2,
    /// Bottom clip plane
    Bottom = 3,
    /// Near clip plane
    Near = 4,
    /// Far clip plane
    Far = 5,
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, top, bottom, near, far)
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_projection(&Mat4::identity(), &Mat4::identity())
    }
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from separate view and projection matrices
    pub fn from_view_projection(view: &Mat4, projection: &Mat4) -> Self {
        Self::from_matrix(&(projection * view))
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Clip space is OpenGL style, `-w <= x, y, z <= w`.
    pub fn from_matrix(vp: &Mat4) -> Self {
        let r0 = vp.row(0).transpose();
        let r1 = vp.row(1).transpose();
        let r2 = vp.row(2).transpose();
        let r3 = vp.row(3).transpose();

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Re-extract planes in place
    pub fn initialize(&mut self, view: &Mat4, projection: &Mat4) {
        *self = Self::from_view_projection(view, projection);
    }

    /// Plane by name
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// Classify a box against every plane
    ///
    /// `Negative` as soon as one plane rejects it, `Intersecting` if any plane
    /// straddles it, `Positive` when fully inside.
    pub fn classify_aabb(&self, aabb: &AABB) -> Halfspace {
        self.classify_with(|plane| plane.classify_aabb(aabb))
    }

    /// Classify a sphere against every plane
    pub fn classify_sphere(&self, sphere: &BoundingSphere) -> Halfspace {
        self.classify_with(|plane| plane.classify_sphere(sphere))
    }

    /// Classify a point against every plane
    pub fn classify_point(&self, point: Vec3) -> Halfspace {
        self.classify_with(|plane| plane.classify_point(point))
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.classify_aabb(aabb) != Halfspace::Negative
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.classify_sphere(sphere) != Halfspace::Negative
    }

    /// Check if a point is inside or on the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.classify_point(point) != Halfspace::Negative
    }

    fn classify_with(&self, mut classify: impl FnMut(&Plane) -> Halfspace) -> Halfspace {
        let mut result = Halfspace::Positive;
        for plane in &self.planes {
            match classify(plane) {
                Halfspace::Negative => return Halfspace::Negative,
                Halfspace::Intersecting => result = Halfspace::Intersecting,
                Halfspace::Positive => {}
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils, Mat4Ext};
    use approx::assert_relative_eq;

    fn test_frustum() -> Frustum {
        let view = Mat4::try_look_at_rh(&Vec3::new(0.0, 0.0, 5.0), &Vec3::zeros(), &Vec3::y())
            .expect("valid look-at");
        let projection = Mat4::perspective_gl(utils::deg_to_rad(70.0), 1.0, 0.1, 100.0);
        Frustum::from_view_projection(&view, &projection)
    }

    #[test]
    fn test_planes_are_normalized() {
        for plane in &test_frustum().planes {
            assert_relative_eq!(plane.normal.magnitude(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_plane_order() {
        let frustum = test_frustum();
        // Looking down -Z: left plane normal leans +X, right plane leans -X
        assert!(frustum.plane(FrustumPlane::Left).normal.x > 0.0);
        assert!(frustum.plane(FrustumPlane::Right).normal.x < 0.0);
        assert!(frustum.plane(FrustumPlane::Top).normal.y < 0.0);
        assert!(frustum.plane(FrustumPlane::Bottom).normal.y > 0.0);
        assert!(frustum.plane(FrustumPlane::Near).normal.z < 0.0);
        assert!(frustum.plane(FrustumPlane::Far).normal.z > 0.0);
    }

    #[test]
    fn test_contains_in_front_rejects_behind() {
        let frustum = test_frustum();

        assert!(frustum.contains_point(Vec3::zeros()));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 10.0)));

        let ahead = AABB::from_center_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5));
        let behind = AABB::from_center_extents(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.5, 0.5, 0.5));
        assert!(frustum.intersects_aabb(&ahead));
        assert!(!frustum.intersects_aabb(&behind));

        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 200.0), 1.0)));
    }

    #[test]
    fn test_straddling_box_is_kept() {
        let frustum = test_frustum();
        let huge = AABB::from_center_extents(Vec3::zeros(), Vec3::new(500.0, 500.0, 500.0));

        assert_eq!(frustum.classify_aabb(&huge), Halfspace::Intersecting);
        assert!(frustum.intersects_aabb(&huge));
    }
}
