//! Bounding volumes and planes used for visibility tests
//!
//! Following Game Engine Architecture Chapter 12.3 - Collision Primitives.

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Side of a plane a volume lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halfspace {
    /// Entirely on the side the normal points away from
    Negative,
    /// Straddles the plane
    Intersecting,
    /// Entirely on the side the normal points to
    Positive,
}

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |aabb, p| Self {
            min: aabb.min.inf(p),
            max: aabb.max.sup(p),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Axis-aligned box enclosing this box after an affine transform
    ///
    /// Uses Arvo's method: each output axis accumulates the min/max of the
    /// matrix column products, so no corners are enumerated.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = Vec3::new(matrix.m14, matrix.m24, matrix.m34);
        let mut min = translation;
        let mut max = translation;

        for row in 0..3 {
            for col in 0..3 {
                let a = matrix[(row, col)] * self.min[col];
                let b = matrix[(row, col)] * self.max[col];
                min[row] += a.min(b);
                max[row] += a.max(b);
            }
        }

        AABB { min, max }
    }
}

/// Sphere bounding volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere circumscribing a box
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self::new(aabb.center(), aabb.extents().magnitude())
    }
}

/// Plane `A·x + B·y + C·z + D = 0`
///
/// The normal `(A, B, C)` is unit length once [`Plane::normalized`] has run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Normal vector `(A, B, C)`
    pub normal: Vec3,
    /// Offset term `D`
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from a normal and offset, normalizing both
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }.normalized()
    }

    /// Plane from raw `(A, B, C, D)` coefficients, normalized
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        Self::new(coefficients.xyz(), coefficients.w)
    }

    /// Plane through a point with the given normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self { normal, distance: -normal.dot(&point) }
    }

    /// Scale so that the normal is unit length
    ///
    /// A zero normal is returned unchanged.
    pub fn normalized(self) -> Self {
        let length = self.normal.magnitude();
        if length <= f32::EPSILON {
            return self;
        }
        Self {
            normal: self.normal / length,
            distance: self.distance / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Classify a point
    pub fn classify_point(&self, point: Vec3) -> Halfspace {
        let d = self.distance_to_point(point);
        if d < 0.0 {
            Halfspace::Negative
        } else if d > 0.0 {
            Halfspace::Positive
        } else {
            Halfspace::Intersecting
        }
    }

    /// Classify a sphere
    pub fn classify_sphere(&self, sphere: &BoundingSphere) -> Halfspace {
        let d = self.distance_to_point(sphere.center);
        if d < -sphere.radius {
            Halfspace::Negative
        } else if d < sphere.radius {
            Halfspace::Intersecting
        } else {
            Halfspace::Positive
        }
    }

    /// Classify a box with the positive/negative vertex test
    pub fn classify_aabb(&self, aabb: &AABB) -> Halfspace {
        let mut p = aabb.min;
        let mut n = aabb.max;
        for i in 0..3 {
            if self.normal[i] >= 0.0 {
                p[i] = aabb.max[i];
                n[i] = aabb.min[i];
            }
        }

        if self.distance_to_point(p) < 0.0 {
            Halfspace::Negative
        } else if self.distance_to_point(n) < 0.0 {
            Halfspace::Intersecting
        } else {
            Halfspace::Positive
        }
    }
}

/// A ray for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray in world space
    pub origin: Vec3,
    /// Direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at distance `t` along the ray
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Transform a point by an affine matrix
pub(crate) fn transform_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(*point)).coords
}
