//! Ray type for hit-testing

use super::BoundingSphere;
use strata_core::Vec3;

/// Ray for hit-testing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction (should be normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray from two points
    pub fn from_points(from: Vec3, to: Vec3) -> Self {
        let dir = to - from;
        let len = dir.length();
        let direction = if len > 0.0001 {
            dir * (1.0 / len)
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };
        Self {
            origin: from,
            direction,
        }
    }

    /// Get point along ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Squared distance from `point` to the closest point on the ray
    ///
    /// Points behind the origin measure against the origin itself.
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let t = (point - self.origin).dot(self.direction);
        if t < 0.0 {
            return self.origin.distance_squared(point);
        }
        self.point_at(t).distance_squared(point)
    }

    /// Check if the ray passes within `radius` of `center`
    pub fn intersects_sphere_at(&self, center: Vec3, radius: f32) -> bool {
        self.distance_squared_to_point(center) <= radius * radius
    }

    /// Check if the ray passes through a bounding sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.intersects_sphere_at(sphere.center, sphere.radius)
    }

    /// Distance along the ray to the first surface hit, if any
    ///
    /// Returns `0.0` when the origin is inside the sphere.
    pub fn intersect_sphere_distance(&self, sphere: &BoundingSphere) -> Option<f32> {
        let to_center = sphere.center - self.origin;
        let tca = to_center.dot(self.direction);
        let d2 = to_center.length_squared() - tca * tca;
        let r2 = sphere.radius * sphere.radius;
        if d2 > r2 {
            return None;
        }
        let thc = (r2 - d2).sqrt();
        let t0 = tca - thc;
        let t1 = tca + thc;
        if t1 < 0.0 {
            return None;
        }
        Some(if t0 < 0.0 { 0.0 } else { t0 })
    }
}
