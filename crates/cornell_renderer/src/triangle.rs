//! Ray/triangle intersection.
//!
//! Uses the Möller-Trumbore algorithm. Both faces are hittable.

use cornell_math::{Aabb, Vec2, Vec3};

/// A triangle prepared for intersection tests.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    /// Classification bits matched against `Ray::mask`
    pub mask: u32,
    /// Index of the triangle in the scene's buffers
    pub index: u32,
}

/// Distance and barycentric weights of a triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    /// Weights of v0 and v1
    pub coordinates: Vec2,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, mask: u32, index: u32) -> Self {
        Self {
            v0,
            edge1: v1 - v0,
            edge2: v2 - v0,
            mask,
            index,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_triangle(self.v0, self.v0 + self.edge1, self.v0 + self.edge2)
    }

    pub fn centroid(&self) -> Vec3 {
        self.v0 + (self.edge1 + self.edge2) / 3.0
    }

    /// Möller-Trumbore ray-triangle intersection within `[t_min, t_max]`.
    #[inline]
    pub fn intersect(&self, origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Option<TriangleHit> {
        let h = direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if t < t_min || t > t_max {
            return None;
        }

        // u weighs v1 and v weighs v2
        Some(TriangleHit {
            t,
            coordinates: Vec2::new(1.0 - u - v, u),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle() -> Triangle {
        // Triangle in XY plane at z=-1
        Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            1,
            0,
        )
    }

    #[test]
    fn test_triangle_hit() {
        let hit = xy_triangle()
            .intersect(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0, f32::INFINITY)
            .unwrap();
        assert!((hit.t - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_triangle_back_face_hit() {
        let hit = xy_triangle().intersect(Vec3::new(0.0, 0.0, -2.0), Vec3::Z, 0.0, f32::INFINITY);
        assert!(hit.is_some());
    }

    #[test]
    fn test_triangle_miss() {
        let tri = xy_triangle();

        // Pointing away
        assert!(tri.intersect(Vec3::ZERO, Vec3::Z, 0.0, f32::INFINITY).is_none());
        // Beyond max distance
        assert!(tri.intersect(Vec3::ZERO, -Vec3::Z, 0.0, 0.5).is_none());
        // Outside the edges
        assert!(tri.intersect(Vec3::new(5.0, 0.0, 0.0), -Vec3::Z, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_barycentric_weights_reconstruct_point() {
        let v0 = Vec3::new(-1.0, -1.0, -1.0);
        let v1 = Vec3::new(1.0, -1.0, -1.0);
        let v2 = Vec3::new(0.0, 1.0, -1.0);
        let tri = Triangle::new(v0, v1, v2, 1, 0);

        let origin = Vec3::new(0.3, -0.2, 0.0);
        let hit = tri.intersect(origin, -Vec3::Z, 0.0, f32::INFINITY).unwrap();

        let w = hit.coordinates;
        let p = w.x * v0 + w.y * v1 + (1.0 - w.x - w.y) * v2;
        assert!(p.abs_diff_eq(Vec3::new(0.3, -0.2, -1.0), 1e-5));
    }
}
