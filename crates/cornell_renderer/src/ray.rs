//! Ray and intersection records shared by the kernels and the intersector.
//!
//! Both are plain `#[repr(C)]` records so that a buffer of them has a fixed
//! stride, the way the device-side buffers are laid out.

use bytemuck::{Pod, Zeroable};
use cornell_math::{Vec2, Vec3};

/// A ray with origin, mask, direction, maximum distance and throughput.
///
/// A negative `max_distance` marks the ray as inactive: the intersector
/// reports a miss for it and the kernels skip it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Ray {
    pub origin: Vec3,
    /// Tested against per-triangle masks; a triangle is hit only when
    /// `mask & triangle_mask != 0`
    pub mask: u32,
    pub direction: Vec3,
    pub max_distance: f32,
    /// Path throughput for camera rays, light contribution for shadow rays
    pub color: Vec3,
    _pad: u32,
}

/// Sees geometry and the light.
pub const RAY_MASK_PRIMARY: u32 = 3;
/// Sees geometry only, so the light quad never occludes its own samples.
pub const RAY_MASK_SHADOW: u32 = 1;
/// Sees geometry only; bounced paths pick up light through shadow rays.
pub const RAY_MASK_SECONDARY: u32 = 1;

/// Byte stride of a ray buffer element.
pub const RAY_STRIDE: usize = std::mem::size_of::<Ray>();

const _: () = assert!(RAY_STRIDE == 48);

impl Ray {
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, mask: u32, max_distance: f32, color: Vec3) -> Self {
        Self {
            origin,
            mask,
            direction,
            max_distance,
            color,
            _pad: 0,
        }
    }

    /// An inactive ray.
    pub fn inactive() -> Self {
        Self {
            max_distance: -1.0,
            ..Self::zeroed()
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.max_distance >= 0.0
    }

    #[inline]
    pub fn deactivate(&mut self) {
        self.max_distance = -1.0;
    }

    /// Compute a point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

/// Result of intersecting one ray.
///
/// `coordinates` are the barycentric weights of the triangle's first and
/// second vertex; the third weight is `1 - x - y`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Intersection {
    /// Hit distance along the ray; negative for a miss
    pub distance: f32,
    pub primitive_index: u32,
    pub coordinates: Vec2,
}

/// Byte stride of an intersection buffer element.
pub const INTERSECTION_STRIDE: usize = std::mem::size_of::<Intersection>();

impl Intersection {
    pub const MISS: Intersection = Intersection {
        distance: -1.0,
        primitive_index: u32::MAX,
        coordinates: Vec2::ZERO,
    };

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.distance >= 0.0
    }

    /// Interpolate a per-vertex attribute of the hit triangle.
    #[inline]
    pub fn interpolate(&self, attributes: &[Vec3]) -> Vec3 {
        let base = self.primitive_index as usize * 3;
        let w0 = self.coordinates.x;
        let w1 = self.coordinates.y;
        let w2 = 1.0 - w0 - w1;
        w0 * attributes[base] + w1 * attributes[base + 1] + w2 * attributes[base + 2]
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::MISS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, RAY_MASK_PRIMARY, f32::INFINITY, Vec3::ONE);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(2.5), Vec3::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn test_activity() {
        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z, RAY_MASK_SHADOW, 0.0, Vec3::ONE);
        assert!(ray.is_active());

        ray.deactivate();
        assert!(!ray.is_active());
        assert!(!Ray::inactive().is_active());
    }

    #[test]
    fn test_strides() {
        assert_eq!(RAY_STRIDE, 48);
        assert_eq!(INTERSECTION_STRIDE, 16);
    }

    #[test]
    fn test_interpolate_weights() {
        let attributes = [Vec3::X, Vec3::Y, Vec3::Z];
        let hit = Intersection {
            distance: 1.0,
            primitive_index: 0,
            coordinates: Vec2::new(0.2, 0.3),
        };
        assert!(hit.interpolate(&attributes).abs_diff_eq(Vec3::new(0.2, 0.3, 0.5), 1e-6));
        assert!(!Intersection::MISS.is_hit());
    }
}
