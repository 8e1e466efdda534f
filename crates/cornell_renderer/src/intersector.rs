//! Ray-intersection service used by the frame pipeline.
//!
//! The pipeline only depends on this trait: build a structure from the
//! scene's vertices and masks, then answer nearest-hit or any-hit queries
//! for whole ray buffers.

use crate::{Intersection, Ray};
use rayon::prelude::*;

/// Intersection query mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionType {
    /// Closest hit, with primitive index and barycentric coordinates
    Nearest,
    /// First hit found; only `distance >= 0` is meaningful (visibility)
    Any,
}

/// Trait for triangle acceleration structures that can be queried by rays.
pub trait Intersector: Send + Sync {
    /// Number of triangles the structure was built from.
    fn triangle_count(&self) -> usize;

    /// Intersect a single ray. Inactive rays and misses return
    /// `Intersection::MISS`.
    fn intersect_ray(&self, ray: &Ray, kind: IntersectionType) -> Intersection;

    /// Intersect a ray buffer, one result per ray, in parallel.
    fn intersect(&self, rays: &[Ray], kind: IntersectionType, intersections: &mut [Intersection]) {
        debug_assert_eq!(rays.len(), intersections.len());

        intersections
            .par_iter_mut()
            .zip(rays.par_iter())
            .for_each(|(out, ray)| *out = self.intersect_ray(ray, kind));
    }
}
