//! Bounding Volume Hierarchy (BVH) over the scene's triangles.
//!
//! Built once from the flat vertex and mask buffers. Nodes are stored in a
//! flat array with the triangles reordered so each leaf owns a contiguous
//! range.

use crate::triangle::Triangle;
use crate::{Intersection, IntersectionType, Intersector, Ray};
use cornell_core::SceneError;
use cornell_math::{Aabb, Vec3};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Traversal stack depth; median splits keep the tree far shallower.
const STACK_SIZE: usize = 64;

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { first: u32, count: u32 },
    Branch { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    kind: NodeKind,
}

/// Triangle acceleration structure.
pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
}

impl TriangleBvh {
    /// Build from a triangle soup (three vertices per triangle) and one
    /// mask per triangle.
    pub fn build(vertices: &[Vec3], masks: &[u32]) -> Result<Self, SceneError> {
        if vertices.is_empty() {
            return Err(SceneError::Empty);
        }
        if vertices.len() % 3 != 0 {
            return Err(SceneError::PartialTriangle(vertices.len()));
        }
        let triangle_count = vertices.len() / 3;
        if masks.len() != triangle_count {
            return Err(SceneError::AttributeLength {
                name: "masks",
                len: masks.len(),
                expected: triangle_count,
            });
        }

        let mut triangles: Vec<Triangle> = vertices
            .chunks_exact(3)
            .zip(masks)
            .enumerate()
            .map(|(i, (v, &mask))| Triangle::new(v[0], v[1], v[2], mask, i as u32))
            .collect();

        let mut nodes = Vec::with_capacity(2 * triangle_count / LEAF_MAX_SIZE + 1);
        Self::build_node(&mut nodes, &mut triangles, 0);

        log::debug!(
            "Built BVH: {} triangles, {} nodes",
            triangle_count,
            nodes.len()
        );

        Ok(Self { nodes, triangles })
    }

    /// Recursive construction.
    ///
    /// Simple median-split approach: sort triangles by centroid on the
    /// longest axis of the centroid bounds, split in half, recurse.
    fn build_node(nodes: &mut Vec<BvhNode>, triangles: &mut [Triangle], first: usize) -> u32 {
        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, tri| acc.union(&tri.bounds()));
        let index = nodes.len() as u32;

        if triangles.len() <= LEAF_MAX_SIZE {
            nodes.push(BvhNode {
                bounds,
                kind: NodeKind::Leaf {
                    first: first as u32,
                    count: triangles.len() as u32,
                },
            });
            return index;
        }

        let centroid_bounds = triangles.iter().fold(Aabb::EMPTY, |mut acc, tri| {
            acc.grow(tri.centroid());
            acc
        });
        let axis = centroid_bounds.longest_axis();

        triangles.sort_unstable_by(|a, b| {
            a.centroid()[axis]
                .partial_cmp(&b.centroid()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Reserve this slot; children are appended after it
        nodes.push(BvhNode {
            bounds,
            kind: NodeKind::Leaf { first: 0, count: 0 },
        });

        let mid = triangles.len() / 2;
        let (left_tris, right_tris) = triangles.split_at_mut(mid);
        let left = Self::build_node(nodes, left_tris, first);
        let right = Self::build_node(nodes, right_tris, first + mid);

        nodes[index as usize].kind = NodeKind::Branch { left, right };
        index
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bounds of the whole scene.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| root.bounds)
    }
}

impl Intersector for TriangleBvh {
    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn intersect_ray(&self, ray: &Ray, kind: IntersectionType) -> Intersection {
        if !ray.is_active() || self.nodes.is_empty() {
            return Intersection::MISS;
        }

        let inv_dir = ray.direction.recip();
        let mut t_max = ray.max_distance;
        let mut closest = Intersection::MISS;

        let mut stack = [0u32; STACK_SIZE];
        let mut sp = 1;

        while sp > 0 {
            sp -= 1;
            let node = &self.nodes[stack[sp] as usize];

            match node.kind {
                NodeKind::Leaf { first, count } => {
                    let range = first as usize..(first + count) as usize;
                    for tri in &self.triangles[range] {
                        if tri.mask & ray.mask == 0 {
                            continue;
                        }
                        if let Some(hit) = tri.intersect(ray.origin, ray.direction, 0.0, t_max) {
                            closest = Intersection {
                                distance: hit.t,
                                primitive_index: tri.index,
                                coordinates: hit.coordinates,
                            };
                            if kind == IntersectionType::Any {
                                return closest;
                            }
                            t_max = hit.t;
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    let t_left = self.nodes[left as usize]
                        .bounds
                        .intersect(ray.origin, inv_dir, 0.0, t_max);
                    let t_right = self.nodes[right as usize]
                        .bounds
                        .intersect(ray.origin, inv_dir, 0.0, t_max);

                    // Push the far child first so the near one is popped next
                    let (first, second) = match (t_left, t_right) {
                        (Some(a), Some(b)) if a <= b => (Some(right), Some(left)),
                        (Some(_), Some(_)) => (Some(left), Some(right)),
                        (Some(_), None) => (None, Some(left)),
                        (None, Some(_)) => (None, Some(right)),
                        (None, None) => (None, None),
                    };
                    for child in [first, second].into_iter().flatten() {
                        debug_assert!(sp < STACK_SIZE, "BVH traversal stack overflow");
                        stack[sp] = child;
                        sp += 1;
                    }
                }
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::{RAY_MASK_PRIMARY, RAY_MASK_SHADOW};
    use cornell_core::{Scene, TriangleMask};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Reference answer by testing every triangle.
    fn brute_force(scene: &Scene, ray: &Ray) -> Intersection {
        let mut closest = Intersection::MISS;
        let mut t_max = ray.max_distance;
        for i in 0..scene.triangle_count() {
            if scene.masks[i] & ray.mask == 0 {
                continue;
            }
            let [v0, v1, v2] = scene.triangle(i);
            let tri = Triangle::new(v0, v1, v2, scene.masks[i], i as u32);
            if let Some(hit) = tri.intersect(ray.origin, ray.direction, 0.0, t_max) {
                t_max = hit.t;
                closest = Intersection {
                    distance: hit.t,
                    primitive_index: i as u32,
                    coordinates: hit.coordinates,
                };
            }
        }
        closest
    }

    fn cornell_bvh() -> (Scene, TriangleBvh) {
        let scene = Scene::cornell_box();
        let bvh = TriangleBvh::build(&scene.vertices, &scene.masks).unwrap();
        (scene, bvh)
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(TriangleBvh::build(&[], &[]), Err(SceneError::Empty)));
        assert!(matches!(
            TriangleBvh::build(&[Vec3::ZERO; 4], &[1]),
            Err(SceneError::PartialTriangle(4))
        ));
        assert!(matches!(
            TriangleBvh::build(&[Vec3::ZERO; 3], &[]),
            Err(SceneError::AttributeLength { .. })
        ));
    }

    #[test]
    fn test_build_cornell_box() {
        let (scene, bvh) = cornell_bvh();
        assert_eq!(bvh.triangle_count(), 36);
        assert!(bvh.node_count() > 1);

        let bounds = bvh.bounds();
        assert!(bounds.min.abs_diff_eq(scene.bounds().min, 1e-6));
        assert!(bounds.max.abs_diff_eq(scene.bounds().max, 1e-6));
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let (scene, bvh) = cornell_bvh();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..2000 {
            let origin = Vec3::new(
                rng.gen_range(-0.95..0.95),
                rng.gen_range(0.05..1.95),
                rng.gen_range(-0.95..0.95),
            );
            let direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize_or(Vec3::Y);
            let mask = if rng.gen_bool(0.5) { RAY_MASK_PRIMARY } else { RAY_MASK_SHADOW };
            let ray = Ray::new(origin, direction, mask, f32::INFINITY, Vec3::ONE);

            let expected = brute_force(&scene, &ray);
            let actual = bvh.intersect_ray(&ray, IntersectionType::Nearest);

            assert_eq!(expected.is_hit(), actual.is_hit());
            if expected.is_hit() {
                assert!((expected.distance - actual.distance).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_mask_filters_light() {
        let (scene, bvh) = cornell_bvh();

        // Straight up from the floor center through the light quad
        let up = |mask| Ray::new(Vec3::new(0.0, 0.01, 0.0), Vec3::Y, mask, f32::INFINITY, Vec3::ONE);

        let primary = bvh.intersect_ray(&up(RAY_MASK_PRIMARY), IntersectionType::Nearest);
        assert!(primary.is_hit());
        assert_eq!(scene.masks[primary.primitive_index as usize], TriangleMask::Light.bits());

        let shadow = bvh.intersect_ray(&up(RAY_MASK_SHADOW), IntersectionType::Nearest);
        assert!(shadow.is_hit());
        assert_eq!(scene.masks[shadow.primitive_index as usize], TriangleMask::Geometry.bits());
        assert!(shadow.distance > primary.distance);
    }

    #[test]
    fn test_any_hit_and_max_distance() {
        let (_, bvh) = cornell_bvh();

        // From above the short box down to the floor: the box top is in the way
        let origin = Vec3::new(0.3275, 1.5, 0.3725);
        let blocked = Ray::new(origin, -Vec3::Y, RAY_MASK_SHADOW, 1.49, Vec3::ONE);
        assert!(bvh.intersect_ray(&blocked, IntersectionType::Any).is_hit());

        // Stopping short of the box top sees nothing
        let short = Ray::new(origin, -Vec3::Y, RAY_MASK_SHADOW, 0.5, Vec3::ONE);
        assert!(!bvh.intersect_ray(&short, IntersectionType::Any).is_hit());
    }

    #[test]
    fn test_inactive_rays_miss() {
        let (_, bvh) = cornell_bvh();
        let rays = [Ray::inactive(); 4];
        let mut out = [Intersection::default(); 4];

        bvh.intersect(&rays, IntersectionType::Nearest, &mut out);
        assert!(out.iter().all(|hit| !hit.is_hit()));
    }

    #[test]
    fn test_escaping_ray_misses() {
        let (_, bvh) = cornell_bvh();

        // The room has no front wall
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.9), Vec3::Z, RAY_MASK_PRIMARY, f32::INFINITY, Vec3::ONE);
        assert!(!bvh.intersect_ray(&ray, IntersectionType::Nearest).is_hit());
    }
}
