//! Flat triangle buffers for the fixed Cornell box scene.
//!
//! Geometry is stored as four parallel arrays with no index buffer: every
//! three consecutive vertices form a triangle, and `masks` has one entry per
//! triangle. The arrays are uploaded verbatim to the renderer.

use cornell_math::{rotation, scale, transform_position, translation, triangle_normal, Aabb, Mat4, Vec3};

use crate::error::{SceneError, SceneResult};
use crate::face_mask::{CubeFace, FaceMask};

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Per-triangle classification consumed by intersection and shading.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangleMask {
    /// Ordinary diffuse geometry
    Geometry = 1,
    /// Emitter; only primary rays see it
    Light = 2,
}

impl TriangleMask {
    pub const fn bits(self) -> u32 {
        self as u32
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(TriangleMask::Geometry),
            2 => Some(TriangleMask::Light),
            _ => None,
        }
    }
}

/// Corners of the unit cube, indexed by (z << 2 | y << 1 | x).
const UNIT_CUBE: [Vec3; 8] = [
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(-0.5, 0.5, -0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(-0.5, 0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
];

/// Triangle soup with per-vertex normals and colors and per-triangle masks.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Vertex positions (three per triangle)
    pub vertices: Vec<Vec3>,
    /// Vertex normals, constant across each triangle
    pub normals: Vec<Vec3>,
    /// Vertex colors, constant across each cube
    pub colors: Vec<Color>,
    /// One `TriangleMask` value per triangle
    pub masks: Vec<u32>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default scene: area light, room, and two boxes.
    ///
    /// Emission order is light (2 triangles), floor/ceiling/back wall,
    /// left wall, right wall, short box, tall box.
    pub fn cornell_box() -> Self {
        let mut scene = Scene::new();
        let white = Color::new(0.725, 0.71, 0.68);

        // Light source, a thin slab just below the ceiling
        let transform = translation(0.0, 1.0, 0.0) * scale(0.5, 1.98, 0.5);
        scene.add_cube(
            FaceMask::POSITIVE_Y,
            Color::ONE,
            &transform,
            true,
            TriangleMask::Light,
        );

        let room = translation(0.0, 1.0, 0.0) * scale(2.0, 2.0, 2.0);

        // Top, bottom, and back walls
        scene.add_cube(
            FaceMask::NEGATIVE_Y | FaceMask::POSITIVE_Y | FaceMask::NEGATIVE_Z,
            white,
            &room,
            true,
            TriangleMask::Geometry,
        );

        // Left wall
        scene.add_cube(
            FaceMask::NEGATIVE_X,
            Color::new(0.63, 0.065, 0.05),
            &room,
            true,
            TriangleMask::Geometry,
        );

        // Right wall
        scene.add_cube(
            FaceMask::POSITIVE_X,
            Color::new(0.14, 0.45, 0.091),
            &room,
            true,
            TriangleMask::Geometry,
        );

        // Short box
        let transform = translation(0.3275, 0.3, 0.3725)
            * rotation(-0.3, Vec3::Y)
            * scale(0.6, 0.6, 0.6);
        scene.add_cube(FaceMask::ALL, white, &transform, false, TriangleMask::Geometry);

        // Tall box
        let transform = translation(-0.335, 0.6, -0.29)
            * rotation(0.3, Vec3::Y)
            * scale(0.6, 1.2, 0.6);
        scene.add_cube(FaceMask::ALL, white, &transform, false, TriangleMask::Geometry);

        log::debug!(
            "Built Cornell box: {} triangles, {} vertices",
            scene.triangle_count(),
            scene.vertex_count()
        );

        scene
    }

    /// Append the selected faces of a transformed unit cube.
    ///
    /// Each face becomes two triangles (i0, i1, i2) and (i0, i2, i3). The
    /// face winding yields outward normals; `inward_normals` negates them,
    /// which is what the room walls and the light quad want since they are
    /// seen from inside.
    pub fn add_cube(
        &mut self,
        faces: FaceMask,
        color: Color,
        transform: &Mat4,
        inward_normals: bool,
        mask: TriangleMask,
    ) {
        let corners = UNIT_CUBE.map(|corner| transform_position(transform, corner));

        for face in faces.faces() {
            self.add_cube_face(&corners, face, color, inward_normals, mask);
        }
    }

    fn add_cube_face(
        &mut self,
        corners: &[Vec3; 8],
        face: CubeFace,
        color: Color,
        inward_normals: bool,
        mask: TriangleMask,
    ) {
        let [i0, i1, i2, i3] = face.corner_indices();
        let (v0, v1, v2, v3) = (corners[i0], corners[i1], corners[i2], corners[i3]);

        let mut n0 = triangle_normal(v0, v1, v2);
        let mut n1 = triangle_normal(v0, v2, v3);

        if inward_normals {
            n0 = -n0;
            n1 = -n1;
        }

        self.vertices.extend_from_slice(&[v0, v1, v2, v0, v2, v3]);
        self.normals.extend_from_slice(&[n0, n0, n0, n1, n1, n1]);
        self.colors.extend(std::iter::repeat(color).take(6));
        self.masks.extend(std::iter::repeat(mask.bits()).take(2));
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex positions of triangle `index`.
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let base = index * 3;
        [
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        ]
    }

    /// Bounds of all vertices.
    pub fn bounds(&self) -> Aabb {
        self.vertices.iter().fold(Aabb::EMPTY, |mut acc, v| {
            acc.grow(*v);
            acc
        })
    }

    /// Check the parallel-array invariants.
    pub fn validate(&self) -> SceneResult<()> {
        let vertex_count = self.vertices.len();
        if vertex_count == 0 {
            return Err(SceneError::Empty);
        }
        if vertex_count % 3 != 0 {
            return Err(SceneError::PartialTriangle(vertex_count));
        }

        let expect = |name, len, expected| {
            if len == expected {
                Ok(())
            } else {
                Err(SceneError::AttributeLength {
                    name,
                    len,
                    expected,
                })
            }
        };
        expect("normals", self.normals.len(), vertex_count)?;
        expect("colors", self.colors.len(), vertex_count)?;
        expect("masks", self.masks.len(), vertex_count / 3)?;

        if let Some((index, &value)) = self
            .masks
            .iter()
            .enumerate()
            .find(|(_, &m)| TriangleMask::from_bits(m).is_none())
        {
            return Err(SceneError::UnknownMask { index, value });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_masks() -> impl Iterator<Item = FaceMask> {
        (0u8..64).map(FaceMask::from_bits_truncate)
    }

    #[test]
    fn test_cube_counts_for_every_mask() {
        let transform = translation(0.1, -0.2, 0.3) * rotation(0.4, Vec3::new(1.0, 1.0, 0.0));

        for faces in face_masks() {
            for inward in [false, true] {
                let mut scene = Scene::new();
                scene.add_cube(faces, Color::ONE, &transform, inward, TriangleMask::Geometry);

                let n = faces.count();
                assert_eq!(scene.vertices.len(), 6 * n);
                assert_eq!(scene.normals.len(), 6 * n);
                assert_eq!(scene.colors.len(), 6 * n);
                assert_eq!(scene.masks.len(), 2 * n);
            }
        }
    }

    #[test]
    fn test_normals_face_away_from_centroid() {
        let transform = translation(-0.335, 0.6, -0.29) * rotation(0.3, Vec3::Y) * scale(0.6, 1.2, 0.6);
        let centroid = transform_position(&transform, Vec3::ZERO);

        for inward in [false, true] {
            for face in CubeFace::ALL {
                let mut scene = Scene::new();
                scene.add_cube(face.mask(), Color::ONE, &transform, inward, TriangleMask::Geometry);

                for tri in 0..2 {
                    let [v0, v1, v2] = scene.triangle(tri);
                    let normal = scene.normals[tri * 3];
                    let outward = ((v0 + v1 + v2) / 3.0 - centroid).dot(normal);

                    assert!((normal.length() - 1.0).abs() < 1e-5);
                    if inward {
                        assert!(outward < 0.0, "{face:?} triangle {tri} points out");
                    } else {
                        assert!(outward > 0.0, "{face:?} triangle {tri} points in");
                    }
                }
            }
        }
    }

    #[test]
    fn test_face_vertex_layout() {
        let mut scene = Scene::new();
        scene.add_cube(
            FaceMask::NEGATIVE_X,
            Color::new(0.1, 0.2, 0.3),
            &Mat4::IDENTITY,
            false,
            TriangleMask::Light,
        );

        // (0, 4, 6) and (0, 6, 2)
        assert_eq!(scene.vertices[0], UNIT_CUBE[0]);
        assert_eq!(scene.vertices[1], UNIT_CUBE[4]);
        assert_eq!(scene.vertices[2], UNIT_CUBE[6]);
        assert_eq!(scene.vertices[3], UNIT_CUBE[0]);
        assert_eq!(scene.vertices[4], UNIT_CUBE[6]);
        assert_eq!(scene.vertices[5], UNIT_CUBE[2]);

        assert!(scene.normals.iter().all(|n| n.abs_diff_eq(-Vec3::X, 1e-6)));
        assert!(scene.colors.iter().all(|c| *c == Color::new(0.1, 0.2, 0.3)));
        assert_eq!(scene.masks, vec![2, 2]);
    }

    #[test]
    fn test_cornell_box_layout() {
        let scene = Scene::cornell_box();

        // 1 light face + 3 + 1 + 1 room faces + 6 + 6 box faces = 18 faces
        assert_eq!(scene.vertex_count(), 108);
        assert_eq!(scene.triangle_count(), 36);
        assert_eq!(scene.masks.len(), 36);
        assert_eq!(&scene.masks[..2], &[2, 2]);
        assert!(scene.masks[2..].iter().all(|&m| m == 1));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_cornell_box_light_placement() {
        let scene = Scene::cornell_box();

        // Light quad sits at y = 1.99, just under the ceiling, facing down
        for v in &scene.vertices[..6] {
            assert!((v.y - 1.99).abs() < 1e-5);
            assert!(v.x.abs() <= 0.25 + 1e-6 && v.z.abs() <= 0.25 + 1e-6);
        }
        for n in &scene.normals[..6] {
            assert!(n.abs_diff_eq(-Vec3::Y, 1e-5));
        }

        // Room spans [-1, 1] x [0, 2] x [-1, 1]
        let bounds = scene.bounds();
        assert!(bounds.min.abs_diff_eq(Vec3::new(-1.0, 0.0, -1.0), 1e-5));
        assert!(bounds.max.abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5));
    }

    #[test]
    fn test_room_normals_point_inward() {
        let scene = Scene::cornell_box();
        let center = Vec3::new(0.0, 1.0, 0.0);

        // Triangles 2..12 are the five room faces
        for tri in 2..12 {
            let [v0, v1, v2] = scene.triangle(tri);
            let normal = scene.normals[tri * 3];
            assert!((center - (v0 + v1 + v2) / 3.0).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(Scene::new().validate(), Err(SceneError::Empty));

        let mut scene = Scene::cornell_box();
        scene.masks.pop();
        assert_eq!(
            scene.validate(),
            Err(SceneError::AttributeLength {
                name: "masks",
                len: 35,
                expected: 36
            })
        );

        let mut scene = Scene::cornell_box();
        scene.masks[5] = 7;
        assert_eq!(
            scene.validate(),
            Err(SceneError::UnknownMask { index: 5, value: 7 })
        );

        let mut scene = Scene::cornell_box();
        scene.vertices.push(Vec3::ZERO);
        assert_eq!(scene.validate(), Err(SceneError::PartialTriangle(97)));
    }
}
