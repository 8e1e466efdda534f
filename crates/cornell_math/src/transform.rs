// Matrix and vector helpers for building scene geometry.
//
// All matrices are column-major glam::Mat4 and act on column vectors,
// so `translation(..) * scale(..)` scales first and translates second.

use glam::{Mat4, Vec3, Vec4};

/// Rotation of `radians` about an arbitrary axis (Rodrigues' formula).
///
/// The axis is normalized here; a zero-length axis is not guarded against.
pub fn rotation(radians: f32, axis: Vec3) -> Mat4 {
    let unit = axis.normalize();
    let (st, ct) = radians.sin_cos();
    let ci = 1.0 - ct;
    let (x, y, z) = (unit.x, unit.y, unit.z);

    Mat4::from_cols(
        Vec4::new(ct + x * x * ci, y * x * ci + z * st, z * x * ci - y * st, 0.0),
        Vec4::new(x * y * ci - z * st, ct + y * y * ci, z * y * ci + x * st, 0.0),
        Vec4::new(x * z * ci + y * st, y * z * ci - x * st, ct + z * z * ci, 0.0),
        Vec4::new(0.0, 0.0, 0.0, 1.0),
    )
}

/// Affine translation stored in the last column.
pub fn translation(tx: f32, ty: f32, tz: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(tx, ty, tz, 1.0),
    )
}

/// Diagonal scale with the homogeneous term set to 1.
pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(sx, 0.0, 0.0, 0.0),
        Vec4::new(0.0, sy, 0.0, 0.0),
        Vec4::new(0.0, 0.0, sz, 0.0),
        Vec4::new(0.0, 0.0, 0.0, 1.0),
    )
}

/// Right-handed perspective projection mapping depth to [0, 1].
pub fn perspective(fovy_radians: f32, aspect_ratio: f32, near_z: f32, far_z: f32) -> Mat4 {
    let ys = 1.0 / (fovy_radians * 0.5).tan();
    let xs = ys / aspect_ratio;
    let zs = far_z / (near_z - far_z);

    Mat4::from_cols(
        Vec4::new(xs, 0.0, 0.0, 0.0),
        Vec4::new(0.0, ys, 0.0, 0.0),
        Vec4::new(0.0, 0.0, zs, -1.0),
        Vec4::new(0.0, 0.0, zs * near_z, 0.0),
    )
}

#[inline]
pub fn radians_from_degrees(degrees: f32) -> f32 {
    (degrees / 180.0) * std::f32::consts::PI
}

/// Apply `m` to a point (w = 1) and keep xyz. No perspective divide.
#[inline]
pub fn transform_position(m: &Mat4, p: Vec3) -> Vec3 {
    (*m * p.extend(1.0)).truncate()
}

/// Unit face normal of a triangle, following the v0 -> v1 -> v2 winding.
///
/// Edges are normalized before the cross product. For a quad split along
/// its diagonal the two edges meet at 45 degrees, so the cross product is
/// normalized again. Degenerate triangles are not guarded against.
pub fn triangle_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let e1 = (v1 - v0).normalize();
    let e2 = (v2 - v0).normalize();
    e1.cross(e2).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_rotation_zero_is_identity() {
        let m = rotation(0.0, Vec3::Y);
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_rotation_matches_glam() {
        let axis = Vec3::new(1.0, 2.0, -0.5);
        let ours = rotation(0.7, axis);
        let glams = Mat4::from_axis_angle(axis.normalize(), 0.7);
        assert!(ours.abs_diff_eq(glams, 1e-5));
    }

    #[test]
    fn test_rotation_unnormalized_axis() {
        // Quarter turn about +Y carries +X to -Z
        let m = rotation(PI / 2.0, Vec3::new(0.0, 5.0, 0.0));
        let p = transform_position(&m, Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn test_translation() {
        let m = translation(10.0, 20.0, 30.0);
        let p = transform_position(&m, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Vec3::new(11.0, 22.0, 33.0));
    }

    #[test]
    fn test_translation_times_scale_on_origin() {
        let m = translation(0.3, 0.6, -0.2) * scale(0.5, 1.98, 0.5);
        let p = transform_position(&m, Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.3, 0.6, -0.2), 1e-6));

        // And w survives the composition
        let w = (m * Vec4::new(0.0, 0.0, 0.0, 1.0)).w;
        assert_eq!(w, 1.0);
    }

    #[test]
    fn test_zero_homogeneous_scale_drops_translation() {
        let mut degenerate = scale(2.0, 2.0, 2.0);
        degenerate.w_axis.w = 0.0;

        let m = translation(0.0, 1.0, 0.0) * degenerate;
        let p = transform_position(&m, Vec3::ZERO);
        assert_eq!(p, Vec3::ZERO);
    }

    #[test]
    fn test_scale_corner() {
        let m = scale(2.0, 3.0, 4.0);
        let p = transform_position(&m, Vec3::splat(0.5));
        assert_eq!(p, Vec3::new(1.0, 1.5, 2.0));
    }

    #[test]
    fn test_perspective_matches_glam() {
        let ours = perspective(radians_from_degrees(65.0), 16.0 / 9.0, 0.1, 100.0);
        let glams = Mat4::perspective_rh(radians_from_degrees(65.0), 16.0 / 9.0, 0.1, 100.0);
        assert!(ours.abs_diff_eq(glams, 1e-5));
    }

    #[test]
    fn test_radians_from_degrees() {
        assert!((radians_from_degrees(180.0) - PI).abs() < 1e-6);
        assert!((radians_from_degrees(45.0) - PI / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_triangle_normal_winding() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!(n.abs_diff_eq(Vec3::Z, 1e-6));

        let flipped = triangle_normal(Vec3::ZERO, Vec3::Y, Vec3::X);
        assert!(flipped.abs_diff_eq(-Vec3::Z, 1e-6));
    }

    #[test]
    fn test_triangle_normal_diagonal_split_is_unit() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0));
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!(n.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_triangle_normal_ignores_edge_length() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X * 7.0, Vec3::Z * 0.01);
        assert!((n.length() - 1.0).abs() < 1e-5);
        assert!(n.abs_diff_eq(-Vec3::Y, 1e-5));
    }
}
