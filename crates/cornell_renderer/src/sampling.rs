//! Low-discrepancy sequences and the sampling routines built on them.

use crate::uniforms::AreaLight;
use cornell_math::{Vec2, Vec3};
use std::f32::consts::PI;

/// First 24 primes; one Halton dimension per prime.
pub const PRIMES: [u32; 24] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
];

/// Halton sequence: radical inverse of `index` in the base of the
/// `dimension`-th prime.
pub fn halton(mut index: u32, dimension: usize) -> f32 {
    let base = PRIMES[dimension];
    let mut fraction = 1.0;
    let mut result = 0.0;

    while index > 0 {
        fraction /= base as f32;
        result += fraction * (index % base) as f32;
        index /= base;
    }

    result
}

/// Two consecutive Halton dimensions as a 2D sample.
#[inline]
pub fn halton_2d(index: u32, dimension: usize) -> Vec2 {
    Vec2::new(halton(index, dimension), halton(index, dimension + 1))
}

/// Cosine-weighted direction in the +Y hemisphere.
pub fn sample_cosine_weighted_hemisphere(u: Vec2) -> Vec3 {
    let phi = 2.0 * PI * u.x;
    let cos_theta = u.y.sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin())
}

/// Rotate a +Y hemisphere sample so that +Y maps onto `normal`.
pub fn align_hemisphere_with_normal(sample: Vec3, normal: Vec3) -> Vec3 {
    // Any vector that is never parallel to a scene normal
    let up = normal;
    let right = normal.cross(Vec3::new(0.0072, 1.0, 0.0034)).normalize();
    let forward = right.cross(up);

    sample.x * right + sample.y * up + sample.z * forward
}

/// A point sampled on the area light, seen from a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the shading point towards the sample
    pub direction: Vec3,
    pub distance: f32,
    /// Incoming radiance with inverse-square falloff and the light's cosine
    pub color: Vec3,
}

/// Uniformly sample the rectangular area light.
pub fn sample_area_light(light: &AreaLight, u: Vec2, position: Vec3) -> LightSample {
    let r = u * 2.0 - Vec2::ONE;
    let sample_position = light.position + light.right * r.x + light.up * r.y;

    let offset = sample_position - position;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return LightSample {
            direction: -light.forward,
            distance: 0.0,
            color: Vec3::ZERO,
        };
    }
    let direction = offset / distance;

    let cos_light = (-direction).dot(light.forward).clamp(0.0, 1.0);
    let color = light.color / (distance * distance) * cos_light;

    LightSample {
        direction,
        distance,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halton_base_two() {
        let expected = [0.0, 0.5, 0.25, 0.75, 0.125, 0.625];
        for (i, e) in expected.iter().enumerate() {
            assert!((halton(i as u32, 0) - e).abs() < 1e-6);
        }
    }

    #[test]
    fn test_halton_base_three() {
        assert!((halton(1, 1) - 1.0 / 3.0).abs() < 1e-6);
        assert!((halton(2, 1) - 2.0 / 3.0).abs() < 1e-6);
        assert!((halton(3, 1) - 1.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_halton_stays_in_unit_interval() {
        for dimension in 0..PRIMES.len() {
            for i in [0, 1, 17, 1023, 1 << 20, (1 << 20) + 12_345] {
                let h = halton(i, dimension);
                assert!((0.0..1.0).contains(&h), "halton({i}, {dimension}) = {h}");
            }
        }
    }

    #[test]
    fn test_hemisphere_sample_is_unit_and_upward() {
        for i in 0..64 {
            let dir = sample_cosine_weighted_hemisphere(halton_2d(i, 2));
            assert!((dir.length() - 1.0).abs() < 1e-5);
            assert!(dir.y >= 0.0);
        }
    }

    #[test]
    fn test_align_with_normal() {
        for normal in [Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, Vec3::new(1.0, 1.0, 1.0).normalize()] {
            // The pole maps onto the normal
            assert!(align_hemisphere_with_normal(Vec3::Y, normal).abs_diff_eq(normal, 1e-5));

            let dir = sample_cosine_weighted_hemisphere(Vec2::new(0.3, 0.4));
            let aligned = align_hemisphere_with_normal(dir, normal);
            assert!((aligned.length() - 1.0).abs() < 1e-4);
            assert!((aligned.dot(normal) - dir.y).abs() < 1e-4);
        }
    }

    fn test_light() -> AreaLight {
        AreaLight::new(
            Vec3::new(0.0, 1.98, 0.0),
            -Vec3::Y,
            Vec3::new(0.25, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.25),
            Vec3::splat(4.0),
        )
    }

    #[test]
    fn test_light_sample_center() {
        let light = test_light();
        let sample = sample_area_light(&light, Vec2::splat(0.5), Vec3::ZERO);

        assert!(sample.direction.abs_diff_eq(Vec3::Y, 1e-6));
        assert!((sample.distance - 1.98).abs() < 1e-6);
        let expected = 4.0 / (1.98 * 1.98);
        assert!(sample.color.abs_diff_eq(Vec3::splat(expected), 1e-5));
    }

    #[test]
    fn test_light_sample_corners_stay_on_quad() {
        let light = test_light();
        let sample = sample_area_light(&light, Vec2::ZERO, Vec3::ZERO);
        let point = sample.direction * sample.distance;

        assert!(point.abs_diff_eq(Vec3::new(-0.25, 1.98, -0.25), 1e-5));
    }

    #[test]
    fn test_light_behind_emitter_is_dark() {
        let light = test_light();
        let sample = sample_area_light(&light, Vec2::splat(0.5), Vec3::new(0.0, 3.0, 0.0));

        assert_eq!(sample.color, Vec3::ZERO);
    }
}
