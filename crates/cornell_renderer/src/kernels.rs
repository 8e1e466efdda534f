//! Per-pixel compute passes.
//!
//! Each kernel runs one invocation per pixel (or per ray; there is one ray
//! of each kind per pixel) in parallel with rayon. Buffers are indexed by
//! `y * width + x`.

use crate::ray::{RAY_MASK_PRIMARY, RAY_MASK_SECONDARY, RAY_MASK_SHADOW};
use crate::sampling::{align_hemisphere_with_normal, halton_2d, sample_area_light, sample_cosine_weighted_hemisphere};
use crate::texture::{RenderTarget, SeedTexture};
use crate::uniforms::Uniforms;
use crate::{Intersection, Ray};
use cornell_core::{Scene, TriangleMask};
use cornell_math::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

/// Offset along the normal for rays leaving a surface.
const SURFACE_EPSILON: f32 = 1e-3;

/// Halton index for a pixel this frame.
#[inline]
fn sample_index(seed: u32, uniforms: &Uniforms) -> u32 {
    seed.wrapping_add(uniforms.frame_index)
}

/// Generate one jittered primary ray per pixel and clear `target`.
pub fn ray_kernel(uniforms: &Uniforms, seeds: &SeedTexture, rays: &mut [Ray], target: &mut RenderTarget) {
    let camera = uniforms.camera;
    let width = uniforms.width.max(1);
    let size = Vec2::new(uniforms.width as f32, uniforms.height as f32);

    rays.par_iter_mut()
        .zip(target.texels_mut().par_iter_mut())
        .zip(seeds.texels().par_iter())
        .enumerate()
        .for_each(|(i, ((ray, texel), &seed))| {
            let pixel = Vec2::new((i as u32 % width) as f32, (i as u32 / width) as f32);

            // Jitter inside the pixel for antialiasing
            let jitter = halton_2d(sample_index(seed, uniforms), 0);
            let mut uv = (pixel + jitter) / size * 2.0 - Vec2::ONE;
            // Row 0 is the top of the image
            uv.y = -uv.y;

            let direction = (uv.x * camera.right + uv.y * camera.up + camera.forward).normalize();

            *ray = Ray::new(camera.position, direction, RAY_MASK_PRIMARY, f32::INFINITY, Vec3::ONE);
            *texel = Vec4::ZERO;
        });
}

/// Shade nearest hits for one bounce.
///
/// Geometry hits emit a shadow ray towards a sample on the light and turn
/// the path ray into the next bounce. Light hits write the light color on
/// the first bounce. Light hits and misses end both rays.
#[allow(clippy::too_many_arguments)]
pub fn shade_kernel(
    uniforms: &Uniforms,
    bounce: u32,
    scene: &Scene,
    seeds: &SeedTexture,
    intersections: &[Intersection],
    rays: &mut [Ray],
    shadow_rays: &mut [Ray],
    target: &mut RenderTarget,
) {
    let light_dimension = 2 + 4 * bounce as usize;
    let bounce_dimension = light_dimension + 2;

    rays.par_iter_mut()
        .zip(shadow_rays.par_iter_mut())
        .zip(intersections.par_iter())
        .zip(target.texels_mut().par_iter_mut())
        .zip(seeds.texels().par_iter())
        .for_each(|((((ray, shadow_ray), hit), texel), &seed)| {
            if !ray.is_active() || !hit.is_hit() {
                ray.deactivate();
                shadow_ray.deactivate();
                return;
            }

            let mask = scene.masks[hit.primitive_index as usize];
            if mask != TriangleMask::Geometry.bits() {
                if bounce == 0 {
                    *texel = uniforms.light.color.extend(1.0);
                }
                ray.deactivate();
                shadow_ray.deactivate();
                return;
            }

            let position = ray.at(hit.distance);
            let normal = hit.interpolate(&scene.normals).normalize();
            let surface_color = hit.interpolate(&scene.colors);
            let index = sample_index(seed, uniforms);

            let light = sample_area_light(&uniforms.light, halton_2d(index, light_dimension), position);
            let light_color = light.color * normal.dot(light.direction).clamp(0.0, 1.0);

            let origin = position + normal * SURFACE_EPSILON;
            *shadow_ray = Ray::new(
                origin,
                light.direction,
                RAY_MASK_SHADOW,
                light.distance - SURFACE_EPSILON,
                light_color * surface_color * ray.color,
            );

            let sample = sample_cosine_weighted_hemisphere(halton_2d(index, bounce_dimension));
            ray.origin = origin;
            ray.direction = align_hemisphere_with_normal(sample, normal);
            ray.color *= surface_color;
            ray.mask = RAY_MASK_SECONDARY;
        });
}

/// Add the contribution of unoccluded shadow rays: `target = source + shadow`.
pub fn shadow_kernel(
    shadow_rays: &[Ray],
    intersections: &[Intersection],
    source: &RenderTarget,
    target: &mut RenderTarget,
) {
    target
        .texels_mut()
        .par_iter_mut()
        .zip(source.texels().par_iter())
        .zip(shadow_rays.par_iter())
        .zip(intersections.par_iter())
        .for_each(|(((out, src), shadow_ray), hit)| {
            let mut color = src.truncate();
            if shadow_ray.is_active() && !hit.is_hit() {
                color += shadow_ray.color;
            }
            *out = color.extend(1.0);
        });
}

/// Running average of frames: `(render + previous * n) / (n + 1)`, where
/// `n` is the number of frames already accumulated. The first frame copies.
pub fn accumulate_kernel(
    uniforms: &Uniforms,
    render: &RenderTarget,
    previous: &RenderTarget,
    target: &mut RenderTarget,
) {
    let n = uniforms.frame_index as f32;

    target
        .texels_mut()
        .par_iter_mut()
        .zip(render.texels().par_iter())
        .zip(previous.texels().par_iter())
        .for_each(|((out, color), prev)| {
            let mut color = color.truncate();
            if uniforms.frame_index > 0 {
                color = (color + prev.truncate() * n) / (n + 1.0);
            }
            *out = color.extend(1.0);
        });
}

/// Reinhard tone map then display encoding to RGBA8.
pub fn composite_kernel(source: &RenderTarget) -> Vec<[u8; 4]> {
    source
        .texels()
        .par_iter()
        .map(|texel| {
            let color = texel.truncate();
            color_to_rgba(color / (Vec3::ONE + color))
        })
        .collect()
}

/// Convert a linear color in [0, 1] to RGBA8.
pub fn color_to_rgba(color: Vec3) -> [u8; 4] {
    // Apply gamma correction and convert to 0-255
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Gamma 2 encoding.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}
