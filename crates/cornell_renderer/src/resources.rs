//! Per-size frame resources and the passes that run over them.

use crate::kernels::{accumulate_kernel, composite_kernel, ray_kernel, shade_kernel, shadow_kernel};
use crate::surface::{Drawable, Frame};
use crate::texture::{RenderTarget, SeedTexture, TextureId};
use crate::uniforms::UniformRing;
use crate::{Intersection, IntersectionType, Intersector, Ray};
use cornell_core::Scene;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// Handles of the render-target pair.
pub const RENDER_TARGETS: [TextureId; 2] = [TextureId(0), TextureId(1)];

/// Handles of the accumulation-target pair.
pub const ACCUMULATION_TARGETS: [TextureId; 2] = [TextureId(2), TextureId(3)];

/// Everything sized by the image: ray, shadow-ray and intersection buffers,
/// the four float targets and the seed texture.
pub struct FrameResources {
    width: u32,
    height: u32,
    pub rays: Vec<Ray>,
    pub shadow_rays: Vec<Ray>,
    pub intersections: Vec<Intersection>,
    pub targets: [RenderTarget; 4],
    pub seeds: SeedTexture,
}

impl FrameResources {
    pub fn new<R: Rng>(width: u32, height: u32, rng: &mut R) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            width,
            height,
            rays: vec![Ray::inactive(); pixel_count],
            shadow_rays: vec![Ray::inactive(); pixel_count],
            intersections: vec![Intersection::MISS; pixel_count],
            targets: std::array::from_fn(|_| RenderTarget::new(width, height)),
            seeds: SeedTexture::random(width, height, rng),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.rays.len()
    }

    pub fn target(&self, id: TextureId) -> &RenderTarget {
        &self.targets[id.0]
    }
}

/// Which ray buffer an intersection pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayBuffer {
    Primary,
    Shadow,
}

/// One recorded unit of queue work. `uniforms` fields are ring slots.
pub enum FramePass {
    GenerateRays {
        uniforms: usize,
        target: TextureId,
    },
    Intersect {
        rays: RayBuffer,
        kind: IntersectionType,
    },
    Shade {
        uniforms: usize,
        bounce: u32,
        target: TextureId,
    },
    Shadow {
        source: TextureId,
        target: TextureId,
    },
    Accumulate {
        uniforms: usize,
        render: TextureId,
        previous: TextureId,
        target: TextureId,
    },
    Present {
        source: TextureId,
        drawable: Box<dyn Drawable>,
        frame_index: u32,
    },
}

impl FramePass {
    pub fn name(&self) -> &'static str {
        match self {
            FramePass::GenerateRays { .. } => "generate rays",
            FramePass::Intersect { .. } => "intersect",
            FramePass::Shade { .. } => "shade",
            FramePass::Shadow { .. } => "shadow",
            FramePass::Accumulate { .. } => "accumulate",
            FramePass::Present { .. } => "present",
        }
    }
}

/// Executes passes on the queue thread against shared frame state.
pub struct FrameExecutor {
    pub scene: Arc<Scene>,
    pub intersector: Arc<dyn Intersector>,
    pub uniforms: Arc<UniformRing>,
    pub resources: Arc<Mutex<FrameResources>>,
}

impl FrameExecutor {
    pub fn execute(&self, pass: FramePass) {
        log::trace!("Pass: {}", pass.name());

        let mut guard = self.resources.lock();
        let FrameResources {
            width,
            height,
            rays,
            shadow_rays,
            intersections,
            targets,
            seeds,
        } = &mut *guard;

        match pass {
            FramePass::GenerateRays { uniforms, target } => {
                let uniforms = self.uniforms.read(uniforms);
                ray_kernel(&uniforms, seeds, rays, &mut targets[target.0]);
            }
            FramePass::Intersect { rays: buffer, kind } => {
                let rays = match buffer {
                    RayBuffer::Primary => &*rays,
                    RayBuffer::Shadow => &*shadow_rays,
                };
                self.intersector.intersect(rays, kind, intersections);
            }
            FramePass::Shade {
                uniforms,
                bounce,
                target,
            } => {
                let uniforms = self.uniforms.read(uniforms);
                shade_kernel(
                    &uniforms,
                    bounce,
                    &self.scene,
                    seeds,
                    intersections,
                    rays,
                    shadow_rays,
                    &mut targets[target.0],
                );
            }
            FramePass::Shadow { source, target } => {
                let mut output = std::mem::take(&mut targets[target.0]);
                shadow_kernel(shadow_rays, intersections, &targets[source.0], &mut output);
                targets[target.0] = output;
            }
            FramePass::Accumulate {
                uniforms,
                render,
                previous,
                target,
            } => {
                let uniforms = self.uniforms.read(uniforms);
                let mut output = std::mem::take(&mut targets[target.0]);
                accumulate_kernel(&uniforms, &targets[render.0], &targets[previous.0], &mut output);
                targets[target.0] = output;
            }
            FramePass::Present {
                source,
                drawable,
                frame_index,
            } => {
                let frame = Frame {
                    width: *width,
                    height: *height,
                    pixels: composite_kernel(&targets[source.0]),
                    frame_index,
                };
                // The drawable may block; don't hold the resources meanwhile
                drop(guard);
                drawable.present(frame);
            }
        }
    }
}
