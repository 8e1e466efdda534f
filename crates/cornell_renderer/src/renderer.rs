//! Frame orchestration.
//!
//! Each call to [`Renderer::draw`]:
//! - waits for a free in-flight slot and writes this frame's uniforms
//! - records ray generation, the bounce loop, accumulation and present
//!   into one command buffer
//! - commits it to the queue thread, which frees the slot on completion

use crate::bvh::TriangleBvh;
use crate::config::RenderConfig;
use crate::queue::{CommandBuffer, CommandQueue, InFlightSemaphore};
use crate::resources::{FrameExecutor, FramePass, FrameResources, RayBuffer, ACCUMULATION_TARGETS, RENDER_TARGETS};
use crate::surface::Surface;
use crate::texture::{PingPong, TextureId};
use crate::uniforms::{UniformRing, Uniforms};
use crate::{IntersectionType, Intersector, RenderError, Result};
use cornell_core::Scene;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// What one `draw` call submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frames accumulated before this one
    pub frame_index: u32,
    /// Uniform ring slot the frame reads
    pub uniform_slot: usize,
    /// Whether a drawable was available
    pub presented: bool,
}

/// Progressive ray tracer for a fixed scene.
pub struct Renderer {
    config: RenderConfig,
    scene: Arc<Scene>,
    uniforms: Arc<UniformRing>,
    resources: Arc<Mutex<FrameResources>>,
    semaphore: Arc<InFlightSemaphore>,
    render_targets: PingPong<TextureId>,
    accumulation_targets: PingPong<TextureId>,
    rng: StdRng,
    width: u32,
    height: u32,
    frame_index: u32,
    queue: CommandQueue<FramePass>,
}

impl Renderer {
    /// Build the acceleration structure and all frame resources.
    pub fn new(scene: Scene, config: RenderConfig, width: u32, height: u32) -> Result<Self> {
        scene.validate()?;
        let bvh = TriangleBvh::build(&scene.vertices, &scene.masks)?;
        log::info!(
            "Built acceleration structure: {} triangles, {} BVH nodes",
            scene.triangle_count(),
            bvh.node_count()
        );
        Self::with_intersector(scene, Arc::new(bvh), config, width, height)
    }

    /// Like [`Renderer::new`] with a caller-supplied intersector.
    pub fn with_intersector(
        scene: Scene,
        intersector: Arc<dyn Intersector>,
        config: RenderConfig,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        scene.validate()?;
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        if intersector.triangle_count() != scene.triangle_count() {
            return Err(RenderError::Config(format!(
                "intersector has {} triangles, scene has {}",
                intersector.triangle_count(),
                scene.triangle_count()
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let scene = Arc::new(scene);
        let uniforms = Arc::new(UniformRing::new(config.frames_in_flight));
        let resources = Arc::new(Mutex::new(FrameResources::new(width, height, &mut rng)));
        let semaphore = Arc::new(InFlightSemaphore::new(config.frames_in_flight));

        let executor = FrameExecutor {
            scene: scene.clone(),
            intersector,
            uniforms: uniforms.clone(),
            resources: resources.clone(),
        };
        let lost = semaphore.clone();
        let queue = CommandQueue::new(
            "cornell-queue",
            move |pass| executor.execute(pass),
            move || {
                log::error!("Command queue lost");
                lost.close();
            },
        )?;

        log::info!(
            "Renderer ready: {}x{}, {} frames in flight, {} bounces",
            width,
            height,
            config.frames_in_flight,
            config.bounces
        );

        Ok(Self {
            config,
            scene,
            uniforms,
            resources,
            semaphore,
            render_targets: PingPong::new(RENDER_TARGETS[0], RENDER_TARGETS[1]),
            accumulation_targets: PingPong::new(ACCUMULATION_TARGETS[0], ACCUMULATION_TARGETS[1]),
            rng,
            width,
            height,
            frame_index: 0,
            queue,
        })
    }

    /// Record and submit one frame. Blocks while the in-flight ring is full.
    pub fn draw(&mut self, surface: &dyn Surface) -> Result<FrameInfo> {
        if !self.semaphore.acquire() {
            return Err(RenderError::DeviceLost);
        }

        let frame_index = self.frame_index;
        let uniform_slot = self
            .uniforms
            .write(Uniforms::new(&self.config, self.width, self.height, frame_index));
        self.frame_index = self.frame_index.saturating_add(1);

        let mut buffer = CommandBuffer::new(format!("frame {frame_index}"));
        let semaphore = self.semaphore.clone();
        buffer.add_completed_handler(move || semaphore.release());

        buffer.encode(FramePass::GenerateRays {
            uniforms: uniform_slot,
            target: self.render_targets.front(),
        });

        for bounce in 0..self.config.bounces {
            buffer.encode(FramePass::Intersect {
                rays: RayBuffer::Primary,
                kind: IntersectionType::Nearest,
            });
            buffer.encode(FramePass::Shade {
                uniforms: uniform_slot,
                bounce,
                target: self.render_targets.front(),
            });
            buffer.encode(FramePass::Intersect {
                rays: RayBuffer::Shadow,
                kind: IntersectionType::Any,
            });
            buffer.encode(FramePass::Shadow {
                source: self.render_targets.front(),
                target: self.render_targets.back(),
            });
            self.render_targets.swap();
        }

        buffer.encode(FramePass::Accumulate {
            uniforms: uniform_slot,
            render: self.render_targets.front(),
            previous: self.accumulation_targets.front(),
            target: self.accumulation_targets.back(),
        });
        self.accumulation_targets.swap();

        let presented = match surface.next_drawable() {
            Some(drawable) => {
                buffer.encode(FramePass::Present {
                    source: self.accumulation_targets.front(),
                    drawable,
                    frame_index,
                });
                true
            }
            None => {
                log::debug!("No drawable for frame {}, skipping present", frame_index);
                false
            }
        };

        self.queue.commit(buffer)?;
        log::debug!("Submitted frame {} (uniform slot {})", frame_index, uniform_slot);

        Ok(FrameInfo {
            frame_index,
            uniform_slot,
            presented,
        })
    }

    /// Reallocate per-pixel resources for a new size and restart
    /// accumulation. A zero dimension is ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }

        self.wait_until_idle()?;
        *self.resources.lock() = FrameResources::new(width, height, &mut self.rng);
        self.width = width;
        self.height = height;
        self.frame_index = 0;

        log::info!("Resized to {}x{}", width, height);
        Ok(())
    }

    /// Block until every submitted frame has completed.
    pub fn wait_until_idle(&self) -> Result<()> {
        if self.semaphore.wait_idle() {
            Ok(())
        } else {
            Err(RenderError::DeviceLost)
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frames accumulated since the last reset.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Uniform ring slot the next frame writes.
    pub fn uniform_index(&self) -> usize {
        self.uniforms.current_index()
    }

    /// Frames submitted but not yet completed.
    pub fn frames_in_flight(&self) -> usize {
        self.semaphore.capacity() - self.semaphore.available()
    }

    pub fn render_targets(&self) -> PingPong<TextureId> {
        self.render_targets
    }

    pub fn accumulation_targets(&self) -> PingPong<TextureId> {
        self.accumulation_targets
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::FrameSurface;

    fn small_renderer() -> Renderer {
        let config = RenderConfig::default().with_seed(42);
        Renderer::new(Scene::cornell_box(), config, 16, 12).unwrap()
    }

    #[test]
    fn test_rejects_bad_setup() {
        let config = RenderConfig::default();
        assert!(matches!(
            Renderer::new(Scene::cornell_box(), config.clone(), 0, 10),
            Err(RenderError::InvalidSize { .. })
        ));
        assert!(matches!(
            Renderer::new(Scene::new(), config.clone(), 10, 10),
            Err(RenderError::Scene(_))
        ));
        assert!(matches!(
            Renderer::new(Scene::cornell_box(), config.with_bounces(0), 10, 10),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_intersector() {
        let scene = Scene::cornell_box();
        let bvh = TriangleBvh::build(&scene.vertices[..105], &scene.masks[..35]).unwrap();
        assert!(matches!(
            Renderer::with_intersector(scene, Arc::new(bvh), RenderConfig::default(), 10, 10),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn test_render_targets_swap_per_bounce() {
        let mut renderer = small_renderer();
        let surface = FrameSurface::new();
        let start = renderer.render_targets().front();

        renderer.draw(&surface).unwrap();

        // Three bounces is an odd number of swaps
        assert_ne!(renderer.render_targets().front(), start);
        renderer.wait_until_idle().unwrap();
    }

    #[test]
    fn test_resize_resets_accumulation() {
        let mut renderer = small_renderer();
        let surface = FrameSurface::new();

        for _ in 0..2 {
            renderer.draw(&surface).unwrap();
        }
        assert_eq!(renderer.frame_index(), 2);

        renderer.resize(8, 4).unwrap();
        assert_eq!(renderer.size(), (8, 4));
        assert_eq!(renderer.frame_index(), 0);
        assert_eq!(renderer.frames_in_flight(), 0);

        let info = renderer.draw(&surface).unwrap();
        assert_eq!(info.frame_index, 0);
        renderer.wait_until_idle().unwrap();
        assert_eq!(surface.with_latest(|f| (f.width, f.height)), Some((8, 4)));
    }

    #[test]
    fn test_zero_resize_is_ignored() {
        let mut renderer = small_renderer();
        renderer.resize(0, 100).unwrap();
        assert_eq!(renderer.size(), (16, 12));
    }
}
