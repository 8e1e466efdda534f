//! Cornell Renderer - progressive ray-traced frame pipeline.
//!
//! Renders the Cornell box scene one frame at a time, averaging frames
//! into an accumulation target until the camera or image size changes.
//!
//! Per frame, on a dedicated queue thread:
//! - primary ray generation with Halton-jittered pixels
//! - a fixed number of bounces, each with nearest-hit intersection,
//!   shading, and an any-hit shadow pass towards the area light
//! - accumulation with previous frames
//! - Reinhard tone mapping into a presentation surface
//!
//! At most `frames_in_flight` frames are outstanding at once.
//!
//! # Example
//!
//! ```no_run
//! use cornell_core::Scene;
//! use cornell_renderer::{FrameSurface, RenderConfig, Renderer};
//!
//! let mut renderer = Renderer::new(Scene::cornell_box(), RenderConfig::default(), 256, 256)?;
//! let surface = FrameSurface::new();
//! for _ in 0..16 {
//!     renderer.draw(&surface)?;
//! }
//! renderer.wait_until_idle()?;
//! surface.save_png("cornell.png")?;
//! # Ok::<(), cornell_renderer::RenderError>(())
//! ```

mod bvh;
mod config;
mod error;
mod intersector;
mod ray;
mod renderer;
mod triangle;

pub mod kernels;
pub mod queue;
pub mod resources;
pub mod sampling;
pub mod surface;
pub mod texture;
pub mod uniforms;

pub use bvh::TriangleBvh;
pub use config::{CameraConfig, LightConfig, RenderConfig, DEFAULT_BOUNCES, MAX_FRAMES_IN_FLIGHT};
pub use error::{RenderError, Result};
pub use intersector::{IntersectionType, Intersector};
pub use ray::{
    Intersection, Ray, INTERSECTION_STRIDE, RAY_MASK_PRIMARY, RAY_MASK_SECONDARY, RAY_MASK_SHADOW,
    RAY_STRIDE,
};
pub use renderer::{FrameInfo, Renderer};
pub use resources::{ACCUMULATION_TARGETS, RENDER_TARGETS};
pub use surface::{Drawable, Frame, FrameSurface, Surface};
pub use texture::{PingPong, RenderTarget, SeedTexture, TextureId};
pub use triangle::{Triangle, TriangleHit};
pub use uniforms::{AreaLight, CameraUniforms, Uniforms, ALIGNED_UNIFORMS_SIZE};
