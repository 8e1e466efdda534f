//! Fixed camera, light and pipeline settings.

use crate::sampling::PRIMES;
use crate::{RenderError, Result};
use cornell_math::Vec3;

/// Number of frames whose device work may be outstanding at once.
pub const MAX_FRAMES_IN_FLIGHT: usize = 3;

/// Bounces per frame.
pub const DEFAULT_BOUNCES: u32 = 3;

/// Pinhole camera basis. `right` and `up` are unit vectors here and get
/// scaled by the image-plane half extents when uniforms are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 3.38),
            forward: Vec3::new(0.0, 0.0, -1.0),
            right: Vec3::X,
            up: Vec3::Y,
        }
    }
}

/// Rectangular area light. `right` and `up` are half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightConfig {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub color: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.98, 0.0),
            forward: Vec3::new(0.0, -1.0, 0.0),
            right: Vec3::new(0.25, 0.0, 0.0),
            up: Vec3::new(0.0, 0.0, 0.25),
            color: Vec3::splat(4.0),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Capacity of the in-flight semaphore and of the uniform ring
    pub frames_in_flight: usize,
    /// Intersect/shade/shadow iterations per frame
    pub bounces: u32,
    /// Vertical field of view in degrees
    pub vertical_fov: f32,
    pub camera: CameraConfig,
    pub light: LightConfig,
    /// Seed for the per-pixel random texture; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            bounces: DEFAULT_BOUNCES,
            vertical_fov: 45.0,
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            seed: None,
        }
    }
}

impl RenderConfig {
    pub fn with_frames_in_flight(mut self, frames: usize) -> Self {
        self.frames_in_flight = frames;
        self
    }

    pub fn with_bounces(mut self, bounces: u32) -> Self {
        self.bounces = bounces;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_vertical_fov(mut self, degrees: f32) -> Self {
        self.vertical_fov = degrees;
        self
    }

    /// Largest bounce count whose Halton dimensions fit the prime table.
    pub fn max_bounces() -> u32 {
        // Bounce b reads dimensions 2 + 4b .. 2 + 4b + 3
        (PRIMES.len() as u32 - 6) / 4 + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(RenderError::Config("frames_in_flight must be at least 1".into()));
        }
        if self.bounces == 0 || self.bounces > Self::max_bounces() {
            return Err(RenderError::Config(format!(
                "bounces must be in 1..={}, got {}",
                Self::max_bounces(),
                self.bounces
            )));
        }
        if !(self.vertical_fov > 0.0 && self.vertical_fov < 180.0) {
            return Err(RenderError::Config(format!(
                "vertical_fov must be in (0, 180) degrees, got {}",
                self.vertical_fov
            )));
        }
        Ok(())
    }
}
