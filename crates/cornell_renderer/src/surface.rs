//! Presentation surfaces.
//!
//! Each frame the renderer asks its surface for a drawable. If one is
//! available the frame's final pass composites into it on the queue thread.

use crate::{RenderError, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// A composited RGBA8 frame, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
    /// Frames accumulated before this one since the last reset
    pub frame_index: u32,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, self.as_bytes().to_vec())
    }
}

/// Destination for one frame's composite pass.
pub trait Drawable: Send {
    fn present(self: Box<Self>, frame: Frame);
}

/// Source of drawables, queried once per frame on the host thread.
pub trait Surface {
    /// `None` skips presentation for this frame.
    fn next_drawable(&self) -> Option<Box<dyn Drawable>>;
}

#[derive(Default)]
struct SurfaceState {
    latest: Option<Frame>,
    presented: u64,
}

/// In-memory surface keeping the most recently presented frame.
///
/// Cloning shares the same backing state, so a viewer can hand the renderer
/// one handle and read frames through another.
#[derive(Clone, Default)]
pub struct FrameSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl FrameSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_frame(&self) -> Option<Frame> {
        self.state.lock().latest.clone()
    }

    /// Borrow the latest frame without copying it.
    pub fn with_latest<R>(&self, f: impl FnOnce(&Frame) -> R) -> Option<R> {
        self.state.lock().latest.as_ref().map(f)
    }

    /// Number of frames presented so far.
    pub fn presented_count(&self) -> u64 {
        self.state.lock().presented
    }

    /// Save the latest frame as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = self.state.lock();
        let frame = state.latest.as_ref().ok_or(RenderError::NoFrame)?;
        image::save_buffer(
            path.as_ref(),
            frame.as_bytes(),
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
        )?;
        Ok(())
    }
}

impl Surface for FrameSurface {
    fn next_drawable(&self) -> Option<Box<dyn Drawable>> {
        Some(Box::new(FrameDrawable {
            state: self.state.clone(),
        }))
    }
}

struct FrameDrawable {
    state: Arc<Mutex<SurfaceState>>,
}

impl Drawable for FrameDrawable {
    fn present(self: Box<Self>, frame: Frame) {
        let mut state = self.state.lock();
        state.latest = Some(frame);
        state.presented += 1;
    }
}
