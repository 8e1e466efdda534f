//! Per-frame uniform records and the ring of slots they are written into.

use crate::config::RenderConfig;
use bytemuck::{Pod, Zeroable};
use cornell_math::{radians_from_degrees, Vec3};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Camera basis. `right` and `up` are pre-scaled by the image-plane half
/// extents so that `u * right + v * up + forward` spans the view for
/// `u, v` in `[-1, 1]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub position: Vec3,
    _pad0: f32,
    pub forward: Vec3,
    _pad1: f32,
    pub right: Vec3,
    _pad2: f32,
    pub up: Vec3,
    _pad3: f32,
}

impl CameraUniforms {
    pub fn new(position: Vec3, forward: Vec3, right: Vec3, up: Vec3) -> Self {
        Self {
            position,
            forward,
            right,
            up,
            ..Self::zeroed()
        }
    }
}

/// Rectangular area light; `right` and `up` are half extents.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AreaLight {
    pub position: Vec3,
    _pad0: f32,
    pub forward: Vec3,
    _pad1: f32,
    pub right: Vec3,
    _pad2: f32,
    pub up: Vec3,
    _pad3: f32,
    pub color: Vec3,
    _pad4: f32,
}

impl AreaLight {
    pub fn new(position: Vec3, forward: Vec3, right: Vec3, up: Vec3, color: Vec3) -> Self {
        Self {
            position,
            forward,
            right,
            up,
            color,
            ..Self::zeroed()
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub camera: CameraUniforms,
    pub light: AreaLight,
    pub width: u32,
    pub height: u32,
    /// Frames accumulated since the last reset
    pub frame_index: u32,
    _pad: u32,
}

/// Size of one ring slot: the record rounded up to 256 bytes.
pub const ALIGNED_UNIFORMS_SIZE: usize = (std::mem::size_of::<Uniforms>() + 0xFF) & !0xFF;

impl Uniforms {
    /// Fill a record from the fixed camera and light for a `width x height`
    /// image.
    pub fn new(config: &RenderConfig, width: u32, height: u32, frame_index: u32) -> Self {
        let camera = &config.camera;
        let light = &config.light;

        let field_of_view = radians_from_degrees(config.vertical_fov);
        let aspect_ratio = width as f32 / height.max(1) as f32;
        let image_plane_height = (field_of_view / 2.0).tan();
        let image_plane_width = aspect_ratio * image_plane_height;

        Self {
            camera: CameraUniforms::new(
                camera.position,
                camera.forward,
                camera.right * image_plane_width,
                camera.up * image_plane_height,
            ),
            light: AreaLight::new(light.position, light.forward, light.right, light.up, light.color),
            width,
            height,
            frame_index,
            _pad: 0,
        }
    }
}

/// Fixed ring of uniform slots, one per frame in flight.
///
/// The host writes slot `i` for frame N while frames N-1 and N-2 may still
/// be reading their own slots on the queue thread. The in-flight semaphore
/// guarantees a slot is not rewritten before the frame reading it finished.
pub struct UniformRing {
    slots: Box<[Mutex<Uniforms>]>,
    next: AtomicUsize,
}

impl UniformRing {
    pub fn new(len: usize) -> Self {
        let slots = (0..len.max(1)).map(|_| Mutex::new(Uniforms::zeroed())).collect();
        Self {
            slots,
            next: AtomicUsize::new(0),
        }
    }

    /// Write into the current slot and advance. Returns the written slot.
    pub fn write(&self, uniforms: Uniforms) -> usize {
        let slot = self.next.load(Ordering::Acquire);
        *self.slots[slot].lock() = uniforms;
        self.next.store((slot + 1) % self.slots.len(), Ordering::Release);
        slot
    }

    pub fn read(&self, slot: usize) -> Uniforms {
        *self.slots[slot].lock()
    }

    /// Slot the next `write` goes to.
    pub fn current_index(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Size of the whole ring as the device sees it.
    pub fn byte_len(&self) -> usize {
        ALIGNED_UNIFORMS_SIZE * self.slots.len()
    }
}
