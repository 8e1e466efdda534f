//! Cornell Core - procedural scene geometry for the Cornell box renderer.
//!
//! This crate provides:
//!
//! - **Face selection**: `FaceMask` and `CubeFace` for picking unit-cube faces
//! - **Scene buffers**: `Scene`, four parallel arrays ready for upload
//!
//! # Example
//!
//! ```
//! use cornell_core::Scene;
//!
//! let scene = Scene::cornell_box();
//! assert_eq!(scene.triangle_count(), 36);
//! assert!(scene.validate().is_ok());
//! ```

pub mod error;
pub mod face_mask;
pub mod scene;

// Re-export commonly used types
pub use error::SceneError;
pub use face_mask::{CubeFace, FaceMask};
pub use scene::{Color, Scene, TriangleMask};
