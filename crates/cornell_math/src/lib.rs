// Re-export glam for convenience
pub use glam::*;

mod aabb;
pub mod transform;

pub use aabb::Aabb;
pub use transform::{
    perspective, radians_from_degrees, rotation, scale, transform_position, translation,
    triangle_normal,
};
