use cornell_core::SceneError;
use thiserror::Error;

/// Errors surfaced by renderer setup and frame submission.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start command queue: {0}")]
    Io(#[from] std::io::Error),

    #[error("command queue is no longer running")]
    DeviceLost,

    #[error("no frame has been presented yet")]
    NoFrame,

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
