use thiserror::Error;

/// Errors reported when a scene's parallel arrays disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene has no triangles")]
    Empty,

    #[error("vertex count {0} is not a multiple of 3")]
    PartialTriangle(usize),

    #[error("attribute `{name}` has {len} entries, expected {expected}")]
    AttributeLength {
        name: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("triangle {index} has unknown mask value {value}")]
    UnknownMask { index: usize, value: u32 },
}

pub type SceneResult<T> = Result<T, SceneError>;
