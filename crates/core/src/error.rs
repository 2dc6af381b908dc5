use crate::{ShapeKind, Uid, Universe};

/// Result alias that carries the custom [`MapError`] type.
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A caller asked for a specific uid that is already live.
    #[error("{universe} uid {uid} is already allocated")]
    UidConflict { universe: Universe, uid: Uid },
    #[error("no such paint: {0}")]
    UnknownPaint(Uid),
    #[error("no such mapping: {0}")]
    UnknownMapping(Uid),
    /// A mapping was requested without a paint to bind to.
    #[error("a mapping requires a paint")]
    NullPaint,
    #[error("{shape} expects {expected} vertices, got {found}")]
    VertexCount {
        shape: ShapeKind,
        expected: usize,
        found: usize,
    },
    #[error("mesh needs at least 2x2 vertices, got {columns}x{rows}")]
    InvalidMesh { columns: usize, rows: usize },
    /// Input and output shapes of a texture mapping do not correspond.
    #[error("input shape {input} does not match output shape {output}")]
    ShapeMismatch { output: ShapeKind, input: ShapeKind },
    /// The paint kind cannot back the requested mapping or operation.
    #[error("paint {0} is not a media texture")]
    NotMedia(Uid),
    #[error("paint {0} is not a texture")]
    NotTexture(Uid),
    #[error("vertex {index} out of range for a shape with {count} vertices")]
    VertexIndex { index: usize, count: usize },
    /// A reorder request was not a permutation of the live mapping uids.
    #[error("mapping order must be a permutation of the live mappings")]
    InvalidOrder,
    #[error("unknown remote address {0}")]
    UnknownAddress(String),
    #[error("bad arguments for {addr}: ,{typetags}")]
    BadArguments { addr: String, typetags: String },
    #[error("remote port {0} is out of range (1024..=65535)")]
    InvalidPort(u32),
    #[error("{0}")]
    InvalidInput(&'static str),
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0:?}")]
    Osc(rosc::OscError),
}

impl MapError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<rosc::OscError> for MapError {
    fn from(value: rosc::OscError) -> Self {
        Self::Osc(value)
    }
}

impl From<String> for MapError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
