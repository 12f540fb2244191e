/// Error type shared by the mesh loader, the TGA codec and the renderer
use thiserror::Error;

/// Which index group of a face an out-of-range index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Vertex,
    Texture,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Vertex => f.write_str("vertex"),
            IndexKind::Texture => f.write_str("texture"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("line {line}: longer than the {max}-byte line buffer")]
    LineOverrun { line: usize, max: usize },

    #[error("I/O error: {0}")]
    File(#[from] std::io::Error),

    #[error("unsupported image: {0}")]
    Unsupported(String),

    #[error("missing TRUEVISION-XFILE footer signature")]
    BadSignature,

    #[error("run-length packet of {packet} pixels after {decoded} overruns an image of {total} pixels")]
    RunLengthOverrun {
        decoded: usize,
        packet: usize,
        total: usize,
    },

    #[error("big-endian hosts are not supported")]
    BigEndianHost,

    #[error("face {face} references {kind} index {index}, but only {len} exist")]
    IndexOutOfRange {
        face: usize,
        kind: IndexKind,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
