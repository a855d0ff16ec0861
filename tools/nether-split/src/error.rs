//! Error type for buffer splitting

use std::path::PathBuf;

/// Errors raised while packing and materializing buffer chunks.
///
/// Every variant is fatal for the whole run. The document is only rewritten
/// after all buffers succeed, so any of these leaves it unmodified.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("Buffer {buffer} has no uri (embedded buffers cannot be split)")]
    MissingSource { buffer: usize },

    #[error(
        "Size limit ({limit}) is less than the size of bufferView {view} ({size}) in buffer {buffer}"
    )]
    LimitTooSmall {
        buffer: usize,
        view: usize,
        limit: u64,
        size: u64,
    },

    #[error("BufferView {view} references buffer {buffer}, which does not exist")]
    DanglingView { view: usize, buffer: usize },

    #[error(
        "BufferView {view} range [{offset}, {offset}+{length}) lies outside buffer {buffer} (byteLength {buffer_length})"
    )]
    ViewOutOfBounds {
        view: usize,
        buffer: usize,
        offset: u64,
        length: u64,
        buffer_length: u64,
    },

    #[error("Document is missing required '{0}' array")]
    MissingKey(&'static str),

    #[error("Invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SplitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
