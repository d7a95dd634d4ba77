//! Error types for the poster core.
//!
//! Most operations in this crate degrade quietly by design (sanitization
//! never fails, parsing is permissive, identifier misses are no-ops).
//! Errors are reserved for the file-system boundary: importing a document
//! from disk, loading an image payload, writing an export.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the poster crates.
pub type PosterResult<T> = Result<T, PosterError>;

#[derive(Debug, Error)]
pub enum PosterError {
    /// Reading an import or image file failed. The pending state
    /// transition is abandoned; the session is unchanged.
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing an exported document failed.
    #[error("failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image payload had an extension we can't map to a MIME type.
    #[error("unsupported image extension: {0:?}")]
    UnsupportedImage(String),
}
