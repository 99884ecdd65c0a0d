// src/error.rs
// =============================================================================
// This module defines the error taxonomy for the whole pipeline.
//
// The split matters for recovery:
// - OutputExists is fatal before anything is written
// - Io during crawling/scaffolding is fatal for the run
// - MissingScope, Parse, and Image errors are isolated to one page or image
//   and reported in the summary while the rest of the site is still diffed
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the diff pipeline.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The output directory already exists. Nothing has been written.
    #[error("diff directory {0} already exists")]
    OutputExists(PathBuf),

    /// The scope selector string is not valid CSS.
    #[error("invalid CSS selector {0:?}")]
    InvalidSelector(String),

    /// The scope element was not found in a page being diffed.
    /// Fatal for that page only: there is no diffable region to work with.
    #[error("selector {selector:?} matched nothing in {path}")]
    MissingScope { selector: String, path: PathBuf },

    /// The document is too malformed to process (e.g. no html element).
    #[error("could not parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// An I/O failure, with the path that caused it.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image failed to decode or encode.
    #[error("image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl DiffError {
    /// Attach path context to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach path context to an image error
    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for a document
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Shorthand used throughout the library modules
pub type Result<T> = std::result::Result<T, DiffError>;
