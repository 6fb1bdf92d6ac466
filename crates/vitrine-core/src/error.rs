//! Error types for content block construction.
//!
//! These never escape the renderer: a block that fails to build is logged
//! and omitted from the output.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a raw block could not become a [`crate::ContentBlock`].
#[derive(Error, Debug)]
pub enum Error {
    /// The element is not a `{type, data}` object.
    #[error("malformed block: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The `type` tag names no known block kind.
    #[error("unknown block type '{0}'")]
    UnknownType(String),

    /// A required field is absent, empty, or not a safe URL.
    #[error("{block} block is missing required field '{field}'")]
    MissingField {
        /// The block kind tag (e.g. `button`).
        block: &'static str,
        /// The missing field name as it appears in the block data.
        field: &'static str,
    },

    /// A video URL matched none of the known platform patterns.
    #[error("unrecognized video URL: {0}")]
    UnrecognizedVideoUrl(String),
}
