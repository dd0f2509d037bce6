//! Error types for the I/O edges of the crate.
//!
//! Generation itself is total and never fails; errors only arise when reading
//! configuration, loading sprite assets, or handing frames to a sink.

use std::path::PathBuf;

/// Errors from loading configuration or catalog files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// More definitions than a [`crate::catalog::SpriteId`] can address.
    #[error("catalog has {0} sprite definitions, at most 65536 are supported")]
    TooManySprites(usize),
}

/// Errors from supplying a sprite's source raster.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The image file does not exist.
    #[error("sprite image not found: {0}")]
    Missing(PathBuf),

    /// The file exists but could not be decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The definition asks for a zero-sized glyph block.
    #[error("sprite '{0}' has an empty glyph size")]
    EmptyDefinition(String),
}

/// Errors from emitting a frame.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink is not connected; the frame should be skipped, not retried.
    #[error("frame sink unavailable: {0}")]
    Unavailable(String),

    #[error("frame sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("http frame sink failed: {0}")]
    Http(#[from] reqwest::Error),
}
