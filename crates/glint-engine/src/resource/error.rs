use std::path::PathBuf;

use thiserror::Error;

use super::ResourceKind;

/// Failure of a single load. The manager caches an empty placeholder.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),

    #[error("image {width}x{height} has {actual} bytes of RGBA data, expected {expected}")]
    UnsupportedStride {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("texture {width}x{height} is outside the device range 1..={max}")]
    TextureSize { width: u32, height: u32, max: u32 },

    #[error("{stage} shader failed to parse:\n{message}")]
    ShaderParse { stage: &'static str, message: String },

    #[error("{stage} shader failed validation: {message}")]
    ShaderValidation { stage: &'static str, message: String },

    #[error("no embedded shader named '{0}'")]
    UnknownEmbeddedShader(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("loader cannot handle {0} parameters")]
    UnsupportedParams(String),
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no resource loader registered for {kind} '{uri}' ({params})")]
    NoLoader {
        kind: ResourceKind,
        uri: String,
        params: String,
    },
}
