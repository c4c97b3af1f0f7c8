//! Error types for the GL wrappers.

use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ShaderStage;
use crate::types::FilterMode;

/// Errors that can occur while creating or using GL resources.
///
/// Driver resource exhaustion (a refused buffer mapping) is not represented
/// here: it panics, since nothing in this layer can recover from it.
#[derive(Error, Debug)]
pub enum GlError {
    /// Failed to load the driver entry points.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// The driver refused to create an object.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A shader stage failed to compile.
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompilation { stage: ShaderStage, log: String },
    /// A shader program failed to link.
    #[error("shader program link failed: {log}")]
    ProgramLink { log: String },
    /// A shader source file could not be read.
    #[error("failed to load shader file \"{}\": {source}", path.display())]
    ShaderSourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The uniform was never registered with `add_uniform`.
    #[error("uniform \"{0}\" is not registered")]
    UnknownUniform(String),
    /// The uniform block was never registered with `add_uniform_buffer`.
    #[error("uniform block \"{0}\" is not registered")]
    UnknownUniformBlock(String),
    /// Strict lookup: the name is not an active uniform in the program.
    #[error("uniform \"{0}\" is not an active uniform in the program")]
    InactiveUniform(String),
    /// Strict lookup: the name is not an active uniform block in the program.
    #[error("uniform block \"{0}\" is not an active uniform block in the program")]
    InactiveUniformBlock(String),
    /// Every uniform-block binding slot of the context has been handed out.
    #[error("no uniform block binding slots left in the context")]
    UniformBlockBindingsExhausted,
    /// A filter slot was given `FilterMode::Disabled` where it is not allowed.
    #[error("{slot} filter cannot be {mode:?}")]
    InvalidFilterMode { slot: &'static str, mode: FilterMode },
    /// The format combination has no driver representation.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result alias used throughout the crate.
pub type GlResult<T> = Result<T, GlError>;
