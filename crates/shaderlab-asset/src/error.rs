use shaderlab_hlsl::DecompileError;
use thiserror::Error;

use crate::platform::ShaderCompilerPlatform;

pub type Result<T> = std::result::Result<T, ShaderError>;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("unexpected end of data: needed {expected} bytes, {actual} available")]
    Truncated { expected: usize, actual: usize },

    #[error("decompressed size mismatch: wrote {actual} bytes but expected {expected} bytes")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("lz4 decompression failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),

    #[error("unsupported parameter type {0}")]
    UnsupportedParameterType(i32),

    #[error("unsupported platform {0:?}")]
    UnsupportedPlatform(ShaderCompilerPlatform),

    #[error("unsupported property type {0}")]
    UnsupportedPropertyType(i32),

    #[error("no decoded sub-program at blob index {0}")]
    MissingSubProgram(usize),

    #[error("bytecode header offset {offset} is past the end of {len} bytes")]
    HeaderOutOfRange { offset: usize, len: usize },

    #[error("invalid program index {0:?}")]
    InvalidProgramIndex(String),

    #[error("decompilation failed: {0}")]
    Decompile(#[from] DecompileError),
}
