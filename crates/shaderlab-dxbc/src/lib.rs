//! A bounds-checked parser for DirectX shader bytecode containers (`DXBC`).
//!
//! Besides the container itself this crate reads the `ISGN`/`OSGN` signature
//! chunks and extracts the SM4/SM5 token program, which is everything the
//! HLSL decompiler consumes.

#![forbid(unsafe_code)]

mod dxbc;
mod error;
mod fourcc;
mod parser;
/// Parsers for DXBC signature chunks.
pub mod signature;
/// Shader model 4/5 program chunks.
pub mod sm4;

/// Helpers for building synthetic DXBC blobs in tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::dxbc::{DxbcChunk, DxbcFile, DxbcHeader};
pub use crate::error::DxbcError;
pub use crate::fourcc::FourCC;
pub use crate::parser::{BytecodeParser, CompiledShader, DxbcBytecodeParser};
pub use crate::signature::{parse_signature_chunk, SignatureChunk, SignatureEntry};
pub use crate::sm4::{decode_version_token, ShaderModel, ShaderStage, Sm4Error, Sm4Program};
