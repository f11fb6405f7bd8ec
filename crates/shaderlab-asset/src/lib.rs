//! Reconstructs ShaderLab text from compiled shader assets.
//!
//! The crate decodes the per-platform sub-program containers stored with a
//! shader ([`ShaderProgram`], [`ShaderSubProgram`]), picks the variant each
//! platform runs ([`select_sub_programs`]) and serializes the parsed shader
//! structure ([`ShaderWriter`]). DX11 vertex and pixel programs are
//! decompiled to HLSL through `shaderlab-hlsl`. [`convert_shader`] ties the
//! steps together.

#![forbid(unsafe_code)]

pub mod asset;
mod container;
mod convert;
mod decompress;
mod error;
mod export;
pub mod keywords;
mod options;
pub mod params;
pub mod platform;
mod reader;
mod selector;
mod subprogram;
mod version;
mod writer;

pub use crate::container::{ShaderProgram, SubProgramEntry};
pub use crate::convert::{convert_shader, convert_shader_with};
pub use crate::decompress::{
    decode_legacy_blob, decode_segmented, decompressor_for, BlockDecompressor,
    Lz4BlockDecompressor, UncompressedCopy,
};
pub use crate::error::{Result, ShaderError};
pub use crate::export::dxbc_offset;
pub use crate::options::{DecodeOptions, HlslOptions};
pub use crate::platform::{ShaderCompilerPlatform, ShaderGpuProgramType};
pub use crate::reader::{ByteCursor, ByteSource};
pub use crate::selector::{select_sub_programs, SubProgramSection};
pub use crate::subprogram::{
    ShaderSubProgram, EXTRA_HEADER_WORD_VERSION, LOCAL_KEYWORDS_END, LOCAL_KEYWORDS_START,
    VERSION_CLAMP,
};
pub use crate::version::EngineVersion;
pub use crate::writer::{format_float, write_property, write_render_state, ShaderWriter, HEADER};
