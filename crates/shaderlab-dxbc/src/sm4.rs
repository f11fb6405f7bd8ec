//! Shader model 4/5 program chunks (`SHDR`/`SHEX`).

use thiserror::Error;

use crate::{DxbcError, DxbcFile, FourCC};

/// Program type encoded in the version token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
    Compute,
    Unknown(u16),
}

/// Shader model version from the version token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderModel {
    pub major: u8,
    pub minor: u8,
}

/// Errors raised while extracting the token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Sm4Error {
    #[error(transparent)]
    Dxbc(#[from] DxbcError),
    #[error("DXBC is missing SHDR/SHEX shader chunk")]
    MissingShaderChunk,
    #[error("shader bytecode length {len} is not a multiple of 4")]
    MisalignedTokens { len: usize },
    #[error("shader bytecode too short ({dwords} dwords)")]
    TooShort { dwords: usize },
    #[error("shader bytecode declares {declared} dwords but only {available} provided")]
    DeclaredLengthOutOfBounds { declared: usize, available: usize },
}

/// A shader program token stream with its decoded version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sm4Program {
    pub stage: ShaderStage,
    pub model: ShaderModel,
    /// Token stream including the version and length tokens, cut to the
    /// declared length.
    pub tokens: Vec<u32>,
}

impl Sm4Program {
    /// Extracts the program from a parsed container, preferring `SHEX`.
    pub fn parse_from_dxbc(dxbc: &DxbcFile<'_>) -> Result<Self, Sm4Error> {
        let chunk = dxbc
            .get_chunk(FourCC::SHEX)
            .or_else(|| dxbc.get_chunk(FourCC::SHDR))
            .ok_or(Sm4Error::MissingShaderChunk)?;
        Self::parse_program_tokens(chunk.data)
    }

    /// Decodes a raw `SHDR`/`SHEX` chunk payload.
    pub fn parse_program_tokens(bytes: &[u8]) -> Result<Self, Sm4Error> {
        if bytes.len() % 4 != 0 {
            return Err(Sm4Error::MisalignedTokens { len: bytes.len() });
        }
        let mut tokens: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if tokens.len() < 2 {
            return Err(Sm4Error::TooShort {
                dwords: tokens.len(),
            });
        }

        let declared = tokens[1] as usize;
        if declared < 2 || declared > tokens.len() {
            return Err(Sm4Error::DeclaredLengthOutOfBounds {
                declared,
                available: tokens.len(),
            });
        }
        tokens.truncate(declared);

        let (stage, model) = decode_version_token(tokens[0]);
        Ok(Self {
            stage,
            model,
            tokens,
        })
    }

    /// Tokens after the version and length header.
    pub fn body(&self) -> &[u32] {
        &self.tokens[2..]
    }
}

/// Splits a version token into program type and shader model.
///
/// Layout: minor in bits 0..=3, major in bits 4..=7, program type in bits
/// 16..=31.
pub fn decode_version_token(version: u32) -> (ShaderStage, ShaderModel) {
    let minor = (version & 0xF) as u8;
    let major = ((version >> 4) & 0xF) as u8;
    let stage = match (version >> 16) as u16 {
        0 => ShaderStage::Pixel,
        1 => ShaderStage::Vertex,
        2 => ShaderStage::Geometry,
        3 => ShaderStage::Hull,
        4 => ShaderStage::Domain,
        5 => ShaderStage::Compute,
        other => ShaderStage::Unknown(other),
    };
    (stage, ShaderModel { major, minor })
}
