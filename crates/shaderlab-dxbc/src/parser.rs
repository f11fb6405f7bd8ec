use tracing::debug;

use crate::signature::SignatureEntry;
use crate::sm4::Sm4Program;
use crate::{DxbcError, DxbcFile, FourCC, Sm4Error};

/// Everything the decompiler needs from one compiled shader container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShader {
    /// `ISGN` entries in chunk order.
    pub input_signature: Vec<SignatureEntry>,
    /// `OSGN` entries in chunk order.
    pub output_signature: Vec<SignatureEntry>,
    /// The `SHDR`/`SHEX` token program.
    pub program: Sm4Program,
}

/// Turns compiled shader bytes into signatures plus an instruction stream.
pub trait BytecodeParser {
    fn parse(&self, bytes: &[u8]) -> Result<CompiledShader, DxbcError>;
}

/// [`BytecodeParser`] for `DXBC` containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DxbcBytecodeParser;

impl BytecodeParser for DxbcBytecodeParser {
    fn parse(&self, bytes: &[u8]) -> Result<CompiledShader, DxbcError> {
        let file = DxbcFile::parse(bytes)?;
        debug!(summary = %file.debug_summary(), "parsed DXBC container");

        // A stage with no inputs or outputs may omit the chunk entirely.
        let input_signature = match file.get_signature(FourCC::ISGN) {
            Some(sig) => sig?.entries,
            None => Vec::new(),
        };
        let output_signature = match file.get_signature(FourCC::OSGN) {
            Some(sig) => sig?.entries,
            None => Vec::new(),
        };

        let program = Sm4Program::parse_from_dxbc(&file).map_err(|e| match e {
            Sm4Error::Dxbc(inner) => inner,
            Sm4Error::MissingShaderChunk => DxbcError::MissingChunk("SHDR/SHEX"),
            other => DxbcError::invalid_program(other.to_string()),
        })?;

        Ok(CompiledShader {
            input_signature,
            output_signature,
            program,
        })
    }
}
