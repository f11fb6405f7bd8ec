use shaderlab_dxbc::{BytecodeParser, CompiledShader, DxbcBytecodeParser, DxbcError, ShaderStage};
use thiserror::Error;

use crate::codegen::emit_hlsl_with_indent;
use crate::decode::{build_ir, Sm4DecodeError};
use crate::ir::ShaderIr;
use crate::metadata::{apply_metadata, BindingMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecompileError {
    #[error(transparent)]
    Dxbc(#[from] DxbcError),
    #[error(transparent)]
    Decode(#[from] Sm4DecodeError),
    #[error("only vertex and fragment programs can be decompiled, got {0:?}")]
    UnsupportedStage(ShaderStage),
    /// A pipeline step was invoked before the step it depends on.
    #[error("{0}")]
    Sequencing(&'static str),
}

/// Staged decompilation of one compiled program.
///
/// The steps must run in order: [`load`](Self::load), then
/// [`build_ir`](Self::build_ir), then optionally
/// [`apply_metadata`](Self::apply_metadata), then [`emit`](Self::emit).
/// Loading new bytes discards any IR built from the previous program.
#[derive(Debug, Default)]
pub struct Decompiler<P = DxbcBytecodeParser> {
    parser: P,
    shader: Option<CompiledShader>,
    ir: Option<ShaderIr>,
}

impl Decompiler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: BytecodeParser> Decompiler<P> {
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            shader: None,
            ir: None,
        }
    }

    pub fn load(&mut self, bytes: &[u8]) -> Result<(), DecompileError> {
        self.ir = None;
        self.shader = None;
        self.shader = Some(self.parser.parse(bytes)?);
        Ok(())
    }

    /// The parsed container, once [`load`](Self::load) succeeded.
    pub fn compiled(&self) -> Option<&CompiledShader> {
        self.shader.as_ref()
    }

    pub fn build_ir(&mut self, stage: ShaderStage) -> Result<(), DecompileError> {
        let shader = self.shader.as_ref().ok_or(DecompileError::Sequencing(
            "load must be called before build_ir",
        ))?;
        self.ir = Some(build_ir(shader, stage)?);
        Ok(())
    }

    pub fn apply_metadata(&mut self, meta: &BindingMetadata) -> Result<(), DecompileError> {
        let ir = self.ir.as_ref().ok_or(DecompileError::Sequencing(
            "build_ir must be called before apply_metadata",
        ))?;
        self.ir = Some(apply_metadata(ir, meta));
        Ok(())
    }

    pub fn ir(&self) -> Option<&ShaderIr> {
        self.ir.as_ref()
    }

    pub fn emit(&self, depth: usize) -> Result<String, DecompileError> {
        self.emit_with_indent(depth, crate::codegen::INDENT_WIDTH)
    }

    pub fn emit_with_indent(&self, depth: usize, indent_width: usize) -> Result<String, DecompileError> {
        let ir = self.ir.as_ref().ok_or(DecompileError::Sequencing(
            "build_ir must be called before emit",
        ))?;
        Ok(emit_hlsl_with_indent(ir, depth, indent_width))
    }
}
