//! SM4/SM5 bytecode to HLSL decompilation.
//!
//! The pipeline is a chain of pure steps over an immutable [`ShaderIr`]:
//! [`build_ir`] decodes the token program, [`apply_metadata`] attaches named
//! parameter bindings, and [`emit_hlsl`] renders the function body.
//! [`Decompiler`] wraps the same steps with ordering checks.

#![forbid(unsafe_code)]

mod codegen;
mod decode;
pub mod ir;
mod metadata;
pub mod naming;
pub mod opcode;
mod session;

pub use crate::codegen::{emit_hlsl, emit_hlsl_with_indent, HlslWriter, INDENT_WIDTH};
pub use crate::decode::{build_ir, Sm4DecodeError, Sm4DecodeErrorKind};
pub use crate::ir::{FunctionStage, ShaderIr};
pub use crate::metadata::{
    apply_metadata, BindingMetadata, CbufferLayout, CbufferMember, ConstantAccess, MemberKind,
    TextureBinding,
};
pub use crate::session::{DecompileError, Decompiler};
