use shaderlab_dxbc::{CompiledShader, ShaderStage};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ir::{
    BinaryOp, Decl, DstOperand, FunctionStage, Instruction, OperandIndex, OperandModifier,
    RegFile, RegisterRef, RelativeIndex, ResourceDimension, SampleLevel, SamplerRef, ShaderIr,
    SrcKind, SrcOperand, Swizzle, TextureRef, UnaryOp, WriteMask,
};
use crate::opcode::*;
use crate::DecompileError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SM4/5 decode error at dword {at_dword}: {kind}")]
pub struct Sm4DecodeError {
    pub at_dword: usize,
    pub kind: Sm4DecodeErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Sm4DecodeErrorKind {
    #[error("unexpected end of token stream (wanted {wanted} dwords, {remaining} remaining)")]
    UnexpectedEof { wanted: usize, remaining: usize },
    #[error("instruction length is zero")]
    InstructionLengthZero,
    #[error("instruction at {start} with length {len} overruns program (available {available})")]
    InstructionOutOfBounds {
        start: usize,
        len: usize,
        available: usize,
    },
    #[error("unsupported operand type {ty}")]
    UnsupportedOperandType { ty: u32 },
    #[error("unsupported operand index dimension {dim}")]
    UnsupportedIndexDimension { dim: u32 },
    #[error("unsupported operand index representation {rep}")]
    UnsupportedIndexRepresentation { rep: u32 },
    #[error("unsupported operand: {0}")]
    UnsupportedOperand(&'static str),
}

// Dword offset of the first body token within the program.
const BODY_START: usize = 2;

/// Builds the stage-tagged IR for a parsed shader.
///
/// Only vertex and pixel stages are accepted. Instructions whose operands
/// cannot be decoded are kept as [`Instruction::Unknown`] so that a single
/// exotic instruction does not lose the whole function.
pub fn build_ir(shader: &CompiledShader, stage: ShaderStage) -> Result<ShaderIr, DecompileError> {
    let stage =
        FunctionStage::from_shader_stage(stage).ok_or(DecompileError::UnsupportedStage(stage))?;

    let toks = shader.program.body();
    let mut decls = Vec::new();
    let mut instructions = Vec::new();

    let mut i = 0usize;
    while i < toks.len() {
        let at = BODY_START + i;
        let opcode_token = toks[i];
        let opcode = opcode_token & OPCODE_MASK;

        // `customdata` stores its full length in the following dword.
        let len = if opcode == OPCODE_CUSTOMDATA {
            let len = *toks.get(i + 1).ok_or(Sm4DecodeError {
                at_dword: at,
                kind: Sm4DecodeErrorKind::UnexpectedEof {
                    wanted: 1,
                    remaining: 0,
                },
            })? as usize;
            decls.push(Decl::CustomData {
                class: opcode_token >> 11,
                len_dwords: len as u32,
            });
            len
        } else {
            ((opcode_token >> OPCODE_LEN_SHIFT) & OPCODE_LEN_MASK) as usize
        };

        if len == 0 {
            return Err(Sm4DecodeError {
                at_dword: at,
                kind: Sm4DecodeErrorKind::InstructionLengthZero,
            }
            .into());
        }
        if i + len > toks.len() {
            return Err(Sm4DecodeError {
                at_dword: at,
                kind: Sm4DecodeErrorKind::InstructionOutOfBounds {
                    start: at,
                    len,
                    available: toks.len() + BODY_START,
                },
            }
            .into());
        }

        let inst_toks = &toks[i..i + len];
        if opcode == OPCODE_CUSTOMDATA || opcode == OPCODE_NOP {
            // Non-executable.
        } else if is_declaration(opcode) {
            let decl = decode_decl(opcode, inst_toks, at).unwrap_or(Decl::Unknown { opcode });
            decls.push(decl);
        } else {
            let inst = decode_instruction(opcode, inst_toks, at).unwrap_or_else(|err| {
                warn!(opcode, %err, "keeping undecodable instruction as unknown");
                Instruction::Unknown { opcode }
            });
            instructions.push(inst);
        }
        i += len;
    }

    debug!(
        ?stage,
        decls = decls.len(),
        instructions = instructions.len(),
        "built shader IR"
    );

    Ok(ShaderIr {
        stage,
        model: shader.program.model,
        decls,
        instructions,
        inputs: shader.input_signature.clone(),
        outputs: shader.output_signature.clone(),
        bindings: None,
    })
}

struct InstrReader<'a> {
    toks: &'a [u32],
    pos: usize,
    base_at: usize,
}

impl<'a> InstrReader<'a> {
    /// Positions the reader after the opcode token and any extended opcode tokens.
    fn new(toks: &'a [u32], base_at: usize) -> Self {
        let mut pos = 1;
        let mut extended = toks.first().is_some_and(|t| t & OPCODE_EXTENDED_BIT != 0);
        while extended && pos < toks.len() {
            extended = toks[pos] & OPCODE_EXTENDED_BIT != 0;
            pos += 1;
        }
        Self {
            toks,
            pos,
            base_at,
        }
    }

    fn read_u32(&mut self) -> Result<u32, Sm4DecodeError> {
        let v = self.toks.get(self.pos).copied().ok_or(Sm4DecodeError {
            at_dword: self.base_at + self.pos,
            kind: Sm4DecodeErrorKind::UnexpectedEof {
                wanted: 1,
                remaining: 0,
            },
        })?;
        self.pos += 1;
        Ok(v)
    }

    fn err(&self, kind: Sm4DecodeErrorKind) -> Sm4DecodeError {
        Sm4DecodeError {
            at_dword: self.base_at + self.pos.saturating_sub(1),
            kind,
        }
    }
}

struct RawOperand {
    ty: u32,
    num_components: u32,
    selection_mode: u32,
    component_sel: u32,
    indices: Vec<OperandIndex>,
    modifier: OperandModifier,
    imm: Option<[u32; 4]>,
}

impl RawOperand {
    fn swizzle(&self) -> Swizzle {
        match (self.num_components, self.selection_mode) {
            (2, OPERAND_SEL_SWIZZLE) => {
                let s = self.component_sel;
                Swizzle([
                    (s & 3) as u8,
                    ((s >> 2) & 3) as u8,
                    ((s >> 4) & 3) as u8,
                    ((s >> 6) & 3) as u8,
                ])
            }
            (2, OPERAND_SEL_SELECT1) => Swizzle([(self.component_sel & 3) as u8; 4]),
            (1, _) => Swizzle([0; 4]),
            _ => Swizzle::XYZW,
        }
    }

    fn mask(&self) -> WriteMask {
        match (self.num_components, self.selection_mode) {
            (2, OPERAND_SEL_MASK) => WriteMask((self.component_sel & 0xF) as u8),
            (1, _) => WriteMask::X,
            (0, _) => WriteMask(0),
            _ => WriteMask::XYZW,
        }
    }

    fn index(&self, n: usize) -> OperandIndex {
        self.indices.get(n).copied().unwrap_or(OperandIndex::imm(0))
    }
}

fn decode_raw_operand(r: &mut InstrReader<'_>) -> Result<RawOperand, Sm4DecodeError> {
    let token = r.read_u32()?;

    let num_components = token & OPERAND_NUM_COMPONENTS_MASK;
    let selection_mode = (token >> OPERAND_SELECTION_MODE_SHIFT) & OPERAND_SELECTION_MODE_MASK;
    let component_sel =
        (token >> OPERAND_COMPONENT_SELECTION_SHIFT) & OPERAND_COMPONENT_SELECTION_MASK;
    let ty = (token >> OPERAND_TYPE_SHIFT) & OPERAND_TYPE_MASK;
    let index_dim = (token >> OPERAND_INDEX_DIMENSION_SHIFT) & OPERAND_INDEX_DIMENSION_MASK;

    let mut modifier = OperandModifier::None;
    let mut extended = token & OPERAND_EXTENDED_BIT != 0;
    while extended {
        let ext = r.read_u32()?;
        extended = ext & OPERAND_EXTENDED_BIT != 0;
        // Other extended types (min precision, non-uniform) carry no modifier.
        if ext & 0x3f == EXTENDED_OPERAND_MODIFIER {
            modifier = match (ext >> 6) & 0xff {
                1 => OperandModifier::Neg,
                2 => OperandModifier::Abs,
                3 => OperandModifier::AbsNeg,
                _ => OperandModifier::None,
            };
        }
    }

    if index_dim == 3 {
        return Err(r.err(Sm4DecodeErrorKind::UnsupportedIndexDimension { dim: index_dim }));
    }

    let mut indices = Vec::with_capacity(index_dim as usize);
    for n in 0..index_dim {
        let rep = (token >> (OPERAND_INDEX0_REP_SHIFT + n * OPERAND_INDEX_REP_BITS))
            & OPERAND_INDEX_REP_MASK;
        let index = match rep {
            OPERAND_INDEX_REP_IMMEDIATE32 => OperandIndex::imm(r.read_u32()?),
            OPERAND_INDEX_REP_RELATIVE => OperandIndex {
                imm: 0,
                relative: Some(decode_relative(r)?),
            },
            OPERAND_INDEX_REP_IMMEDIATE32_PLUS_RELATIVE => {
                let imm = r.read_u32()?;
                OperandIndex {
                    imm,
                    relative: Some(decode_relative(r)?),
                }
            }
            other => {
                return Err(r.err(Sm4DecodeErrorKind::UnsupportedIndexRepresentation { rep: other }))
            }
        };
        indices.push(index);
    }

    let imm = if ty == OPERAND_TYPE_IMMEDIATE32 {
        match num_components {
            1 => {
                let v = r.read_u32()?;
                Some([v; 4])
            }
            2 => Some([r.read_u32()?, r.read_u32()?, r.read_u32()?, r.read_u32()?]),
            _ => {
                return Err(r.err(Sm4DecodeErrorKind::UnsupportedOperand(
                    "immediate32 with unsupported component count",
                )))
            }
        }
    } else {
        None
    };

    Ok(RawOperand {
        ty,
        num_components,
        selection_mode,
        component_sel,
        indices,
        modifier,
        imm,
    })
}

fn decode_relative(r: &mut InstrReader<'_>) -> Result<RelativeIndex, Sm4DecodeError> {
    let raw = decode_raw_operand(r)?;
    let file = register_file(&raw)
        .ok_or_else(|| r.err(Sm4DecodeErrorKind::UnsupportedOperand("relative index source")))?;
    let index = match file {
        RegFile::IndexableTemp { .. } => raw.index(1).imm,
        _ => raw.index(0).imm,
    };
    let component = match raw.selection_mode {
        OPERAND_SEL_MASK => (raw.component_sel & 0xF).trailing_zeros().min(3) as u8,
        _ => (raw.component_sel & 3) as u8,
    };
    Ok(RelativeIndex {
        file,
        index,
        component,
    })
}

fn register_file(raw: &RawOperand) -> Option<RegFile> {
    Some(match raw.ty {
        OPERAND_TYPE_TEMP => RegFile::Temp,
        OPERAND_TYPE_INPUT => RegFile::Input,
        OPERAND_TYPE_OUTPUT => RegFile::Output,
        OPERAND_TYPE_OUTPUT_DEPTH => RegFile::OutputDepth,
        OPERAND_TYPE_NULL => RegFile::Null,
        OPERAND_TYPE_INDEXABLE_TEMP => RegFile::IndexableTemp {
            array: raw.index(0).imm,
        },
        _ => return None,
    })
}

fn register_ref(raw: &RawOperand, file: RegFile) -> RegisterRef {
    let index = match file {
        RegFile::IndexableTemp { .. } => raw.index(1),
        RegFile::OutputDepth | RegFile::Null => OperandIndex::imm(0),
        _ => raw.index(0),
    };
    RegisterRef { file, index }
}

fn decode_dst(r: &mut InstrReader<'_>, saturate: bool) -> Result<DstOperand, Sm4DecodeError> {
    let raw = decode_raw_operand(r)?;
    let file = register_file(&raw)
        .ok_or_else(|| r.err(Sm4DecodeErrorKind::UnsupportedOperandType { ty: raw.ty }))?;
    Ok(DstOperand {
        reg: register_ref(&raw, file),
        mask: raw.mask(),
        saturate,
    })
}

fn decode_optional_dst(r: &mut InstrReader<'_>) -> Result<Option<DstOperand>, Sm4DecodeError> {
    let dst = decode_dst(r, false)?;
    Ok((dst.reg.file != RegFile::Null).then_some(dst))
}

fn decode_src(r: &mut InstrReader<'_>) -> Result<SrcOperand, Sm4DecodeError> {
    let raw = decode_raw_operand(r)?;
    let kind = match raw.ty {
        OPERAND_TYPE_IMMEDIATE32 => SrcKind::Immediate(raw.imm.unwrap_or([0; 4])),
        OPERAND_TYPE_CONSTANT_BUFFER => SrcKind::ConstantBuffer {
            slot: raw.index(0).imm,
            reg: raw.index(1),
        },
        OPERAND_TYPE_IMMEDIATE_CONSTANT_BUFFER => {
            SrcKind::ImmediateConstantBuffer { reg: raw.index(0) }
        }
        _ => {
            let file = register_file(&raw)
                .ok_or_else(|| r.err(Sm4DecodeErrorKind::UnsupportedOperandType { ty: raw.ty }))?;
            SrcKind::Register(register_ref(&raw, file))
        }
    };
    Ok(SrcOperand {
        kind,
        swizzle: raw.swizzle(),
        modifier: raw.modifier,
    })
}

fn decode_texture(r: &mut InstrReader<'_>) -> Result<TextureRef, Sm4DecodeError> {
    let raw = decode_raw_operand(r)?;
    if raw.ty != OPERAND_TYPE_RESOURCE {
        return Err(r.err(Sm4DecodeErrorKind::UnsupportedOperandType { ty: raw.ty }));
    }
    Ok(TextureRef {
        slot: raw.index(0).imm,
        swizzle: raw.swizzle(),
    })
}

fn decode_sampler(r: &mut InstrReader<'_>) -> Result<SamplerRef, Sm4DecodeError> {
    let raw = decode_raw_operand(r)?;
    if raw.ty != OPERAND_TYPE_SAMPLER {
        return Err(r.err(Sm4DecodeErrorKind::UnsupportedOperandType { ty: raw.ty }));
    }
    Ok(SamplerRef {
        slot: raw.index(0).imm,
    })
}

fn unary_op(opcode: u32) -> Option<UnaryOp> {
    Some(match opcode {
        OPCODE_MOV => UnaryOp::Mov,
        OPCODE_RCP => UnaryOp::Rcp,
        OPCODE_RSQ => UnaryOp::Rsq,
        OPCODE_SQRT => UnaryOp::Sqrt,
        OPCODE_FRC => UnaryOp::Frc,
        OPCODE_EXP => UnaryOp::Exp,
        OPCODE_LOG => UnaryOp::Log,
        OPCODE_ROUND_NE => UnaryOp::RoundNe,
        OPCODE_ROUND_NI => UnaryOp::RoundNi,
        OPCODE_ROUND_PI => UnaryOp::RoundPi,
        OPCODE_ROUND_Z => UnaryOp::RoundZ,
        OPCODE_FTOI => UnaryOp::Ftoi,
        OPCODE_FTOU => UnaryOp::Ftou,
        OPCODE_ITOF => UnaryOp::Itof,
        OPCODE_UTOF => UnaryOp::Utof,
        OPCODE_NOT => UnaryOp::Not,
        OPCODE_INEG => UnaryOp::INeg,
        OPCODE_DERIV_RTX => UnaryOp::DerivRtx,
        OPCODE_DERIV_RTY => UnaryOp::DerivRty,
        _ => return None,
    })
}

fn binary_op(opcode: u32) -> Option<BinaryOp> {
    Some(match opcode {
        OPCODE_ADD => BinaryOp::Add,
        OPCODE_MUL => BinaryOp::Mul,
        OPCODE_DIV => BinaryOp::Div,
        OPCODE_MIN => BinaryOp::Min,
        OPCODE_MAX => BinaryOp::Max,
        OPCODE_LT => BinaryOp::Lt,
        OPCODE_GE => BinaryOp::Ge,
        OPCODE_EQ => BinaryOp::Eq,
        OPCODE_NE => BinaryOp::Ne,
        OPCODE_IADD => BinaryOp::IAdd,
        OPCODE_IEQ => BinaryOp::IEq,
        OPCODE_INE => BinaryOp::INe,
        OPCODE_ILT => BinaryOp::ILt,
        OPCODE_IGE => BinaryOp::IGe,
        OPCODE_ULT => BinaryOp::ULt,
        OPCODE_UGE => BinaryOp::UGe,
        OPCODE_IMIN => BinaryOp::IMin,
        OPCODE_IMAX => BinaryOp::IMax,
        OPCODE_UMIN => BinaryOp::UMin,
        OPCODE_UMAX => BinaryOp::UMax,
        OPCODE_AND => BinaryOp::And,
        OPCODE_OR => BinaryOp::Or,
        OPCODE_XOR => BinaryOp::Xor,
        OPCODE_ISHL => BinaryOp::IShl,
        OPCODE_ISHR => BinaryOp::IShr,
        OPCODE_USHR => BinaryOp::UShr,
        _ => return None,
    })
}

fn decode_instruction(
    opcode: u32,
    inst_toks: &[u32],
    at: usize,
) -> Result<Instruction, Sm4DecodeError> {
    let opcode_token = inst_toks[0];
    let saturate = opcode_token & OPCODE_SATURATE_BIT != 0;
    let nonzero = opcode_token & OPCODE_TEST_NONZERO_BIT != 0;
    let mut r = InstrReader::new(inst_toks, at);

    if let Some(op) = unary_op(opcode) {
        let dst = decode_dst(&mut r, saturate)?;
        let src = decode_src(&mut r)?;
        return Ok(Instruction::Unary { op, dst, src });
    }
    if let Some(op) = binary_op(opcode) {
        let dst = decode_dst(&mut r, saturate)?;
        let a = decode_src(&mut r)?;
        let b = decode_src(&mut r)?;
        return Ok(Instruction::Binary { op, dst, a, b });
    }

    Ok(match opcode {
        OPCODE_MAD | OPCODE_IMAD => Instruction::Mad {
            dst: decode_dst(&mut r, saturate)?,
            a: decode_src(&mut r)?,
            b: decode_src(&mut r)?,
            c: decode_src(&mut r)?,
        },
        OPCODE_MOVC => Instruction::Movc {
            dst: decode_dst(&mut r, saturate)?,
            cond: decode_src(&mut r)?,
            a: decode_src(&mut r)?,
            b: decode_src(&mut r)?,
        },
        OPCODE_DP2 | OPCODE_DP3 | OPCODE_DP4 => Instruction::Dot {
            width: (opcode - OPCODE_DP2 + 2) as u8,
            dst: decode_dst(&mut r, saturate)?,
            a: decode_src(&mut r)?,
            b: decode_src(&mut r)?,
        },
        OPCODE_SINCOS => Instruction::SinCos {
            sin: decode_optional_dst(&mut r)?,
            cos: decode_optional_dst(&mut r)?,
            src: decode_src(&mut r)?,
        },
        OPCODE_SAMPLE | OPCODE_SAMPLE_L | OPCODE_SAMPLE_B => {
            let dst = decode_dst(&mut r, saturate)?;
            let coord = decode_src(&mut r)?;
            let texture = decode_texture(&mut r)?;
            let sampler = decode_sampler(&mut r)?;
            let level = match opcode {
                OPCODE_SAMPLE_L => SampleLevel::Lod(decode_src(&mut r)?),
                OPCODE_SAMPLE_B => SampleLevel::Bias(decode_src(&mut r)?),
                _ => SampleLevel::Implicit,
            };
            Instruction::Sample {
                dst,
                coord,
                texture,
                sampler,
                level,
            }
        }
        OPCODE_LD => Instruction::Load {
            dst: decode_dst(&mut r, saturate)?,
            coord: decode_src(&mut r)?,
            texture: decode_texture(&mut r)?,
        },
        OPCODE_DISCARD => Instruction::Discard {
            cond: decode_src(&mut r)?,
            nonzero,
        },
        OPCODE_IF => Instruction::If {
            cond: decode_src(&mut r)?,
            nonzero,
        },
        OPCODE_BREAKC => Instruction::BreakC {
            cond: decode_src(&mut r)?,
            nonzero,
        },
        OPCODE_ELSE => Instruction::Else,
        OPCODE_ENDIF => Instruction::EndIf,
        OPCODE_LOOP => Instruction::Loop,
        OPCODE_ENDLOOP => Instruction::EndLoop,
        OPCODE_BREAK => Instruction::Break,
        OPCODE_CONTINUE => Instruction::Continue,
        OPCODE_RET => Instruction::Ret,
        _ => {
            debug!(opcode, at, "unmodelled opcode");
            Instruction::Unknown { opcode }
        }
    })
}

fn decode_decl(opcode: u32, inst_toks: &[u32], at: usize) -> Option<Decl> {
    let opcode_token = inst_toks[0];
    let mut r = InstrReader::new(inst_toks, at);
    Some(match opcode {
        OPCODE_DCL_TEMPS => Decl::Temps {
            count: r.read_u32().ok()?,
        },
        OPCODE_DCL_INDEXABLE_TEMP => Decl::IndexableTemp {
            array: r.read_u32().ok()?,
            len: r.read_u32().ok()?,
            components: r.read_u32().ok()?,
        },
        OPCODE_DCL_CONSTANT_BUFFER => {
            let raw = decode_raw_operand(&mut r).ok()?;
            Decl::ConstantBuffer {
                slot: raw.index(0).imm,
                registers: raw.index(1).imm,
            }
        }
        OPCODE_DCL_RESOURCE => {
            let raw = decode_raw_operand(&mut r).ok()?;
            Decl::Resource {
                slot: raw.index(0).imm,
                dimension: ResourceDimension::from_token(
                    (opcode_token >> RESOURCE_DIMENSION_SHIFT) & RESOURCE_DIMENSION_MASK,
                ),
            }
        }
        OPCODE_DCL_SAMPLER => Decl::Sampler {
            slot: decode_raw_operand(&mut r).ok()?.index(0).imm,
        },
        OPCODE_DCL_INPUT..=OPCODE_DCL_INPUT_PS_SIV => {
            let raw = decode_raw_operand(&mut r).ok()?;
            Decl::Input {
                register: raw.index(0).imm,
                mask: raw.mask().0,
            }
        }
        0x65..=OPCODE_DCL_OUTPUT_SIV => {
            let raw = decode_raw_operand(&mut r).ok()?;
            Decl::Output {
                register: raw.index(0).imm,
                mask: raw.mask().0,
            }
        }
        OPCODE_DCL_GLOBAL_FLAGS => Decl::GlobalFlags((opcode_token >> 11) & 0x1fff),
        _ => return None,
    })
}
