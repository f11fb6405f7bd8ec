//! Stage-tagged intermediate representation of an SM4/SM5 program.
//!
//! The IR is built once by [`crate::build_ir`] and never mutated; metadata
//! binding produces a new value with [`ShaderIr::bindings`] filled in.

use shaderlab_dxbc::{ShaderModel, ShaderStage, SignatureEntry};

use crate::metadata::BindingMetadata;

/// The two stages the decompiler renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionStage {
    Vertex,
    Fragment,
}

impl FunctionStage {
    /// Maps a bytecode program type to a renderable stage.
    pub fn from_shader_stage(stage: ShaderStage) -> Option<Self> {
        match stage {
            ShaderStage::Vertex => Some(Self::Vertex),
            ShaderStage::Pixel => Some(Self::Fragment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderIr {
    pub stage: FunctionStage,
    pub model: ShaderModel,
    pub decls: Vec<Decl>,
    /// Executable instructions in program order.
    pub instructions: Vec<Instruction>,
    pub inputs: Vec<SignatureEntry>,
    pub outputs: Vec<SignatureEntry>,
    /// Named parameters for register operands; `None` until metadata is applied.
    pub bindings: Option<BindingMetadata>,
}

impl ShaderIr {
    /// Number of `r#` registers declared by `dcl_temps`.
    pub fn temp_count(&self) -> u32 {
        self.decls
            .iter()
            .find_map(|d| match d {
                Decl::Temps { count } => Some(*count),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn resource_dimension(&self, slot: u32) -> Option<ResourceDimension> {
        self.decls.iter().find_map(|d| match d {
            Decl::Resource { slot: s, dimension } if *s == slot => Some(*dimension),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDimension {
    Unknown,
    Buffer,
    Texture1D,
    Texture2D,
    Texture2DMs,
    Texture3D,
    TextureCube,
    Texture1DArray,
    Texture2DArray,
    Texture2DMsArray,
    TextureCubeArray,
}

impl ResourceDimension {
    pub fn from_token(value: u32) -> Self {
        match value {
            1 => Self::Buffer,
            2 => Self::Texture1D,
            3 => Self::Texture2D,
            4 => Self::Texture2DMs,
            5 => Self::Texture3D,
            6 => Self::TextureCube,
            7 => Self::Texture1DArray,
            8 => Self::Texture2DArray,
            9 => Self::Texture2DMsArray,
            10 => Self::TextureCubeArray,
            _ => Self::Unknown,
        }
    }

    /// Components of the sampling coordinate.
    pub fn coord_width(self) -> usize {
        match self {
            Self::Buffer | Self::Texture1D => 1,
            Self::Texture3D | Self::TextureCube | Self::Texture2DArray | Self::Texture2DMsArray => 3,
            Self::TextureCubeArray => 4,
            Self::Texture1DArray | Self::Texture2D | Self::Texture2DMs | Self::Unknown => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Temps { count: u32 },
    IndexableTemp { array: u32, len: u32, components: u32 },
    ConstantBuffer { slot: u32, registers: u32 },
    Resource { slot: u32, dimension: ResourceDimension },
    Sampler { slot: u32 },
    Input { register: u32, mask: u8 },
    Output { register: u32, mask: u8 },
    GlobalFlags(u32),
    CustomData { class: u32, len_dwords: u32 },
    Unknown { opcode: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Unary {
        op: UnaryOp,
        dst: DstOperand,
        src: SrcOperand,
    },
    Binary {
        op: BinaryOp,
        dst: DstOperand,
        a: SrcOperand,
        b: SrcOperand,
    },
    /// `mad`/`imad`: `a * b + c`.
    Mad {
        dst: DstOperand,
        a: SrcOperand,
        b: SrcOperand,
        c: SrcOperand,
    },
    Movc {
        dst: DstOperand,
        cond: SrcOperand,
        a: SrcOperand,
        b: SrcOperand,
    },
    /// `dp2`/`dp3`/`dp4`; `width` is the number of lanes summed.
    Dot {
        width: u8,
        dst: DstOperand,
        a: SrcOperand,
        b: SrcOperand,
    },
    SinCos {
        sin: Option<DstOperand>,
        cos: Option<DstOperand>,
        src: SrcOperand,
    },
    Sample {
        dst: DstOperand,
        coord: SrcOperand,
        texture: TextureRef,
        sampler: SamplerRef,
        level: SampleLevel,
    },
    /// `ld dest, coord, t#`
    Load {
        dst: DstOperand,
        coord: SrcOperand,
        texture: TextureRef,
    },
    Discard {
        cond: SrcOperand,
        nonzero: bool,
    },
    If {
        cond: SrcOperand,
        nonzero: bool,
    },
    Else,
    EndIf,
    Loop,
    EndLoop,
    Break,
    BreakC {
        cond: SrcOperand,
        nonzero: bool,
    },
    Continue,
    Ret,
    /// An opcode the IR does not model; rendered as a comment.
    Unknown {
        opcode: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Mov,
    Rcp,
    Rsq,
    Sqrt,
    Frc,
    Exp,
    Log,
    RoundNe,
    RoundNi,
    RoundPi,
    RoundZ,
    Ftoi,
    Ftou,
    Itof,
    Utof,
    Not,
    INeg,
    DerivRtx,
    DerivRty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Mul,
    Div,
    Min,
    Max,
    Lt,
    Ge,
    Eq,
    Ne,
    IAdd,
    IEq,
    INe,
    ILt,
    IGe,
    ULt,
    UGe,
    IMin,
    IMax,
    UMin,
    UMax,
    And,
    Or,
    Xor,
    IShl,
    IShr,
    UShr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleLevel {
    Implicit,
    Lod(SrcOperand),
    Bias(SrcOperand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegFile {
    Temp,
    Input,
    Output,
    OutputDepth,
    IndexableTemp { array: u32 },
    Null,
}

/// A register index, optionally offset by another register's component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperandIndex {
    pub imm: u32,
    pub relative: Option<RelativeIndex>,
}

impl OperandIndex {
    pub const fn imm(imm: u32) -> Self {
        Self {
            imm,
            relative: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativeIndex {
    pub file: RegFile,
    pub index: u32,
    pub component: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterRef {
    pub file: RegFile,
    pub index: OperandIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMask(pub u8);

impl WriteMask {
    pub const XYZW: Self = Self(0b1111);
    pub const X: Self = Self(0b0001);

    /// Written components in x, y, z, w order.
    pub fn components(self) -> Vec<u8> {
        (0..4u8).filter(|c| self.0 & (1 << c) != 0).collect()
    }
}

/// 4-component swizzle; each lane is 0..=3 for x/y/z/w.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub [u8; 4]);

impl Swizzle {
    pub const XYZW: Self = Self([0, 1, 2, 3]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandModifier {
    None,
    Neg,
    Abs,
    AbsNeg,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DstOperand {
    pub reg: RegisterRef,
    pub mask: WriteMask,
    pub saturate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SrcOperand {
    pub kind: SrcKind,
    pub swizzle: Swizzle,
    pub modifier: OperandModifier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SrcKind {
    Register(RegisterRef),
    ConstantBuffer { slot: u32, reg: OperandIndex },
    ImmediateConstantBuffer { reg: OperandIndex },
    /// Immediate 32-bit values (IEEE bits for floats).
    Immediate([u32; 4]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub slot: u32,
    /// Swizzle applied to the fetched texel.
    pub swizzle: Swizzle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerRef {
    pub slot: u32,
}
