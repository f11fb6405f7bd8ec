//! Parameter tables recovered from a compiled sub-program: constant buffer
//! layouts, textures, buffers, UAVs, samplers and vertex bind channels.

use shaderlab_hlsl::{BindingMetadata, CbufferLayout, CbufferMember, MemberKind, TextureBinding};
use tracing::warn;

use crate::error::{Result, ShaderError};
use crate::reader::ByteSource;

/// Name of the bind point that hosts the unnamed globals set.
pub const GLOBALS_CBUFFER_NAME: &str = "$Globals";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderParamType {
    Float,
    Int,
    Bool,
    Half,
    Short,
    UInt,
    Unknown(i32),
}

impl ShaderParamType {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Float,
            1 => Self::Int,
            2 => Self::Bool,
            3 => Self::Half,
            4 => Self::Short,
            5 => Self::UInt,
            other => Self::Unknown(other),
        }
    }

    /// HLSL scalar type name.
    pub fn hlsl_name(self) -> &'static str {
        match self {
            Self::Float | Self::Unknown(_) => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Half => "half",
            Self::Short => "min16int",
            Self::UInt => "uint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Vector,
    Matrix,
}

/// A vector or matrix parameter.
///
/// Vectors keep their dimension in `row_count` with `column_count == 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericParameter {
    pub name: String,
    pub kind: NumericKind,
    pub param_type: ShaderParamType,
    /// Byte offset inside the owning buffer.
    pub index: i32,
    /// 0 for non-array parameters.
    pub array_size: i32,
    pub row_count: u8,
    pub column_count: u8,
}

impl NumericParameter {
    pub fn vector(name: String, param_type: ShaderParamType, index: i32, array_size: i32, dim: i32) -> Self {
        Self {
            name,
            kind: NumericKind::Vector,
            param_type,
            index,
            array_size,
            row_count: dim as u8,
            column_count: 1,
        }
    }

    pub fn matrix(
        name: String,
        param_type: ShaderParamType,
        index: i32,
        array_size: i32,
        rows: i32,
        columns: i32,
    ) -> Self {
        Self {
            name,
            kind: NumericKind::Matrix,
            param_type,
            index,
            array_size,
            row_count: rows as u8,
            column_count: columns as u8,
        }
    }

    pub fn is_matrix(&self) -> bool {
        self.kind == NumericKind::Matrix
    }

    /// HLSL type, e.g. `float4`, `half` or `float4x4`.
    pub fn type_name(&self) -> String {
        let scalar = self.param_type.hlsl_name();
        match self.kind {
            NumericKind::Matrix => format!("{scalar}{}x{}", self.row_count, self.column_count),
            NumericKind::Vector if self.row_count > 1 => format!("{scalar}{}", self.row_count),
            NumericKind::Vector => scalar.to_owned(),
        }
    }

    /// HLSL member declaration, e.g. `float4 _Color;` or `float4 _Lights[8];`.
    pub fn declaration(&self) -> String {
        if self.array_size > 0 {
            format!("{} {}[{}];", self.type_name(), self.name, self.array_size)
        } else {
            format!("{} {};", self.type_name(), self.name)
        }
    }

    fn member_kind(&self) -> MemberKind {
        match self.kind {
            NumericKind::Vector => MemberKind::Vector {
                components: u32::from(self.row_count),
            },
            NumericKind::Matrix => MemberKind::Matrix {
                rows: u32::from(self.row_count),
                columns: u32::from(self.column_count),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructParameter {
    pub name: String,
    pub index: i32,
    pub array_size: i32,
    pub struct_size: i32,
    pub vector_members: Vec<NumericParameter>,
    pub matrix_members: Vec<NumericParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBuffer {
    pub name: String,
    pub size: i32,
    pub matrix_params: Vec<NumericParameter>,
    pub vector_params: Vec<NumericParameter>,
    pub struct_params: Vec<StructParameter>,
    /// Never set by the decoder; the stream has no field for it.
    pub is_partial: bool,
}

impl ConstantBuffer {
    /// Matrices followed by vectors.
    pub fn all_numeric_params(&self) -> impl Iterator<Item = &NumericParameter> {
        self.matrix_params.iter().chain(&self.vector_params)
    }

    /// Buffers whose name contains `Global` are declared without a
    /// `CBUFFER_START`/`CBUFFER_END` wrapper.
    pub fn is_global(&self) -> bool {
        self.name.contains("Global")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureParameter {
    pub name: String,
    pub index: i32,
    pub dim: u8,
    /// -1 when no sampler is bound.
    pub sampler_index: i32,
    pub multisampled: bool,
}

impl TextureParameter {
    /// Declaration matching the texture's dimension.
    pub fn declaration(&self) -> String {
        let name = &self.name;
        match self.dim {
            2 => format!("sampler2D {name};"),
            3 => format!("sampler3D {name};"),
            4 => format!("samplerCUBE {name};"),
            5 => format!("UNITY_DECLARE_TEX2DARRAY({name});"),
            6 => format!("UNITY_DECLARE_TEXCUBEARRAY({name});"),
            other => format!("sampler2D {name}; // Unsure of real type ({other})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBinding {
    pub name: String,
    pub index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UavParameter {
    pub name: String,
    pub index: i32,
    pub original_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerParameter {
    pub sampler: u32,
    pub bind_point: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindChannel {
    pub source: u32,
    /// Raw vertex component the source feeds.
    pub target: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindChannels {
    pub channels: Vec<BindChannel>,
    /// Seed value OR-ed with `1 << source` for every channel.
    pub source_map: i32,
}

impl BindChannels {
    pub fn read(r: &mut impl ByteSource) -> Result<Self> {
        let mut source_map = r.read_i32_le()?;
        let count = r.read_len()?;
        let mut channels = Vec::with_capacity(count.min(r.remaining() / 8));
        for _ in 0..count {
            let source = r.read_u32_le()?;
            let target = r.read_u32_le()?;
            source_map |= 1i32.wrapping_shl(source);
            channels.push(BindChannel { source, target });
        }
        Ok(Self { channels, source_map })
    }
}

/// Every parameter record of one sub-program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTable {
    /// Globals set (group 0).
    pub vector_params: Vec<NumericParameter>,
    pub matrix_params: Vec<NumericParameter>,
    pub struct_params: Vec<StructParameter>,
    /// Groups 1..G.
    pub constant_buffers: Vec<ConstantBuffer>,
    pub textures: Vec<TextureParameter>,
    pub constant_buffer_bindings: Vec<BufferBinding>,
    pub buffers: Vec<BufferBinding>,
    pub uavs: Vec<UavParameter>,
    pub samplers: Vec<SamplerParameter>,
}

struct ParamGroup {
    name: String,
    used_size: i32,
    vectors: Vec<NumericParameter>,
    matrices: Vec<NumericParameter>,
    structs: Vec<StructParameter>,
}

fn read_numeric(r: &mut impl ByteSource, prefix: Option<&str>) -> Result<NumericParameter> {
    let name = r.read_aligned_string()?;
    let name = match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name,
    };
    let param_type = ShaderParamType::from_raw(r.read_i32_le()?);
    let rows = r.read_i32_le()?;
    let columns = r.read_i32_le()?;
    let is_matrix = r.read_i32_le()? > 0;
    let array_size = r.read_i32_le()?;
    let index = r.read_i32_le()?;
    Ok(if is_matrix {
        NumericParameter::matrix(name, param_type, index, array_size, rows, columns)
    } else {
        NumericParameter::vector(name, param_type, index, array_size, columns)
    })
}

fn split_numeric(params: Vec<NumericParameter>) -> (Vec<NumericParameter>, Vec<NumericParameter>) {
    params.into_iter().partition(|p| !p.is_matrix())
}

fn read_struct(r: &mut impl ByteSource) -> Result<StructParameter> {
    let name = r.read_aligned_string()?;
    let index = r.read_i32_le()?;
    let array_size = r.read_i32_le()?;
    let struct_size = r.read_i32_le()?;
    let count = r.read_len()?;
    let mut members = Vec::new();
    for _ in 0..count {
        members.push(read_numeric(r, Some(&name))?);
    }
    let (vector_members, matrix_members) = split_numeric(members);
    Ok(StructParameter {
        name,
        index,
        array_size,
        struct_size,
        vector_members,
        matrix_members,
    })
}

fn read_group(r: &mut impl ByteSource) -> Result<ParamGroup> {
    let name = r.read_aligned_string()?;
    let used_size = r.read_i32_le()?;
    let count = r.read_len()?;
    let mut params = Vec::new();
    for _ in 0..count {
        params.push(read_numeric(r, None)?);
    }
    let (vectors, matrices) = split_numeric(params);

    let struct_count = r.read_len()?;
    let mut structs = Vec::new();
    for _ in 0..struct_count {
        structs.push(read_struct(r)?);
    }
    Ok(ParamGroup {
        name,
        used_size,
        vectors,
        matrices,
        structs,
    })
}

/// Normalizes the packed sampler bits of a texture record.
fn texture_sampler_index(extra: i32) -> i32 {
    match extra >> 8 {
        0xFF_FFFF => -1,
        index => index,
    }
}

impl ParameterTable {
    /// Reads the numeric groups followed by the resource bindings.
    pub fn read(r: &mut impl ByteSource) -> Result<Self> {
        let mut table = Self::default();

        let group_count = r.read_len()?;
        for i in 0..group_count {
            let group = read_group(r)?;
            if i == 0 {
                table.vector_params = group.vectors;
                table.matrix_params = group.matrices;
                table.struct_params = group.structs;
            } else {
                table.constant_buffers.push(ConstantBuffer {
                    name: group.name,
                    size: group.used_size,
                    matrix_params: group.matrices,
                    vector_params: group.vectors,
                    struct_params: group.structs,
                    is_partial: false,
                });
            }
        }

        let binding_count = r.read_len()?;
        for _ in 0..binding_count {
            let name = r.read_aligned_string()?;
            let ty = r.read_i32_le()?;
            let index = r.read_i32_le()?;
            let extra = r.read_i32_le()?;
            match ty {
                0 => {
                    let multisampled = r.read_u32_le()? == 1;
                    table.textures.push(TextureParameter {
                        name,
                        index,
                        dim: extra as u8,
                        sampler_index: texture_sampler_index(extra),
                        multisampled,
                    });
                }
                1 => table.constant_buffer_bindings.push(BufferBinding { name, index }),
                2 => table.buffers.push(BufferBinding { name, index }),
                3 => table.uavs.push(UavParameter {
                    name,
                    index,
                    original_index: extra,
                }),
                4 => table.samplers.push(SamplerParameter {
                    sampler: extra as u32,
                    bind_point: index,
                }),
                other => return Err(ShaderError::UnsupportedParameterType(other)),
            }
        }

        Ok(table)
    }

    /// Globals set members, matrices followed by vectors.
    pub fn global_params(&self) -> impl Iterator<Item = &NumericParameter> {
        self.matrix_params.iter().chain(&self.vector_params)
    }

    /// First named buffer whose name contains `Global`.
    pub fn global_buffer(&self) -> Option<&ConstantBuffer> {
        self.constant_buffers.iter().find(|cb| cb.is_global())
    }

    fn bind_point(&self, name: &str) -> Option<u32> {
        self.constant_buffer_bindings
            .iter()
            .find(|b| b.name == name)
            .and_then(|b| u32::try_from(b.index).ok())
    }

    /// Register bindings for the decompiler. Buffers are matched to bind
    /// points by name; struct members are not bound.
    pub fn binding_metadata(&self) -> BindingMetadata {
        let mut meta = BindingMetadata::default();

        let globals_named = self
            .constant_buffers
            .iter()
            .any(|cb| cb.name == GLOBALS_CBUFFER_NAME);
        if !globals_named {
            if let Some(slot) = self.bind_point(GLOBALS_CBUFFER_NAME) {
                meta.constant_buffers.push(CbufferLayout {
                    name: GLOBALS_CBUFFER_NAME.to_owned(),
                    slot,
                    members: layout_members(self.global_params()),
                });
            }
        }

        for cb in &self.constant_buffers {
            match self.bind_point(&cb.name) {
                Some(slot) => meta.constant_buffers.push(CbufferLayout {
                    name: cb.name.clone(),
                    slot,
                    members: layout_members(cb.all_numeric_params()),
                }),
                None => warn!(name = %cb.name, "constant buffer has no bind point"),
            }
        }

        meta.textures = self
            .textures
            .iter()
            .filter_map(|t| {
                Some(TextureBinding {
                    name: t.name.clone(),
                    slot: u32::try_from(t.index).ok()?,
                    sampler_slot: t.sampler_index,
                    dimension: i32::from(t.dim),
                })
            })
            .collect();

        meta
    }
}

fn layout_members<'a>(params: impl Iterator<Item = &'a NumericParameter>) -> Vec<CbufferMember> {
    params
        .filter_map(|p| {
            Some(CbufferMember {
                name: p.name.clone(),
                offset: u32::try_from(p.index).ok()?,
                kind: p.member_kind(),
                array_size: u32::try_from(p.array_size).unwrap_or(0),
            })
        })
        .collect()
}
